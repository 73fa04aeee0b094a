//! The rental registry and its thread-safe handle.

mod rental;
mod shared;

pub use rental::{HistoryEntry, Registry, TransactionOutcome};
pub use shared::SharedRegistry;
