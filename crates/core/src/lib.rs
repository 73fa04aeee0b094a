#![warn(clippy::all, missing_docs)]

//! Core domain logic for the vehicle rental desk.
//!
//! This crate hosts the entity model, the flat-file persistence adapter,
//! the in-memory registry with its rent/return transactions, and the
//! configuration used by the terminal shell.

pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod store;

pub use self::config::AppConfig;
pub use error::{RentalError, Result};
pub use models::{
    Customer, Plate, RecordKind, RentalRecord, Vehicle, VehicleKind, VehicleStatus,
};
pub use registry::{HistoryEntry, Registry, SharedRegistry, TransactionOutcome};
pub use store::FlatFileStore;
