//! Flat-file persistence for vehicles, customers, rental records and vehicle subtypes.

/// Line encoding per entity type.
pub mod codec;
/// File access: tolerant loading and append-only writes.
pub mod file;

pub use codec::{CustomerKey, LineRecord, StoredKind, StoredRecord, DATE_FORMAT};
pub use file::{FlatFileStore, CUSTOMERS_FILE, KINDS_FILE, RECORDS_FILE, VEHICLES_FILE};
