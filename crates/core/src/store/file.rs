use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use super::codec::{LineRecord, StoredKind, StoredRecord};
use crate::{
    config::AppConfig,
    error::{RentalError, Result},
    models::{Customer, RentalRecord, Vehicle},
};

/// Default file name for the vehicle fleet.
pub const VEHICLES_FILE: &str = "vehicles.txt";
/// Default file name for the customer roster.
pub const CUSTOMERS_FILE: &str = "customers.txt";
/// Default file name for the transaction log.
pub const RECORDS_FILE: &str = "rental_records.txt";
/// Default file name for vehicle subtype attributes.
pub const KINDS_FILE: &str = "vehicle_kinds.txt";

/// Append-only flat files backing the registry.
#[derive(Debug, Clone)]
pub struct FlatFileStore {
    vehicles: PathBuf,
    customers: PathBuf,
    records: PathBuf,
    kinds: PathBuf,
}

impl FlatFileStore {
    /// Store using the default file names inside `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            vehicles: root.join(VEHICLES_FILE),
            customers: root.join(CUSTOMERS_FILE),
            records: root.join(RECORDS_FILE),
            kinds: root.join(KINDS_FILE),
        }
    }

    /// Store using the paths resolved from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vehicles: config.vehicles_path(),
            customers: config.customers_path(),
            records: config.records_path(),
            kinds: config.kinds_path(),
        }
    }

    /// Path of `vehicles.txt`.
    pub fn vehicles_path(&self) -> &Path {
        &self.vehicles
    }

    /// Path of `customers.txt`.
    pub fn customers_path(&self) -> &Path {
        &self.customers
    }

    /// Path of `rental_records.txt`.
    pub fn records_path(&self) -> &Path {
        &self.records
    }

    /// Path of `vehicle_kinds.txt`.
    pub fn kinds_path(&self) -> &Path {
        &self.kinds
    }

    /// Every decodable vehicle line, in file order.
    pub fn load_vehicles(&self) -> Result<Vec<Vehicle>> {
        load_lines(&self.vehicles)
    }

    /// Every decodable customer line, in file order.
    pub fn load_customers(&self) -> Result<Vec<Customer>> {
        load_lines(&self.customers)
    }

    /// Every decodable subtype line, in file order.
    pub fn load_kinds(&self) -> Result<Vec<StoredKind>> {
        load_lines(&self.kinds)
    }

    /// Every decodable record line, in file order and not yet linked.
    pub fn load_records(&self) -> Result<Vec<StoredRecord>> {
        load_lines(&self.records)
    }

    /// Append the full current state of a vehicle.
    pub fn append_vehicle(&self, vehicle: &Vehicle) -> Result<()> {
        append_line(&self.vehicles, vehicle)
    }

    /// Append the subtype attributes of a newly registered vehicle.
    pub fn append_kind(&self, vehicle: &Vehicle) -> Result<()> {
        append_line(&self.kinds, &StoredKind::from(vehicle))
    }

    /// Append a newly registered customer.
    pub fn append_customer(&self, customer: &Customer) -> Result<()> {
        append_line(&self.customers, customer)
    }

    /// Append a transaction.
    pub fn append_record(&self, record: &RentalRecord) -> Result<()> {
        append_line(&self.records, &StoredRecord::from(record))
    }
}

/// Decode `path` line by line. A missing file yields an empty list; lines
/// that fail to decode are logged and skipped.
fn load_lines<T: LineRecord>(path: &Path) -> Result<Vec<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No data file yet");
            return Ok(Vec::new());
        }
        Err(err) => return Err(RentalError::persistence(path, err)),
    };

    let mut items = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match T::decode(line) {
            Ok(item) => items.push(item),
            Err(reason) => {
                warn!(path = %path.display(), line = index + 1, "Skipping malformed line: {reason}")
            }
        }
    }
    Ok(items)
}

fn append_line<T: LineRecord>(path: &Path, item: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| RentalError::persistence(parent, err))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| RentalError::persistence(path, err))?;
    writeln!(file, "{}", item.encode()).map_err(|err| RentalError::persistence(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Plate, VehicleKind, VehicleStatus};
    use anyhow::Result;
    use tempfile::tempdir;

    fn car(plate: &str) -> Result<Vehicle> {
        Ok(Vehicle::new(
            Plate::parse(plate)?,
            VehicleKind::Car { seats: 4 },
            "honda",
            "civic",
            2019,
        )?)
    }

    #[test]
    fn missing_files_load_as_empty() -> Result<()> {
        let dir = tempdir()?;
        let store = FlatFileStore::new(dir.path().join("never-created"));
        assert!(store.load_vehicles()?.is_empty());
        assert!(store.load_customers()?.is_empty());
        assert!(store.load_records()?.is_empty());
        assert!(store.load_kinds()?.is_empty());
        Ok(())
    }

    #[test]
    fn appends_create_directories_and_preserve_order() -> Result<()> {
        let dir = tempdir()?;
        let store = FlatFileStore::new(dir.path().join("nested/data"));

        store.append_vehicle(&car("AAA111")?)?;
        store.append_vehicle(&car("BBB222")?.with_status(VehicleStatus::Held))?;
        store.append_kind(&car("AAA111")?)?;

        let contents = fs::read_to_string(store.vehicles_path())?;
        assert_eq!(
            contents,
            "AAA111,Honda,Civic,2019,Available\nBBB222,Honda,Civic,2019,Held\n"
        );
        assert_eq!(fs::read_to_string(store.kinds_path())?, "AAA111,Car,4\n");

        let loaded = store.load_vehicles()?;
        let plates: Vec<_> = loaded.iter().map(|v| v.plate().as_str()).collect();
        assert_eq!(plates, ["AAA111", "BBB222"]);
        assert_eq!(loaded[1].status(), VehicleStatus::Held);

        let kinds = store.load_kinds()?;
        assert_eq!(kinds.len(), 1);
        assert_eq!(kinds[0].kind, VehicleKind::Car { seats: 4 });
        Ok(())
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() -> Result<()> {
        let dir = tempdir()?;
        let store = FlatFileStore::new(dir.path());
        fs::write(
            store.customers_path(),
            "1,Jane\r\nnot-a-number,Bob\n\n2\n3,Carol\n",
        )?;

        let customers = store.load_customers()?;
        let ids: Vec<_> = customers.iter().map(Customer::id).collect();
        assert_eq!(ids, [1, 3]);
        Ok(())
    }

    #[test]
    fn unreadable_path_is_a_persistence_error() -> Result<()> {
        let dir = tempdir()?;
        let store = FlatFileStore::new(dir.path());
        fs::create_dir_all(store.records_path())?;
        assert!(matches!(
            store.load_records(),
            Err(RentalError::Persistence { .. })
        ));
        Ok(())
    }
}
