use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;

use super::rental::{Registry, TransactionOutcome};
use crate::models::{Customer, Vehicle, VehicleStatus};

/// Thread-safe handle to a single registry.
///
/// Each mutation holds the write lock for its whole check-then-write
/// sequence, so duplicate checks and status preconditions cannot interleave.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    /// Wrap an opened registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Run `f` against the registry under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        let guard = self.inner.read();
        f(&*guard)
    }

    /// See [`Registry::add_vehicle`].
    pub fn add_vehicle(&self, vehicle: Vehicle) -> bool {
        self.inner.write().add_vehicle(vehicle)
    }

    /// See [`Registry::add_customer`].
    pub fn add_customer(&self, customer: Customer) -> bool {
        self.inner.write().add_customer(customer)
    }

    /// See [`Registry::rent_vehicle`].
    pub fn rent_vehicle(
        &self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        amount: f64,
    ) -> TransactionOutcome {
        self.inner
            .write()
            .rent_vehicle(plate, customer_id, date, amount)
    }

    /// See [`Registry::return_vehicle`].
    pub fn return_vehicle(
        &self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        extra_fees: f64,
    ) -> TransactionOutcome {
        self.inner
            .write()
            .return_vehicle(plate, customer_id, date, extra_fees)
    }

    /// See [`Registry::set_status`].
    pub fn set_status(&self, plate: &str, status: VehicleStatus) -> Option<VehicleStatus> {
        self.inner.write().set_status(plate, status)
    }

    /// Snapshot of a vehicle.
    pub fn vehicle(&self, plate: &str) -> Option<Vehicle> {
        self.inner.read().find_vehicle_by_plate(plate).cloned()
    }

    /// Snapshot of a customer.
    pub fn customer(&self, id: i32) -> Option<Customer> {
        self.inner.read().find_customer_by_id(id).cloned()
    }

    /// Snapshot of the vehicles matching `status`.
    pub fn vehicles(&self, status: Option<VehicleStatus>) -> Vec<Vehicle> {
        self.inner.read().list_vehicles(status).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{
        models::{Plate, VehicleKind},
        store::FlatFileStore,
    };
    use anyhow::Result;
    use tempfile::tempdir;

    fn van(plate: &str) -> Result<Vehicle> {
        Ok(Vehicle::new(
            Plate::parse(plate)?,
            VehicleKind::Minibus { accessible: false },
            "volkswagen",
            "crafter",
            2022,
        )?)
    }

    #[test]
    fn concurrent_adds_of_one_plate_admit_exactly_one() -> Result<()> {
        let dir = tempdir()?;
        let shared = SharedRegistry::new(Registry::open(FlatFileStore::new(dir.path())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                let vehicle = van("VAN100");
                thread::spawn(move || vehicle.map(|v| shared.add_vehicle(v)))
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.join().expect("thread panicked")? {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(shared.vehicles(None).len(), 1);
        Ok(())
    }

    #[test]
    fn concurrent_rents_complete_once() -> Result<()> {
        let dir = tempdir()?;
        let shared = SharedRegistry::new(Registry::open(FlatFileStore::new(dir.path())));
        shared.add_vehicle(van("VAN200")?);
        shared.add_customer(Customer::new(1, "Jane")?);
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || shared.rent_vehicle("VAN200", 1, date, 30.0).is_completed())
            })
            .collect();

        let completed = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread panicked"))
            .filter(|done| *done)
            .count();
        assert_eq!(completed, 1);
        assert_eq!(shared.read(Registry::history_len), 1);
        assert_eq!(
            shared.vehicle("van200").map(|v| v.status()),
            Some(VehicleStatus::Rented)
        );
        assert_eq!(
            shared.customer(1).map(|c| c.name().to_string()),
            Some("Jane".to_string())
        );
        Ok(())
    }
}
