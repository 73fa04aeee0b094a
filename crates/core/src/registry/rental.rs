use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::{
    error::{RentalError, Result},
    models::{Customer, RecordKind, RentalRecord, Vehicle, VehicleKind, VehicleStatus},
    store::{CustomerKey, FlatFileStore, StoredRecord},
};

/// Result of a rent or return request.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// Status changed and the record was appended to history.
    Completed(RentalRecord),
    /// Rent refused: the vehicle is not `Available`.
    NotAvailable(VehicleStatus),
    /// Return refused: the vehicle is not `Rented`.
    NotRented(VehicleStatus),
    /// No vehicle with the given plate.
    VehicleNotFound,
    /// No customer with the given id.
    CustomerNotFound,
}

impl TransactionOutcome {
    /// Whether the transaction took effect.
    pub fn is_completed(&self) -> bool {
        matches!(self, TransactionOutcome::Completed(_))
    }

    /// The appended record, if any.
    pub fn record(&self) -> Option<&RentalRecord> {
        match self {
            TransactionOutcome::Completed(record) => Some(record),
            _ => None,
        }
    }
}

/// A history record together with the entities it refers to.
#[derive(Debug, Clone, Copy)]
pub struct HistoryEntry<'a> {
    /// The stored transaction.
    pub record: &'a RentalRecord,
    /// Vehicle identified by the record's plate.
    pub vehicle: &'a Vehicle,
    /// Customer identified by the record's customer id.
    pub customer: &'a Customer,
}

/// In-memory store of vehicles, customers and rental history, kept in step
/// with its backing files.
#[derive(Debug)]
pub struct Registry {
    store: FlatFileStore,
    vehicles: Vec<Vehicle>,
    customers: Vec<Customer>,
    history: Vec<RentalRecord>,
    plate_index: HashMap<String, usize>,
    customer_index: HashMap<i32, usize>,
}

impl Registry {
    /// Build a registry and load every backing file into memory.
    pub fn open(store: FlatFileStore) -> Self {
        let mut registry = Self {
            store,
            vehicles: Vec::new(),
            customers: Vec::new(),
            history: Vec::new(),
            plate_index: HashMap::new(),
            customer_index: HashMap::new(),
        };
        registry.load();
        registry
    }

    /// Backing store.
    pub fn store(&self) -> &FlatFileStore {
        &self.store
    }

    fn load(&mut self) {
        let kinds: HashMap<String, VehicleKind> = self
            .store
            .load_kinds()
            .unwrap_or_else(|err| {
                warn!("Failed to load vehicle kinds: {err}");
                Vec::new()
            })
            .into_iter()
            .map(|stored| (stored.plate.to_string(), stored.kind))
            .collect();

        let vehicles = self.store.load_vehicles().unwrap_or_else(|err| {
            warn!("Failed to load vehicles: {err}");
            Vec::new()
        });
        for vehicle in vehicles {
            let kind = match kinds.get(vehicle.plate().as_str()) {
                Some(kind) => kind.clone(),
                None => {
                    debug!(plate = %vehicle.plate(), "No recorded kind for vehicle");
                    VehicleKind::default()
                }
            };
            let vehicle = vehicle.with_kind(kind);
            // Status changes are appended as full lines; the last one wins.
            match self.plate_index.get(vehicle.plate().as_str()) {
                Some(&index) => self.vehicles[index] = vehicle,
                None => self.insert_vehicle(vehicle),
            }
        }

        let customers = self.store.load_customers().unwrap_or_else(|err| {
            warn!("Failed to load customers: {err}");
            Vec::new()
        });
        for customer in customers {
            if self.customer_index.contains_key(&customer.id()) {
                warn!(id = customer.id(), "Ignoring repeated customer line");
                continue;
            }
            self.insert_customer(customer);
        }

        let records = self.store.load_records().unwrap_or_else(|err| {
            warn!("Failed to load rental records: {err}");
            Vec::new()
        });
        for stored in records {
            match self.link(&stored) {
                Some(record) => self.history.push(record),
                None => debug!(
                    plate = %stored.plate,
                    "Dropping history line with unknown vehicle or customer"
                ),
            }
        }

        info!(
            vehicles = self.vehicles.len(),
            customers = self.customers.len(),
            records = self.history.len(),
            "Registry loaded"
        );
    }

    fn link(&self, stored: &StoredRecord) -> Option<RentalRecord> {
        let vehicle = self.find_vehicle_by_plate(stored.plate.as_str())?;
        let customer = match &stored.customer {
            CustomerKey::Id(id) => self.find_customer_by_id(*id)?,
            CustomerKey::Name(name) => self
                .customers
                .iter()
                .find(|customer| customer.name() == name.as_str())?,
        };
        Some(RentalRecord::new(
            vehicle.plate().clone(),
            customer.id(),
            stored.date,
            stored.amount,
            stored.kind,
        ))
    }

    fn insert_vehicle(&mut self, vehicle: Vehicle) {
        self.plate_index
            .insert(vehicle.plate().to_string(), self.vehicles.len());
        self.vehicles.push(vehicle);
    }

    fn insert_customer(&mut self, customer: Customer) {
        self.customer_index
            .insert(customer.id(), self.customers.len());
        self.customers.push(customer);
    }

    /// Register a vehicle, failing with [`RentalError::DuplicateKey`] if the
    /// plate is taken. Nothing changes on failure.
    pub fn try_add_vehicle(&mut self, vehicle: Vehicle) -> Result<()> {
        if self.plate_index.contains_key(vehicle.plate().as_str()) {
            return Err(RentalError::DuplicateKey(vehicle.plate().to_string()));
        }
        self.persist_vehicle(&vehicle);
        if let Err(err) = self.store.append_kind(&vehicle) {
            warn!(plate = %vehicle.plate(), "Vehicle kind kept in memory only: {err}");
        }
        info!(plate = %vehicle.plate(), kind = vehicle.kind().name(), "Vehicle added");
        self.insert_vehicle(vehicle);
        Ok(())
    }

    /// Register a vehicle. Returns `false` and changes nothing if the plate is taken.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> bool {
        match self.try_add_vehicle(vehicle) {
            Ok(()) => true,
            Err(err) => {
                info!("Rejected vehicle: {err}");
                false
            }
        }
    }

    /// Register a customer, failing with [`RentalError::DuplicateKey`] if the
    /// id is taken. Nothing changes on failure.
    pub fn try_add_customer(&mut self, customer: Customer) -> Result<()> {
        if self.customer_index.contains_key(&customer.id()) {
            return Err(RentalError::DuplicateKey(customer.id().to_string()));
        }
        if let Err(err) = self.store.append_customer(&customer) {
            warn!(id = customer.id(), "Customer kept in memory only: {err}");
        }
        info!(id = customer.id(), name = customer.name(), "Customer added");
        self.insert_customer(customer);
        Ok(())
    }

    /// Register a customer. Returns `false` and changes nothing if the id is taken.
    pub fn add_customer(&mut self, customer: Customer) -> bool {
        match self.try_add_customer(customer) {
            Ok(()) => true,
            Err(err) => {
                info!("Rejected customer: {err}");
                false
            }
        }
    }

    /// Case-insensitive exact plate lookup.
    pub fn find_vehicle_by_plate(&self, plate: &str) -> Option<&Vehicle> {
        let key = plate.trim().to_uppercase();
        self.plate_index.get(&key).map(|&index| &self.vehicles[index])
    }

    /// Exact id lookup.
    pub fn find_customer_by_id(&self, id: i32) -> Option<&Customer> {
        self.customer_index.get(&id).map(|&index| &self.customers[index])
    }

    /// Rent an `Available` vehicle: it becomes `Rented` and a RENT record is
    /// appended. Any other status leaves everything untouched.
    pub fn rent_vehicle(
        &mut self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        amount: f64,
    ) -> TransactionOutcome {
        self.transition(plate, customer_id, date, amount, RecordKind::Rent)
    }

    /// Return a `Rented` vehicle: it becomes `Available` and a RETURN record
    /// carrying `extra_fees` is appended. Any other status leaves everything
    /// untouched.
    pub fn return_vehicle(
        &mut self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        extra_fees: f64,
    ) -> TransactionOutcome {
        self.transition(plate, customer_id, date, extra_fees, RecordKind::Return)
    }

    fn transition(
        &mut self,
        plate: &str,
        customer_id: i32,
        date: NaiveDate,
        amount: f64,
        kind: RecordKind,
    ) -> TransactionOutcome {
        let Some(&index) = self.plate_index.get(&plate.trim().to_uppercase()) else {
            return TransactionOutcome::VehicleNotFound;
        };
        if !self.customer_index.contains_key(&customer_id) {
            return TransactionOutcome::CustomerNotFound;
        }

        let (required, next) = match kind {
            RecordKind::Rent => (VehicleStatus::Available, VehicleStatus::Rented),
            RecordKind::Return => (VehicleStatus::Rented, VehicleStatus::Available),
        };
        let current = self.vehicles[index].status();
        if current != required {
            info!(plate = %plate, status = %current, %kind, "Transaction refused");
            return match kind {
                RecordKind::Rent => TransactionOutcome::NotAvailable(current),
                RecordKind::Return => TransactionOutcome::NotRented(current),
            };
        }

        self.vehicles[index].set_status(next);
        let vehicle = &self.vehicles[index];
        let record = RentalRecord::new(vehicle.plate().clone(), customer_id, date, amount, kind);

        self.persist_vehicle(vehicle);
        if let Err(err) = self.store.append_record(&record) {
            warn!(plate = %record.plate(), "Record kept in memory only: {err}");
        }
        info!(plate = %record.plate(), customer_id, amount, %kind, "Transaction recorded");

        self.history.push(record.clone());
        TransactionOutcome::Completed(record)
    }

    /// Administrative status override outside the rent/return flow.
    /// Returns the previous status, or `None` for an unknown plate.
    pub fn set_status(&mut self, plate: &str, status: VehicleStatus) -> Option<VehicleStatus> {
        let index = *self.plate_index.get(&plate.trim().to_uppercase())?;
        let previous = self.vehicles[index].status();
        self.vehicles[index].set_status(status);
        self.persist_vehicle(&self.vehicles[index]);
        info!(plate = %plate, from = %previous, to = %status, "Status overridden");
        Some(previous)
    }

    fn persist_vehicle(&self, vehicle: &Vehicle) {
        if let Err(err) = self.store.append_vehicle(vehicle) {
            warn!(plate = %vehicle.plate(), "Vehicle state kept in memory only: {err}");
        }
    }

    /// Vehicles in registration order, optionally restricted to one status.
    pub fn list_vehicles(
        &self,
        status: Option<VehicleStatus>,
    ) -> impl Iterator<Item = &Vehicle> + '_ {
        self.vehicles
            .iter()
            .filter(move |vehicle| status.map_or(true, |wanted| vehicle.status() == wanted))
    }

    /// Customers in registration order.
    pub fn list_customers(&self) -> impl Iterator<Item = &Customer> + '_ {
        self.customers.iter()
    }

    /// History in chronological call order, linked to its vehicles and customers.
    pub fn list_history(&self) -> impl Iterator<Item = HistoryEntry<'_>> + '_ {
        self.history.iter().filter_map(move |record| {
            Some(HistoryEntry {
                record,
                vehicle: self.find_vehicle_by_plate(record.plate().as_str())?,
                customer: self.find_customer_by_id(record.customer_id())?,
            })
        })
    }

    /// Number of registered vehicles.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Number of registered customers.
    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    /// Number of history records.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
