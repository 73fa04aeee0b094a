use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{capitalize, ensure_storable};
use crate::error::{RentalError, Result};

static PLATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]{3}$").expect("invalid plate regex"));

/// Validated, upper-cased license plate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plate(String);

impl Plate {
    /// Validate `raw` against `[A-Z]{3}[0-9]{3}` after trimming and upper-casing.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_uppercase();
        if PLATE_RE.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(RentalError::InvalidPlate(raw.to_string()))
        }
    }

    /// Borrow the plate text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for Plate {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Plate {
    type Error = RentalError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Plate> for String {
    fn from(plate: Plate) -> Self {
        plate.0
    }
}

/// Availability of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// Ready to be rented.
    Available,
    /// Reserved outside the rent/return flow.
    Held,
    /// Currently out with a customer.
    Rented,
    /// In the workshop.
    UnderMaintenance,
    /// Retired from the fleet.
    OutOfService,
}

impl VehicleStatus {
    /// Every status, in declaration order.
    pub const ALL: [VehicleStatus; 5] = [
        VehicleStatus::Available,
        VehicleStatus::Held,
        VehicleStatus::Rented,
        VehicleStatus::UnderMaintenance,
        VehicleStatus::OutOfService,
    ];

    /// Symbolic name as written to `vehicles.txt`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::Held => "Held",
            VehicleStatus::Rented => "Rented",
            VehicleStatus::UnderMaintenance => "UnderMaintenance",
            VehicleStatus::OutOfService => "OutOfService",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::UnderMaintenance => "Under Maintenance",
            VehicleStatus::OutOfService => "Out of Service",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    /// Accepts the symbolic name case-insensitively, ignoring spaces and underscores.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        VehicleStatus::ALL
            .into_iter()
            .find(|status| status.as_str().to_lowercase() == key)
            .or(match key.as_str() {
                "maintenance" => Some(VehicleStatus::UnderMaintenance),
                _ => None,
            })
            .ok_or_else(|| format!("unknown vehicle status {s:?}"))
    }
}

/// Vehicle subtype with its variant-specific attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VehicleKind {
    /// Passenger car.
    Car {
        /// Number of seats.
        seats: u32,
    },
    /// Minibus.
    Minibus {
        /// Wheelchair accessible.
        accessible: bool,
    },
    /// Pickup truck.
    PickupTruck {
        /// Cargo bed size.
        cargo_size: f64,
        /// Whether a trailer is attached.
        has_trailer: bool,
    },
}

impl Default for VehicleKind {
    /// Placeholder for vehicles whose subtype was never recorded.
    fn default() -> Self {
        VehicleKind::Car { seats: 0 }
    }
}

impl VehicleKind {
    /// Tag written to `vehicle_kinds.txt`.
    pub fn name(&self) -> &'static str {
        match self {
            VehicleKind::Car { .. } => "Car",
            VehicleKind::Minibus { .. } => "Minibus",
            VehicleKind::PickupTruck { .. } => "PickupTruck",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            VehicleKind::PickupTruck { .. } => "Pickup Truck",
            other => other.name(),
        }
    }
}

/// A rentable vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    plate: Plate,
    kind: VehicleKind,
    make: String,
    model: String,
    year: i32,
    status: VehicleStatus,
}

impl Vehicle {
    /// Build an available vehicle, capitalising make and model.
    pub fn new(plate: Plate, kind: VehicleKind, make: &str, model: &str, year: i32) -> Result<Self> {
        let make = capitalize(make);
        let model = capitalize(model);
        ensure_storable("make", &make)?;
        ensure_storable("model", &model)?;
        Ok(Self {
            plate,
            kind,
            make,
            model,
            year,
            status: VehicleStatus::Available,
        })
    }

    /// Unique key of the vehicle.
    pub fn plate(&self) -> &Plate {
        &self.plate
    }

    /// Subtype and its attributes.
    pub fn kind(&self) -> &VehicleKind {
        &self.kind
    }

    /// Capitalised manufacturer name.
    pub fn make(&self) -> &str {
        &self.make
    }

    /// Capitalised model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Current availability.
    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Overwrite the status. Rent/return go through the registry instead.
    pub fn set_status(&mut self, status: VehicleStatus) {
        self.status = status;
    }

    /// Builder-style subtype override, used when restoring stored state.
    pub fn with_kind(mut self, kind: VehicleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder-style status override, used when restoring stored state.
    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_accepts_three_letters_and_three_digits() -> Result<()> {
        assert_eq!(Plate::parse("ABC123")?.as_str(), "ABC123");
        assert_eq!(Plate::parse("abc123")?.as_str(), "ABC123");
        assert_eq!(Plate::parse(" xYz789 ")?.as_str(), "XYZ789");
        Ok(())
    }

    #[test]
    fn plate_rejects_other_shapes() {
        for raw in ["", "AB1234", "ABCD123", "ABC12", "123ABC", "ABC-123", "ABC１２３", "ÄBC123"] {
            assert!(
                matches!(Plate::parse(raw), Err(RentalError::InvalidPlate(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn new_vehicle_is_available_with_capitalised_names() -> Result<()> {
        let vehicle = Vehicle::new(
            Plate::parse("ABC123")?,
            VehicleKind::Car { seats: 5 },
            "toyota",
            "COROLLA",
            2020,
        )?;
        assert_eq!(vehicle.make(), "Toyota");
        assert_eq!(vehicle.model(), "Corolla");
        assert_eq!(vehicle.year(), 2020);
        assert_eq!(vehicle.status(), VehicleStatus::Available);
        assert_eq!(vehicle.kind().label(), "Car");
        Ok(())
    }

    #[test]
    fn vehicle_rejects_delimiter_in_make() -> Result<()> {
        let result = Vehicle::new(
            Plate::parse("ABC123")?,
            VehicleKind::Minibus { accessible: true },
            "mercedes,benz",
            "sprinter",
            2018,
        );
        assert!(matches!(result, Err(RentalError::InvalidField { field: "make", .. })));
        Ok(())
    }

    #[test]
    fn status_parses_symbolic_and_loose_names() {
        assert_eq!("Available".parse(), Ok(VehicleStatus::Available));
        assert_eq!("under_maintenance".parse(), Ok(VehicleStatus::UnderMaintenance));
        assert_eq!("out of service".parse(), Ok(VehicleStatus::OutOfService));
        assert_eq!("maintenance".parse(), Ok(VehicleStatus::UnderMaintenance));
        assert!("Lost".parse::<VehicleStatus>().is_err());
    }
}
