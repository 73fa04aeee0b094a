//! Comma-delimited line encoding for each stored entity.

use chrono::NaiveDate;

use crate::models::{
    Customer, Plate, RecordKind, RentalRecord, Vehicle, VehicleKind, VehicleStatus, DELIMITER,
};

/// Date layout used in `rental_records.txt`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a line could not be decoded.
pub type DecodeError = String;

/// A value stored as exactly one line of text.
pub trait LineRecord: Sized {
    /// Render the value without a trailing newline.
    fn encode(&self) -> String;

    /// Parse a single line (already stripped of its newline).
    fn decode(line: &str) -> Result<Self, DecodeError>;
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split(DELIMITER).map(str::trim).collect()
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, DecodeError> {
    raw.parse()
        .map_err(|_| format!("unparsable {name} {raw:?}"))
}

impl LineRecord for Vehicle {
    /// `PLATE,MAKE,MODEL,YEAR,STATUS`. The subtype lives in [`StoredKind`].
    fn encode(&self) -> String {
        [
            self.plate().to_string(),
            self.make().to_string(),
            self.model().to_string(),
            self.year().to_string(),
            self.status().to_string(),
        ]
        .join(DELIMITER)
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(line);
        let [plate, make, model, year, status] = fields.as_slice() else {
            return Err(format!("expected 5 fields, found {}", fields.len()));
        };

        let plate = Plate::parse(plate).map_err(|err| err.to_string())?;
        let year: i32 = parse_field("year", year)?;
        let status: VehicleStatus = status.parse()?;

        Vehicle::new(plate, VehicleKind::default(), make, model, year)
            .map(|vehicle| vehicle.with_status(status))
            .map_err(|err| err.to_string())
    }
}

/// Subtype attributes of one vehicle, kept beside `vehicles.txt` and keyed
/// by plate.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredKind {
    /// Vehicle key.
    pub plate: Plate,
    /// Subtype and its attributes.
    pub kind: VehicleKind,
}

impl From<&Vehicle> for StoredKind {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            plate: vehicle.plate().clone(),
            kind: vehicle.kind().clone(),
        }
    }
}

impl LineRecord for StoredKind {
    fn encode(&self) -> String {
        let mut fields = vec![self.plate.to_string(), self.kind.name().to_string()];
        match &self.kind {
            VehicleKind::Car { seats } => fields.push(seats.to_string()),
            VehicleKind::Minibus { accessible } => fields.push(accessible.to_string()),
            VehicleKind::PickupTruck {
                cargo_size,
                has_trailer,
            } => {
                fields.push(cargo_size.to_string());
                fields.push(has_trailer.to_string());
            }
        }
        fields.join(DELIMITER)
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(line);
        let [plate, rest @ ..] = fields.as_slice() else {
            return Err("empty line".to_string());
        };
        let plate = Plate::parse(plate).map_err(|err| err.to_string())?;

        let kind = match rest {
            ["Car", seats] => VehicleKind::Car {
                seats: parse_field("seats", seats)?,
            },
            ["Minibus", accessible] => VehicleKind::Minibus {
                accessible: parse_field("accessible flag", accessible)?,
            },
            ["PickupTruck", cargo, trailer] => VehicleKind::PickupTruck {
                cargo_size: parse_field("cargo size", cargo)?,
                has_trailer: parse_field("trailer flag", trailer)?,
            },
            other => return Err(format!("unrecognised vehicle kind fields {other:?}")),
        };
        Ok(Self { plate, kind })
    }
}

impl LineRecord for Customer {
    fn encode(&self) -> String {
        format!("{}{DELIMITER}{}", self.id(), self.name())
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(line);
        let [id, name] = fields.as_slice() else {
            return Err(format!("expected 2 fields, found {}", fields.len()));
        };
        Customer::new(parse_field("customer id", id)?, name).map_err(|err| err.to_string())
    }
}

/// How a stored record names its customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerKey {
    /// Canonical form: the customer id.
    Id(i32),
    /// Older files keyed records by customer name.
    Name(String),
}

/// A record line before it is linked to registered entities.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// RENT or RETURN.
    pub kind: RecordKind,
    /// Vehicle key.
    pub plate: Plate,
    /// Customer key.
    pub customer: CustomerKey,
    /// Transaction date.
    pub date: NaiveDate,
    /// Amount or extra fees.
    pub amount: f64,
}

impl From<&RentalRecord> for StoredRecord {
    fn from(record: &RentalRecord) -> Self {
        Self {
            kind: record.kind(),
            plate: record.plate().clone(),
            customer: CustomerKey::Id(record.customer_id()),
            date: record.date(),
            amount: record.amount(),
        }
    }
}

impl LineRecord for StoredRecord {
    fn encode(&self) -> String {
        let customer = match &self.customer {
            CustomerKey::Id(id) => id.to_string(),
            CustomerKey::Name(name) => name.clone(),
        };
        [
            self.kind.to_string(),
            self.plate.to_string(),
            customer,
            self.date.format(DATE_FORMAT).to_string(),
            self.amount.to_string(),
        ]
        .join(DELIMITER)
    }

    fn decode(line: &str) -> Result<Self, DecodeError> {
        let fields = split_fields(line);
        let [kind, plate, customer, date, amount] = fields.as_slice() else {
            return Err(format!("expected 5 fields, found {}", fields.len()));
        };

        let customer = match customer.parse::<i32>() {
            Ok(id) => CustomerKey::Id(id),
            Err(_) if !customer.is_empty() => CustomerKey::Name(customer.to_string()),
            Err(_) => return Err("missing customer key".to_string()),
        };

        Ok(Self {
            kind: kind.parse()?,
            plate: Plate::parse(plate).map_err(|err| err.to_string())?,
            customer,
            date: NaiveDate::parse_from_str(date, DATE_FORMAT)
                .map_err(|_| format!("unparsable date {date:?}"))?,
            amount: parse_field("amount", amount)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_line_has_exactly_five_fields() {
        let truck = Vehicle::decode("XYZ789,ford,F-150,2021,Rented").expect("valid vehicle line");
        assert_eq!(truck.make(), "Ford");
        assert_eq!(truck.status(), VehicleStatus::Rented);
        assert_eq!(truck.kind(), &VehicleKind::default());
        assert_eq!(truck.encode(), "XYZ789,Ford,F-150,2021,Rented");

        let car = Vehicle::new(
            Plate::parse("ABC123").expect("valid plate"),
            VehicleKind::Car { seats: 5 },
            "toyota",
            "corolla",
            2020,
        )
        .expect("valid vehicle");
        let line = car.encode();
        assert_eq!(line, "ABC123,Toyota,Corolla,2020,Available");
        assert_eq!(line.split(DELIMITER).count(), 5);
    }

    #[test]
    fn kind_line_carries_subtype_attributes() {
        let stored = StoredKind::decode("XYZ789,PickupTruck,1.5,true").expect("valid kind line");
        assert_eq!(stored.plate.as_str(), "XYZ789");
        assert_eq!(
            stored.kind,
            VehicleKind::PickupTruck {
                cargo_size: 1.5,
                has_trailer: true
            }
        );
        assert_eq!(stored.encode(), "XYZ789,PickupTruck,1.5,true");

        let minibus = StoredKind::decode("MIN001,Minibus,false").expect("valid kind line");
        assert_eq!(minibus.kind, VehicleKind::Minibus { accessible: false });
    }

    #[test]
    fn malformed_vehicle_lines_are_rejected() {
        for line in [
            "ABC123,Toyota,Corolla",
            "ABC123,Toyota,Corolla,twenty,Available",
            "ABC123,Toyota,Corolla,2020,Stolen",
            "AB123,Toyota,Corolla,2020,Available",
            "ABC123,Toyota,Corolla,2020,Available,Car,5",
        ] {
            assert!(Vehicle::decode(line).is_err(), "{line:?} should fail");
        }
        for line in [
            "ABC123",
            "ABC123,Car",
            "ABC123,Boat,3",
            "ABC123,Minibus,maybe",
            "AB12,Car,4",
        ] {
            assert!(StoredKind::decode(line).is_err(), "{line:?} should fail");
        }
    }

    #[test]
    fn customer_line_requires_numeric_id() {
        let customer = Customer::decode("7,Jane Doe").expect("valid customer");
        assert_eq!(customer.id(), 7);
        assert_eq!(customer.name(), "Jane Doe");
        assert_eq!(customer.encode(), "7,Jane Doe");

        assert!(Customer::decode("seven,Jane").is_err());
        assert!(Customer::decode("7,Doe,Jane").is_err());
        assert!(Customer::decode("7").is_err());
    }

    #[test]
    fn record_line_accepts_legacy_name_key() {
        let record = StoredRecord::decode("RENT,ABC123,1,2024-01-01,50").expect("valid record");
        assert_eq!(record.kind, RecordKind::Rent);
        assert_eq!(record.customer, CustomerKey::Id(1));
        assert_eq!(record.amount, 50.0);
        assert_eq!(record.encode(), "RENT,ABC123,1,2024-01-01,50");

        let legacy = StoredRecord::decode("RETURN,ABC123,Jane,2024-01-05,10.5").expect("legacy");
        assert_eq!(legacy.customer, CustomerKey::Name("Jane".to_string()));
        assert_eq!(legacy.amount, 10.5);

        let signed = StoredRecord::decode("RENT,ABC123,-5,2024-01-01,20").expect("signed id");
        assert_eq!(signed.customer, CustomerKey::Id(-5));
    }

    #[test]
    fn malformed_record_lines_are_rejected() {
        for line in [
            "RENT,ABC123,1,2024-01-01",
            "LEASE,ABC123,1,2024-01-01,50",
            "RENT,ABC123,1,01/01/2024,50",
            "RENT,ABC123,1,2024-01-01,fifty",
            "RENT,ABC123,,2024-01-01,50",
        ] {
            assert!(StoredRecord::decode(line).is_err(), "{line:?} should fail");
        }
    }
}
