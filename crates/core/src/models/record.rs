use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Plate;

/// Transaction type of a rental record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Vehicle handed to a customer.
    Rent,
    /// Vehicle brought back.
    Return,
}

impl RecordKind {
    /// Tag written to `rental_records.txt`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Rent => "RENT",
            RecordKind::Return => "RETURN",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RENT" => Ok(RecordKind::Rent),
            "RETURN" => Ok(RecordKind::Return),
            _ => Err(format!("unknown record kind {s:?}")),
        }
    }
}

/// One rent or return transaction.
///
/// The vehicle and customer are referenced by key; the registry resolves
/// them against its own collections when listing history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRecord {
    kind: RecordKind,
    plate: Plate,
    customer_id: i32,
    date: NaiveDate,
    amount: f64,
}

impl RentalRecord {
    /// Build a record. Amounts are not sign-checked.
    pub fn new(
        plate: Plate,
        customer_id: i32,
        date: NaiveDate,
        amount: f64,
        kind: RecordKind,
    ) -> Self {
        Self {
            kind,
            plate,
            customer_id,
            date,
            amount,
        }
    }

    /// RENT or RETURN.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Plate of the vehicle involved.
    pub fn plate(&self) -> &Plate {
        &self.plate
    }

    /// Id of the customer involved.
    pub fn customer_id(&self) -> i32 {
        self.customer_id
    }

    /// Calendar date of the transaction.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Rental amount for RENT, extra fees for RETURN.
    pub fn amount(&self) -> f64 {
        self.amount
    }
}
