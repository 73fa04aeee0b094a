//! Entity model: vehicles, customers and rental records.

mod customer;
mod record;
mod vehicle;

pub use customer::Customer;
pub use record::{RecordKind, RentalRecord};
pub use vehicle::{Plate, Vehicle, VehicleKind, VehicleStatus};

use crate::error::{RentalError, Result};

/// Field separator used by the flat-file encoding.
pub const DELIMITER: &str = ",";

/// Reject text that would split or break a stored line.
pub(crate) fn ensure_storable(field: &'static str, value: &str) -> Result<()> {
    if value.contains(DELIMITER) {
        return Err(RentalError::InvalidField {
            field,
            reason: format!("must not contain '{DELIMITER}'"),
        });
    }
    if value.contains(|ch: char| ch == '\n' || ch == '\r') {
        return Err(RentalError::InvalidField {
            field,
            reason: "must not contain line breaks".to_string(),
        });
    }
    Ok(())
}

/// Trim and capitalise: first character upper case, the rest lower case.
pub(crate) fn capitalize(input: &str) -> String {
    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalizes_mixed_case_input() {
        assert_eq!(capitalize("toyota"), "Toyota");
        assert_eq!(capitalize("  cOROLLA "), "Corolla");
        assert_eq!(capitalize("f-150"), "F-150");
        assert_eq!(capitalize("   "), "");
    }

    #[test]
    fn rejects_delimiters_and_line_breaks() {
        assert!(ensure_storable("make", "Land Rover").is_ok());
        assert!(matches!(
            ensure_storable("make", "Mercedes,Benz"),
            Err(RentalError::InvalidField { field: "make", .. })
        ));
        assert!(ensure_storable("name", "Jane\nDoe").is_err());
    }
}
