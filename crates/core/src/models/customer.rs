use serde::{Deserialize, Serialize};

use super::ensure_storable;
use crate::error::{RentalError, Result};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: i32,
    name: String,
}

impl Customer {
    /// Build a customer. The name is trimmed and must be non-empty and free of
    /// the field delimiter and line breaks, so the stored `ID,NAME` line always
    /// decodes back to the same customer.
    pub fn new(id: i32, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RentalError::InvalidField {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        ensure_storable("name", name)?;
        Ok(Self {
            id,
            name: name.to_string(),
        })
    }

    /// Unique key of the customer.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
