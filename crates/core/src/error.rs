//! Error taxonomy shared by the entity model, persistence adapter and registry.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures surfaced by the rental core.
#[derive(Debug, Error)]
pub enum RentalError {
    /// License plate does not match three letters followed by three digits.
    #[error("invalid license plate {0:?}: expected three letters followed by three digits")]
    InvalidPlate(String),

    /// A free-text field is empty or would corrupt the line format.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// An entity with the same key is already registered. Returned by
    /// `Registry::try_add_*`.
    #[error("duplicate key {0}")]
    DuplicateKey(String),

    /// Reading or appending one of the backing files failed.
    #[error("failed to access {}: {source}", .path.display())]
    Persistence {
        /// File that could not be read or written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, RentalError>;

impl RentalError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}
