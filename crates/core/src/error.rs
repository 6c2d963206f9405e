//! Error kinds reported by the fleet core.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias used throughout the core crate.
pub type FleetResult<T> = Result<T, FleetError>;

/// Every failure the store, ledger, and service can report.
#[derive(Debug, Error)]
pub enum FleetError {
    /// A persisted line could not be decoded.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number within the backing file (0 when decoding a bare line).
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// A vehicle with this id already exists.
    #[error("vehicle id {0} already exists")]
    DuplicateId(String),

    /// No vehicle with this id exists.
    #[error("unknown vehicle {0}")]
    UnknownVehicle(String),

    /// The vehicle is currently rented.
    #[error("vehicle {0} is not available for rent")]
    NotAvailable(String),

    /// The ledger already holds an active rental for this vehicle.
    #[error("vehicle {0} already has an active rental")]
    AlreadyRented(String),

    /// The ledger holds no active rental for this vehicle.
    #[error("vehicle {0} is not rented")]
    NotRented(String),

    /// The daily rate is negative or not a finite number.
    #[error("invalid daily rate {0}")]
    InvalidRate(f64),

    /// A text field would not fit on a single persisted line.
    #[error("{field} must not contain line breaks: {value:?}")]
    InvalidField {
        /// Which field was rejected.
        field: &'static str,
        /// The offending value.
        value: String,
    },

    /// A renter id is already issued to someone else, or is out of sequence.
    #[error("renter id {0} conflicts with the issued renters")]
    RenterConflict(String),

    /// Roster and ledger disagree about which vehicles are rented.
    #[error("roster and rental ledger disagree for vehicles: {}", vehicle_ids.join(", "))]
    Inconsistent {
        /// Vehicles whose availability does not match the ledger.
        vehicle_ids: Vec<String>,
    },

    /// Reading or writing a backing file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl FleetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FleetError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        FleetError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    /// Attach a line number to a decoding failure produced without one.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            FleetError::MalformedRecord { reason, .. } => FleetError::MalformedRecord { line, reason },
            other => other,
        }
    }
}
