use crate::domain::vehicle::VehicleClass;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParkingError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Missing setup, never retried.
    #[error("No pricing rule configured for vehicle class {0}")]
    NoPricingRule(VehicleClass),
    /// A state transition the stores are built to make unreachable.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, ParkingError>;
