use std::error::Error;
use std::fmt::Display;

/// A custom error type for convenient error creation
#[derive(Debug)]
pub struct CustomError {
    message: String,
}

impl CustomError {
    pub fn from_owned_string(message: String) -> CustomError {
        CustomError { message }
    }
}
impl Error for CustomError {}

impl Display for CustomError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomError: {}", self.message)
    }
}

/// Returned when the caller abandoned the operation through its cancellation token
#[derive(Debug)]
pub struct CancelledError {
    pub operation: String,
}

impl CancelledError {
    pub fn new(operation: &str) -> CancelledError {
        CancelledError {
            operation: operation.to_string(),
        }
    }
}
impl Error for CancelledError {}

impl Display for CancelledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Operation cancelled: {}", self.operation)
    }
}

/// Input rejected before any network call is made
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeHistoryValidationError {
    #[error("Percentile {0} is out of range, expected value between 0 and 100")]
    InvalidPercentile(u32),
}
