mod bag;
mod custom;
mod wrapped;

pub use bag::ErrorBag;
pub use custom::{CancelledError, CustomError, FeeHistoryValidationError};
pub use wrapped::TrackerError;

/// Export macros for creating errors
mod macros;
