use super::{CancelledError, CustomError, FeeHistoryValidationError};
use crate::utils::ConversionError;
use hex::FromHexError;
use std::fmt::Display;

/// Enum containing all possible errors used in the library
#[derive(Debug)]
pub enum ErrorBag {
    IoError(std::io::Error),
    CustomError(CustomError),
    Web3Error(web3::Error),
    ConversionError(ConversionError),
    FromHexError(FromHexError),
    HttpError(reqwest::Error),
    JsonError(serde_json::Error),
    TomlError(toml::de::Error),
    ValidationError(FeeHistoryValidationError),
    Cancelled(CancelledError),
}

impl ErrorBag {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ErrorBag::Cancelled(_))
    }
}

impl Display for ErrorBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorBag::IoError(io_error) => write!(f, "{io_error}"),
            ErrorBag::CustomError(custom_error) => write!(f, "{custom_error}"),
            ErrorBag::Web3Error(web3_error) => write!(f, "{web3_error:?}"),
            ErrorBag::ConversionError(conversion_error) => write!(f, "{conversion_error:?}"),
            ErrorBag::FromHexError(from_hex_error) => write!(f, "{from_hex_error:?}"),
            ErrorBag::HttpError(http_error) => write!(f, "{http_error}"),
            ErrorBag::JsonError(json_error) => write!(f, "{json_error}"),
            ErrorBag::TomlError(toml_error) => write!(f, "{toml_error}"),
            ErrorBag::ValidationError(validation_error) => write!(f, "{validation_error}"),
            ErrorBag::Cancelled(cancelled) => write!(f, "{cancelled}"),
        }
    }
}

impl std::error::Error for ErrorBag {}

impl From<std::io::Error> for ErrorBag {
    fn from(err: std::io::Error) -> Self {
        ErrorBag::IoError(err)
    }
}

impl From<CustomError> for ErrorBag {
    fn from(err: CustomError) -> Self {
        ErrorBag::CustomError(err)
    }
}

impl From<web3::Error> for ErrorBag {
    fn from(err: web3::Error) -> Self {
        ErrorBag::Web3Error(err)
    }
}

impl From<ConversionError> for ErrorBag {
    fn from(err: ConversionError) -> Self {
        ErrorBag::ConversionError(err)
    }
}

impl From<FromHexError> for ErrorBag {
    fn from(err: FromHexError) -> Self {
        ErrorBag::FromHexError(err)
    }
}

impl From<reqwest::Error> for ErrorBag {
    fn from(err: reqwest::Error) -> Self {
        ErrorBag::HttpError(err)
    }
}

impl From<serde_json::Error> for ErrorBag {
    fn from(err: serde_json::Error) -> Self {
        ErrorBag::JsonError(err)
    }
}

impl From<toml::de::Error> for ErrorBag {
    fn from(err: toml::de::Error) -> Self {
        ErrorBag::TomlError(err)
    }
}

impl From<FeeHistoryValidationError> for ErrorBag {
    fn from(err: FeeHistoryValidationError) -> Self {
        ErrorBag::ValidationError(err)
    }
}

impl From<CancelledError> for ErrorBag {
    fn from(err: CancelledError) -> Self {
        ErrorBag::Cancelled(err)
    }
}

