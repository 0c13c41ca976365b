//! Error type for the `uniserial` binary.

use crate::config::ConfigError;
use crate::port::{DriverError, PortError};
use crate::settings::SettingsError;
use std::fmt;

/// Unified application error type.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Port(PortError),
    Driver(DriverError),
    Settings(SettingsError),
    InvalidPayload(String),
    Usage(String),
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "The port configuration is invalid: {e}"),
            Self::Port(e) => write!(f, "A serial port error occurred: {e}"),
            Self::Driver(e) => write!(f, "The device driver failed: {e}"),
            Self::Settings(e) => write!(f, "Settings could not be loaded: {e}"),
            Self::InvalidPayload(details) => write!(f, "The payload is invalid: {details}"),
            Self::Usage(details) => write!(f, "{details}"),
            Self::IoError(e) => write!(f, "An I/O error occurred: {e}"),
            Self::SerdeError(e) => write!(f, "A serialization error occurred: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Port(e) => Some(e),
            Self::Driver(e) => Some(e),
            Self::Settings(e) => Some(e),
            Self::IoError(e) => Some(e),
            Self::SerdeError(e) => Some(e),
            Self::InvalidPayload(_) | Self::Usage(_) => None,
        }
    }
}

// `From` conversions so `?` works across layers.
impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<DriverError> for AppError {
    fn from(err: DriverError) -> Self {
        AppError::Driver(err)
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        AppError::Settings(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerdeError(err)
    }
}
