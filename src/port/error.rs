//! Port-specific error types.
//!
//! [`DriverError`] is what a device driver reports. [`PortError`] is what a
//! [`Port`](super::Port) caller sees: validation failures, driver failures
//! tagged by the stage they happened in, deadlines and closed ports.

use crate::config::ConfigError;
use std::io;
use thiserror::Error;

/// Errors reported by a device driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The specified device was not found on the system.
    #[error("Device not found: {0}")]
    NotFound(String),

    /// The device is already held open by another connection.
    #[error("Device is busy: {0}")]
    Busy(String),

    /// An I/O error from the operating system, native error code preserved.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// The platform cannot honor part of the configuration.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The connection was released.
    #[error("Connection is closed")]
    Closed,
}

impl DriverError {
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }
}

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The request failed validation; no device was touched.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The device could not be opened.
    #[error("Failed to open '{port}': {source}")]
    Open {
        port: String,
        #[source]
        source: DriverError,
    },

    /// The device rejected the configuration.
    #[error("Device rejected configuration: {0}")]
    DeviceConfig(#[source] DriverError),

    /// A read, write or control call failed.
    #[error("I/O failure: {0}")]
    Io(#[source] DriverError),

    /// A read or write deadline passed.
    #[error("Operation timed out: deadline exceeded")]
    Timeout,

    /// The port has been closed.
    #[error("Port is closed")]
    PortClosed,
}

impl PortError {
    pub fn open(port: impl Into<String>, source: DriverError) -> Self {
        Self::Open {
            port: port.into(),
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<PortError> for io::Error {
    fn from(err: PortError) -> Self {
        let kind = match &err {
            PortError::Config(_) => io::ErrorKind::InvalidInput,
            PortError::Open {
                source: DriverError::NotFound(_),
                ..
            } => io::ErrorKind::NotFound,
            PortError::Timeout => io::ErrorKind::TimedOut,
            PortError::PortClosed => io::ErrorKind::NotConnected,
            PortError::Io(DriverError::Io(e)) => e.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::open("/dev/ttyUSB0", DriverError::not_found("/dev/ttyUSB0"));
        assert_eq!(
            err.to_string(),
            "Failed to open '/dev/ttyUSB0': Device not found: /dev/ttyUSB0"
        );

        assert_eq!(PortError::PortClosed.to_string(), "Port is closed");
        assert!(PortError::Timeout.to_string().contains("deadline"));
    }

    #[test]
    fn test_native_code_preserved() {
        let native = io::Error::from_raw_os_error(13);
        let err = PortError::Io(DriverError::Io(native));

        let source = std::error::Error::source(&err).unwrap();
        let driver = source.downcast_ref::<DriverError>().unwrap();
        match driver {
            DriverError::Io(e) => assert_eq!(e.raw_os_error(), Some(13)),
            other => panic!("unexpected driver error: {:?}", other),
        }
    }

    #[test]
    fn test_io_error_kinds() {
        let timeout: io::Error = PortError::Timeout.into();
        assert_eq!(timeout.kind(), io::ErrorKind::TimedOut);

        let closed: io::Error = PortError::PortClosed.into();
        assert_eq!(closed.kind(), io::ErrorKind::NotConnected);

        let invalid: io::Error = PortError::Config(ConfigError::InvalidDataBits(9)).into();
        assert_eq!(invalid.kind(), io::ErrorKind::InvalidInput);
    }
}
