//! Validation error types for configuration translation.

use thiserror::Error;

/// Errors raised while validating or translating a [`ConfigRequest`].
///
/// All of these are detected before any device is touched.
///
/// [`ConfigRequest`]: super::ConfigRequest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Data bits outside 5..=8.
    #[error("Invalid data bits {0}: expected 5, 6, 7 or 8")]
    InvalidDataBits(u8),

    /// Stop bits other than 1 or 2.
    #[error("Invalid stop bits {0}: expected 1 or 2")]
    InvalidStopBits(u8),

    /// Parity mode not one of none, odd or even.
    #[error("Invalid parity '{0}': expected none, odd or even")]
    InvalidParity(String),

    /// Baud rate of zero.
    #[error("Invalid baud rate {0}: must be greater than zero")]
    InvalidBaudRate(u32),

    /// Timeout and minimum read size do not describe a usable blocking policy.
    #[error("Invalid timing configuration: {0}")]
    InvalidTimingConfig(#[from] TimingError),
}

/// The distinct ways a timing configuration can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimingError {
    /// Neither field is set, or the timeout rounds below 100ms with no minimum read size.
    #[error(
        "at least one of timeout or minimum read size must be configured; \
         timeout alone must be at least 100ms (got {timeout_ms}ms)"
    )]
    NothingToWaitFor { timeout_ms: u32 },

    /// Rounded timeout above the 25500ms a single byte of tenths can carry.
    #[error("timeout {timeout_ms}ms exceeds maximum representable value of 25500ms")]
    TimeoutTooLarge { timeout_ms: u32 },

    /// Minimum read size above 255 bytes.
    #[error("minimum read size {0} exceeds 255 bytes")]
    MinimumReadSizeOutOfRange(u32),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
