//! Configuration translation engine.
//!
//! Turns a caller-supplied [`ConfigRequest`] into a validated, platform-neutral
//! [`NeutralConfigDescriptor`] that a device driver can apply in one step.
//!
//! # Pipeline
//!
//! ```text
//! ConfigRequest ─> validate ─> baud::classify ─> TimeoutPolicy ─> NeutralConfigDescriptor
//! ```
//!
//! Every stage is pure. Nothing here touches a device, so a request that fails
//! translation can never leave a port half-configured.
//!
//! # Example
//!
//! ```
//! use uniserial::config::{translate, BlockingRegime, ConfigRequest};
//!
//! let request = ConfigRequest::new("/dev/ttyUSB0")
//!     .with_baud_rate(250_000)
//!     .with_inter_character_timeout_ms(1000);
//!
//! let descriptor = translate(&request)?;
//! assert_eq!(descriptor.timing.vtime_tenths, 10);
//! assert_eq!(descriptor.regime, BlockingRegime::TimeoutOnly);
//! assert!(descriptor.baud_strategy.is_two_phase());
//! # Ok::<(), uniserial::config::ConfigError>(())
//! ```

pub mod baud;
mod error;
mod request;
pub mod timing;
mod translate;
pub mod validate;

pub use baud::{is_standard, BaudStrategy, PLACEHOLDER_BAUD_RATE, STANDARD_BAUD_RATES};
pub use error::{ConfigError, ConfigResult, TimingError};
pub use request::{ConfigRequest, Parity, Rs485Options};
pub use timing::{
    round_half_up, BlockingRegime, EventTimeouts, ReadSchedule, ReadStep, TimeoutPolicy,
    TimingParameters,
};
pub use translate::{
    translate, ConfigTranslator, DataBits, FlowControl, LineMode, NeutralConfigDescriptor,
    StopBits,
};
