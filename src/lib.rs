//! uniserial: portable serial-port configuration.
//!
//! A caller describes the port it wants as a [`ConfigRequest`]. The
//! [`config`] engine validates it, classifies the baud rate, and turns the
//! inter-character timeout and minimum read size into a blocking regime.
//! The result is a [`NeutralConfigDescriptor`]. A [`Port`] applies that descriptor
//! through a device driver and then behaves the same on every platform.
//!
//! # Modules
//!
//! - `config`: request validation, baud classification, timing policy, translation
//! - `port`: the `Port` handle, driver traits, native and mock drivers
//! - `settings`: TOML settings with environment overrides
//! - `logging`: tracing subscriber setup
//! - `cli`: the `uniserial` command line
//! - `error`: application error type
//!
//! # Example
//!
//! ```
//! use uniserial::{ConfigRequest, MockDevice, MockDriver, Port};
//!
//! let device = MockDevice::new("MOCK0");
//! let driver = MockDriver::new().with_device(device.clone());
//! let port = Port::open(&driver, &ConfigRequest::new("MOCK0").with_baud_rate(9600))?;
//!
//! port.write(b"ping")?;
//! assert_eq!(device.written(), b"ping");
//! # Ok::<(), uniserial::PortError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod port;
pub mod settings;

// Re-export commonly used types for convenience
pub use config::{
    translate, BaudStrategy, BlockingRegime, ConfigError, ConfigRequest, NeutralConfigDescriptor,
    Parity, Rs485Options, TimingError,
};
pub use error::AppError;
pub use port::{
    DeviceConnection, DeviceDriver, DriverError, MockDevice, MockDriver, ModemLine, Port,
    PortError, SerialportDriver,
};
pub use settings::{Settings, SettingsError, SettingsLoader};
