//! Port layer: the live [`Port`] handle and the device drivers behind it.
//!
//! A [`Port`] is generic over a [`DeviceConnection`], so the same handle runs
//! on real hardware through [`SerialportDriver`] and in tests through
//! [`MockDriver`].

pub mod error;
mod handle;
pub mod mock;
pub mod native;
pub mod traits;

pub use error::{DriverError, PortError};
pub use handle::{Port, POLL_SLICE};
pub use mock::{MockConnection, MockDevice, MockDriver};
pub use native::{available_ports, NativeConnection, SerialportDriver};
pub use traits::{DeviceConnection, DeviceDriver, ModemLine};

use crate::config::ConfigRequest;

/// Open an operating-system serial port.
///
/// Shorthand for `Port::open(&SerialportDriver::new(), request)`.
pub fn open(request: &ConfigRequest) -> Result<Port<NativeConnection>, PortError> {
    Port::open(&SerialportDriver::new(), request)
}
