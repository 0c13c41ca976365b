//! Device driver traits.
//!
//! A [`DeviceDriver`] opens connections; a [`DeviceConnection`] applies a
//! [`NeutralConfigDescriptor`] and moves bytes. There is one driver per OS
//! family (see [`SerialportDriver`](super::SerialportDriver)) plus an
//! in-memory one for tests ([`MockDriver`](super::MockDriver)).
//!
//! Both I/O primitives take a `wait` bound and must return within it. That is
//! all a [`Port`](super::Port) needs to realize every blocking regime,
//! deadline and close on top of any native timeout model.

use super::error::DriverError;
use crate::config::NeutralConfigDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Modem control and status lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModemLine {
    /// Data Terminal Ready (output).
    Dtr,
    /// Request To Send (output).
    Rts,
    /// Clear To Send (input).
    Cts,
    /// Data Set Ready (input).
    Dsr,
    /// Ring Indicator (input).
    Ri,
    /// Carrier Detect (input).
    Cd,
}

impl ModemLine {
    /// Whether the line can be driven by the host.
    pub fn is_output(&self) -> bool {
        matches!(self, ModemLine::Dtr | ModemLine::Rts)
    }
}

impl fmt::Display for ModemLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModemLine::Dtr => "DTR",
            ModemLine::Rts => "RTS",
            ModemLine::Cts => "CTS",
            ModemLine::Dsr => "DSR",
            ModemLine::Ri => "RI",
            ModemLine::Cd => "CD",
        };
        f.write_str(name)
    }
}

/// Opens device connections.
pub trait DeviceDriver {
    type Connection: DeviceConnection;

    /// Open `port_name` for exclusive use.
    fn open(&self, port_name: &str) -> Result<Self::Connection, DriverError>;
}

/// One open device. All methods take `&self` so that a read and a write can
/// be in flight at the same time.
pub trait DeviceConnection: Send + Sync {
    /// Apply the line settings, using the descriptor's initial baud rate.
    fn apply_config(&self, descriptor: &NeutralConfigDescriptor) -> Result<(), DriverError>;

    /// Set an exact rate outside the standard set. Only called for the
    /// two-phase strategy, after [`apply_config`](Self::apply_config).
    fn apply_nonstandard_baud(&self, rate: u32) -> Result<(), DriverError>;

    /// Read whatever is available into `buffer`, waiting at most `wait` for
    /// the first byte. Returns 0 if nothing arrived in time.
    fn read_raw(&self, buffer: &mut [u8], wait: Duration) -> Result<usize, DriverError>;

    /// Write as much of `buffer` as the device accepts within `wait`.
    /// Returns 0 if nothing could be written in time.
    fn write_raw(&self, buffer: &[u8], wait: Duration) -> Result<usize, DriverError>;

    /// Bytes received and not yet read.
    fn query_input_depth(&self) -> Result<usize, DriverError>;

    fn modem_line(&self, line: ModemLine) -> Result<bool, DriverError>;

    fn set_modem_line(&self, line: ModemLine, state: bool) -> Result<(), DriverError>;

    /// Release the device. Calls blocked in `read_raw`/`write_raw` return
    /// [`DriverError::Closed`] or 0 within their `wait`. Idempotent.
    fn close(&self);
}
