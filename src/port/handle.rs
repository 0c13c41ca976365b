//! The live port handle.

use super::error::{DriverError, PortError};
use super::traits::{DeviceConnection, DeviceDriver, ModemLine};
use crate::config::{translate, BaudStrategy, ConfigRequest, NeutralConfigDescriptor, ReadStep};
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Longest single wait handed to a driver, for reads and writes alike. Bounds
/// how long a blocked call takes to notice a close or a new deadline, and how
/// far a read can overrun its timeout on drivers whose read and write
/// timeouts are one shared setting (Win32 `COMMTIMEOUTS`).
pub const POLL_SLICE: Duration = Duration::from_millis(50);

/// An open, configured serial port.
///
/// A `Port` only exists once its device has been opened and fully configured;
/// any failure along the way releases the device and returns an error
/// instead. Reads and writes are serialized per direction, so a `Port` can be
/// shared between a reader thread and a writer thread (e.g. behind an `Arc`).
///
/// # Example
/// ```
/// use uniserial::config::ConfigRequest;
/// use uniserial::port::{MockDevice, MockDriver, Port};
///
/// let device = MockDevice::new("MOCK0");
/// let driver = MockDriver::new().with_device(device.clone());
///
/// let request = ConfigRequest::new("MOCK0").with_minimum_read_size(3).with_inter_character_timeout_ms(0);
/// let port = Port::open(&driver, &request)?;
///
/// device.push_rx(b"abc");
/// let mut buffer = [0u8; 8];
/// assert_eq!(port.read(&mut buffer)?, 3);
/// # Ok::<(), uniserial::port::PortError>(())
/// ```
pub struct Port<C: DeviceConnection> {
    descriptor: NeutralConfigDescriptor,
    connection: C,
    read_lock: Mutex<()>,
    write_lock: Mutex<()>,
    read_deadline: Mutex<Option<Instant>>,
    write_deadline: Mutex<Option<Instant>>,
    closed: AtomicBool,
}

impl<C: DeviceConnection> Port<C> {
    /// Translate `request`, open the device through `driver` and apply the
    /// configuration.
    ///
    /// # Errors
    ///
    /// - `PortError::Config` if the request is invalid (no device is opened)
    /// - `PortError::Open` if the device cannot be opened
    /// - `PortError::DeviceConfig` if the device rejects the configuration
    pub fn open<D>(driver: &D, request: &ConfigRequest) -> Result<Self, PortError>
    where
        D: DeviceDriver<Connection = C>,
    {
        let descriptor = translate(request)?;
        debug!(
            port = %descriptor.port_name,
            baud = descriptor.baud_rate,
            strategy = ?descriptor.baud_strategy,
            regime = ?descriptor.regime,
            "translated configuration"
        );

        let connection = driver
            .open(&descriptor.port_name)
            .map_err(|e| PortError::open(&descriptor.port_name, e))?;

        if let Err(e) = configure(&connection, &descriptor) {
            warn!(port = %descriptor.port_name, error = %e, "device rejected configuration");
            connection.close();
            return Err(PortError::DeviceConfig(e));
        }

        info!(
            "opened {} at {} baud ({}{}{})",
            descriptor.port_name,
            descriptor.baud_rate,
            descriptor.data_bits.bits(),
            parity_letter(&descriptor),
            match descriptor.stop_bits {
                crate::config::StopBits::One => 1,
                crate::config::StopBits::Two => 2,
            }
        );

        Ok(Self {
            descriptor,
            connection,
            read_lock: Mutex::new(()),
            write_lock: Mutex::new(()),
            read_deadline: Mutex::new(None),
            write_deadline: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.port_name
    }

    /// The configuration this port was opened with.
    pub fn descriptor(&self) -> &NeutralConfigDescriptor {
        &self.descriptor
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Read into `buffer` under the port's blocking regime.
    ///
    /// Returns the number of bytes read. Zero is a normal result when a
    /// timeout-only read sees no data.
    ///
    /// # Errors
    ///
    /// - `PortError::Timeout` if the read deadline passes before any byte arrives
    /// - `PortError::PortClosed` if the port is or becomes closed
    /// - `PortError::Io` if the driver fails
    pub fn read(&self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.ensure_open()?;
        let _guard = self.read_lock.lock();

        let mut schedule = self.descriptor.read_schedule(buffer.len(), Instant::now());
        loop {
            self.ensure_open()?;

            let now = Instant::now();
            let limit = match schedule.next_step(now) {
                ReadStep::Complete => return Ok(schedule.filled()),
                ReadStep::Wait(limit) => limit,
            };

            let deadline = *self.read_deadline.lock();
            let Some(wait) = bounded_wait(limit, deadline, now) else {
                return match schedule.filled() {
                    0 => Err(PortError::Timeout),
                    n => Ok(n),
                };
            };

            let filled = schedule.filled();
            match self.connection.read_raw(&mut buffer[filled..], wait) {
                Ok(n) => schedule.record(n, Instant::now()),
                Err(e) => return Err(self.io_error(e)),
            }
        }
    }

    /// Write from `buffer`, blocking until the device accepts at least one
    /// byte. The count may be short; retrying the rest is up to the caller.
    ///
    /// # Errors
    ///
    /// - `PortError::Timeout` if the write deadline passes first
    /// - `PortError::PortClosed` if the port is or becomes closed
    /// - `PortError::Io` if the driver fails
    pub fn write(&self, buffer: &[u8]) -> Result<usize, PortError> {
        self.ensure_open()?;
        let _guard = self.write_lock.lock();

        if buffer.is_empty() {
            return Ok(0);
        }

        loop {
            self.ensure_open()?;

            let deadline = *self.write_deadline.lock();
            let wait = bounded_wait(None, deadline, Instant::now()).ok_or(PortError::Timeout)?;

            match self.connection.write_raw(buffer, wait) {
                Ok(0) => continue,
                Ok(n) => {
                    if n < buffer.len() {
                        trace!("short write on {}: {} of {} bytes", self.name(), n, buffer.len());
                    }
                    return Ok(n);
                }
                Err(e) => return Err(self.io_error(e)),
            }
        }
    }

    /// Bytes received and waiting to be read. Does not consume them.
    pub fn bytes_waiting(&self) -> Result<usize, PortError> {
        self.ensure_open()?;
        self.connection
            .query_input_depth()
            .map_err(|e| self.io_error(e))
    }

    /// Reads that are blocked, or start, after `deadline` fail with
    /// `PortError::Timeout`. `None` removes the deadline.
    pub fn set_read_deadline(&self, deadline: Option<Instant>) {
        *self.read_deadline.lock() = deadline;
    }

    /// Like [`set_read_deadline`](Self::set_read_deadline), for writes.
    pub fn set_write_deadline(&self, deadline: Option<Instant>) {
        *self.write_deadline.lock() = deadline;
    }

    /// Set both deadlines at once.
    pub fn set_deadline(&self, deadline: Option<Instant>) {
        self.set_read_deadline(deadline);
        self.set_write_deadline(deadline);
    }

    pub fn read_deadline(&self) -> Option<Instant> {
        *self.read_deadline.lock()
    }

    pub fn write_deadline(&self) -> Option<Instant> {
        *self.write_deadline.lock()
    }

    /// State of the Data Terminal Ready line.
    pub fn dtr(&self) -> Result<bool, PortError> {
        self.modem_line(ModemLine::Dtr)
    }

    pub fn set_dtr(&self, state: bool) -> Result<(), PortError> {
        self.set_modem_line(ModemLine::Dtr, state)
    }

    pub fn rts(&self) -> Result<bool, PortError> {
        self.modem_line(ModemLine::Rts)
    }

    pub fn set_rts(&self, state: bool) -> Result<(), PortError> {
        self.set_modem_line(ModemLine::Rts, state)
    }

    pub fn modem_line(&self, line: ModemLine) -> Result<bool, PortError> {
        self.ensure_open()?;
        self.connection
            .modem_line(line)
            .map_err(|e| self.io_error(e))
    }

    /// Drive an output line. Input lines (CTS, DSR, RI, CD) are rejected.
    pub fn set_modem_line(&self, line: ModemLine, state: bool) -> Result<(), PortError> {
        self.ensure_open()?;
        if !line.is_output() {
            return Err(PortError::Io(DriverError::unsupported(format!(
                "{} is an input line",
                line
            ))));
        }
        self.connection
            .set_modem_line(line, state)
            .map_err(|e| self.io_error(e))
    }

    /// Release the device. Safe to call more than once and while other
    /// threads are blocked in [`read`](Self::read) or [`write`](Self::write);
    /// those calls fail with `PortError::PortClosed`.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.connection.close();
        info!("closed {}", self.name());
    }

    fn ensure_open(&self) -> Result<(), PortError> {
        if self.closed.load(Ordering::Acquire) {
            Err(PortError::PortClosed)
        } else {
            Ok(())
        }
    }

    fn io_error(&self, err: DriverError) -> PortError {
        if self.closed.load(Ordering::Acquire) || matches!(err, DriverError::Closed) {
            PortError::PortClosed
        } else {
            PortError::Io(err)
        }
    }
}

fn configure<C: DeviceConnection>(
    connection: &C,
    descriptor: &NeutralConfigDescriptor,
) -> Result<(), DriverError> {
    connection.apply_config(descriptor)?;
    if let BaudStrategy::TwoPhase { placeholder } = descriptor.baud_strategy {
        debug!(
            "{}: placeholder {} applied, setting non-standard rate {}",
            descriptor.port_name, placeholder, descriptor.baud_rate
        );
        connection.apply_nonstandard_baud(descriptor.baud_rate)?;
    }
    Ok(())
}

/// Clamp a schedule wait to the poll slice and the deadline. `None` if the
/// deadline has already passed.
fn bounded_wait(
    limit: Option<Duration>,
    deadline: Option<Instant>,
    now: Instant,
) -> Option<Duration> {
    let mut wait = limit.map_or(POLL_SLICE, |l| l.min(POLL_SLICE));
    if let Some(deadline) = deadline {
        let left = deadline.checked_duration_since(now).filter(|d| !d.is_zero())?;
        wait = wait.min(left);
    }
    Some(wait)
}

fn parity_letter(descriptor: &NeutralConfigDescriptor) -> char {
    match descriptor.parity {
        crate::config::Parity::None => 'N',
        crate::config::Parity::Odd => 'O',
        crate::config::Parity::Even => 'E',
    }
}

impl<C: DeviceConnection> Drop for Port<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: DeviceConnection> fmt::Debug for Port<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.descriptor.port_name)
            .field("baud_rate", &self.descriptor.baud_rate)
            .field("open", &self.is_open())
            .finish()
    }
}

impl<C: DeviceConnection> io::Read for &Port<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Port::read(self, buf).map_err(io::Error::from)
    }
}

impl<C: DeviceConnection> io::Write for &Port<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Port::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
