//! Native device driver built on the `serialport` crate.
//!
//! `serialport` already covers POSIX termios, the Linux arbitrary-rate
//! extension, the macOS `IOSSIOSPEED` call and the Win32 DCB/COMMTIMEOUTS API.
//! This module adds what it does not expose: `CLOCAL`/`CREAD` and canonical
//! mode on Unix, RS-485 on Linux, and reading back DTR/RTS.

use super::error::DriverError;
use super::traits::{DeviceConnection, DeviceDriver, ModemLine};
use crate::config::{LineMode, NeutralConfigDescriptor};
use parking_lot::Mutex;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

#[cfg(unix)]
use std::os::unix::io::{AsRawFd, RawFd};

/// Opens operating-system serial devices.
///
/// # Example
/// ```no_run
/// use uniserial::config::ConfigRequest;
/// use uniserial::port::{Port, SerialportDriver};
///
/// let request = ConfigRequest::new("/dev/ttyUSB0").with_baud_rate(9600);
/// let port = Port::open(&SerialportDriver::new(), &request)?;
/// port.write(b"AT\r\n")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialportDriver;

impl SerialportDriver {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceDriver for SerialportDriver {
    type Connection = NativeConnection;

    fn open(&self, port_name: &str) -> Result<NativeConnection, DriverError> {
        let builder = serialport::new(port_name, 9600).timeout(Duration::ZERO);

        #[cfg(unix)]
        let control = {
            let tty = builder
                .open_native()
                .map_err(|e| open_error(port_name, e))?;
            let fd = tty.as_raw_fd();
            Control {
                port: Box::new(tty),
                fd,
            }
        };

        #[cfg(not(unix))]
        let control = Control {
            port: builder.open().map_err(|e| open_error(port_name, e))?,
        };

        let reader = control.port.try_clone()?;
        let writer = control.port.try_clone()?;
        debug!("opened native device {}", port_name);

        Ok(NativeConnection {
            name: port_name.to_string(),
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            control: Mutex::new(Some(control)),
            closed: AtomicBool::new(false),
            dtr: AtomicBool::new(false),
            rts: AtomicBool::new(false),
        })
    }
}

fn open_error(port_name: &str, err: serialport::Error) -> DriverError {
    match err.kind() {
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => DriverError::not_found(port_name),
        _ => DriverError::Serial(err),
    }
}

struct Control {
    port: Box<dyn SerialPort>,
    #[cfg(unix)]
    fd: RawFd,
}

/// An open operating-system serial device.
///
/// Reads, writes and control calls go through separate handles to the same
/// device so a blocked read never holds up a write.
pub struct NativeConnection {
    name: String,
    reader: Mutex<Option<Box<dyn SerialPort>>>,
    writer: Mutex<Option<Box<dyn SerialPort>>>,
    control: Mutex<Option<Control>>,
    closed: AtomicBool,
    // Last driven values, for platforms that cannot read them back.
    dtr: AtomicBool,
    rts: AtomicBool,
}

impl NativeConnection {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn with_control<T>(
        &self,
        f: impl FnOnce(&mut Control) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut guard = self.control.lock();
        let control = guard.as_mut().ok_or(DriverError::Closed)?;
        f(control)
    }
}

impl DeviceConnection for NativeConnection {
    fn apply_config(&self, descriptor: &NeutralConfigDescriptor) -> Result<(), DriverError> {
        self.with_control(|control| {
            let canonical = descriptor.line_mode == LineMode::Canonical;

            // Line flags first: the serialport setters below preserve them,
            // the reverse is not true for arbitrary rates on Linux.
            #[cfg(unix)]
            unix::apply_line_flags(control.fd, canonical)?;
            #[cfg(not(unix))]
            if canonical {
                warn!("{}: canonical mode is not available, using raw", self.name);
            }

            let port = &mut control.port;
            port.set_data_bits(descriptor.data_bits.into())?;
            port.set_parity(descriptor.parity.into())?;
            port.set_stop_bits(descriptor.stop_bits.into())?;
            port.set_flow_control(descriptor.flow_control.into())?;
            port.set_baud_rate(descriptor.initial_baud_rate())?;

            if descriptor.rs485.enabled {
                #[cfg(target_os = "linux")]
                rs485::apply(control.fd, &descriptor.rs485)?;
                #[cfg(not(target_os = "linux"))]
                return Err(DriverError::unsupported("RS-485 on this platform"));
            }

            debug!(
                "{}: applied {} baud, {:?} flow control, {:?} mode",
                self.name,
                descriptor.initial_baud_rate(),
                descriptor.flow_control,
                descriptor.line_mode
            );
            Ok(())
        })
    }

    fn apply_nonstandard_baud(&self, rate: u32) -> Result<(), DriverError> {
        self.with_control(|control| {
            control.port.set_baud_rate(rate)?;
            Ok(())
        })
    }

    // The reader and writer are clones of one device. On Windows they share a
    // single COMMTIMEOUTS, so a concurrent write_raw may replace this call's
    // wait with its own. Both waits are capped at POLL_SLICE, which bounds the
    // overshoot.
    fn read_raw(&self, buffer: &mut [u8], wait: Duration) -> Result<usize, DriverError> {
        let mut guard = self.reader.lock();
        let port = guard.as_mut().ok_or(DriverError::Closed)?;
        port.set_timeout(wait)?;
        match port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if is_timeout(&e) => Ok(0),
            Err(e) => Err(DriverError::Io(e)),
        }
    }

    fn write_raw(&self, buffer: &[u8], wait: Duration) -> Result<usize, DriverError> {
        let mut guard = self.writer.lock();
        let port = guard.as_mut().ok_or(DriverError::Closed)?;
        port.set_timeout(wait)?;
        match port.write(buffer) {
            Ok(n) => Ok(n),
            Err(e) if is_timeout(&e) => Ok(0),
            Err(e) => Err(DriverError::Io(e)),
        }
    }

    fn query_input_depth(&self) -> Result<usize, DriverError> {
        self.with_control(|control| Ok(control.port.bytes_to_read()? as usize))
    }

    fn modem_line(&self, line: ModemLine) -> Result<bool, DriverError> {
        self.with_control(|control| {
            let state = match line {
                #[cfg(unix)]
                ModemLine::Dtr => unix::modem_bits(control.fd)? & libc::TIOCM_DTR != 0,
                #[cfg(unix)]
                ModemLine::Rts => unix::modem_bits(control.fd)? & libc::TIOCM_RTS != 0,
                #[cfg(not(unix))]
                ModemLine::Dtr => self.dtr.load(Ordering::Acquire),
                #[cfg(not(unix))]
                ModemLine::Rts => self.rts.load(Ordering::Acquire),
                ModemLine::Cts => control.port.read_clear_to_send()?,
                ModemLine::Dsr => control.port.read_data_set_ready()?,
                ModemLine::Ri => control.port.read_ring_indicator()?,
                ModemLine::Cd => control.port.read_carrier_detect()?,
            };
            Ok(state)
        })
    }

    fn set_modem_line(&self, line: ModemLine, state: bool) -> Result<(), DriverError> {
        self.with_control(|control| {
            match line {
                ModemLine::Dtr => {
                    control.port.write_data_terminal_ready(state)?;
                    self.dtr.store(state, Ordering::Release);
                }
                ModemLine::Rts => {
                    control.port.write_request_to_send(state)?;
                    self.rts.store(state, Ordering::Release);
                }
                input => {
                    return Err(DriverError::unsupported(format!(
                        "{} is an input line",
                        input
                    )))
                }
            }
            Ok(())
        })
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // A blocked read or write gives its handle back within one wait slice.
        self.reader.lock().take();
        self.writer.lock().take();
        self.control.lock().take();
        debug!("released native device {}", self.name);
    }
}

impl Drop for NativeConnection {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for NativeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeConnection")
            .field("name", &self.name)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Serial ports the operating system reports.
pub fn available_ports() -> Result<Vec<serialport::SerialPortInfo>, DriverError> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        warn!("no serial ports found");
    }
    Ok(ports)
}

#[cfg(unix)]
mod unix {
    use std::io;
    use std::mem::MaybeUninit;
    use std::os::unix::io::RawFd;

    /// Assert `CLOCAL | CREAD` and set or clear `ICANON`.
    pub(super) fn apply_line_flags(fd: RawFd, canonical: bool) -> io::Result<()> {
        let mut termios = MaybeUninit::<libc::termios>::uninit();
        // SAFETY: fd is an open tty owned by the caller; tcgetattr fills the struct.
        if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: initialized by the successful tcgetattr above.
        let mut termios = unsafe { termios.assume_init() };

        termios.c_cflag |= libc::CLOCAL | libc::CREAD;
        if canonical {
            termios.c_lflag |= libc::ICANON;
        } else {
            termios.c_lflag &= !libc::ICANON;
        }

        // SAFETY: fd is open and termios is a valid settings struct.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Current modem control bits (`TIOCM_*`).
    pub(super) fn modem_bits(fd: RawFd) -> io::Result<libc::c_int> {
        let mut bits: libc::c_int = 0;
        // SAFETY: TIOCMGET writes one c_int through the pointer.
        if unsafe { libc::ioctl(fd, libc::TIOCMGET, &mut bits as *mut libc::c_int) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(bits)
    }
}

#[cfg(target_os = "linux")]
mod rs485 {
    use crate::config::Rs485Options;
    use std::io;
    use std::os::unix::io::RawFd;

    const SER_RS485_ENABLED: u32 = 1 << 0;
    const SER_RS485_RTS_ON_SEND: u32 = 1 << 1;
    const SER_RS485_RTS_AFTER_SEND: u32 = 1 << 2;
    const SER_RS485_RX_DURING_TX: u32 = 1 << 4;

    /// `struct serial_rs485` from `linux/serial.h`.
    #[repr(C)]
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub(super) struct SerialRs485 {
        pub flags: u32,
        pub delay_rts_before_send: u32,
        pub delay_rts_after_send: u32,
        padding: [u32; 5],
    }

    impl From<&Rs485Options> for SerialRs485 {
        fn from(options: &Rs485Options) -> Self {
            let mut flags = 0;
            if options.enabled {
                flags |= SER_RS485_ENABLED;
            }
            if options.rts_high_during_send {
                flags |= SER_RS485_RTS_ON_SEND;
            }
            if options.rts_high_after_send {
                flags |= SER_RS485_RTS_AFTER_SEND;
            }
            if options.rx_during_tx {
                flags |= SER_RS485_RX_DURING_TX;
            }
            Self {
                flags,
                delay_rts_before_send: options.delay_rts_before_send_ms,
                delay_rts_after_send: options.delay_rts_after_send_ms,
                padding: [0; 5],
            }
        }
    }

    pub(super) fn apply(fd: RawFd, options: &Rs485Options) -> io::Result<()> {
        let config = SerialRs485::from(options);
        // SAFETY: TIOCSRS485 reads one serial_rs485 through the pointer.
        if unsafe { libc::ioctl(fd, libc::TIOCSRS485, &config as *const SerialRs485) } < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

}
