//! In-memory device driver for testing.
//!
//! A [`MockDevice`] stands in for a piece of hardware. Tests keep a clone of
//! it to feed received bytes, inspect writes and applied configurations, and
//! inject failures, while a [`Port`](super::Port) talks to it through a
//! [`MockDriver`].

use super::error::DriverError;
use super::traits::{DeviceConnection, DeviceDriver, ModemLine};
use crate::config::NeutralConfigDescriptor;
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct DeviceState {
    /// Bytes waiting to be read.
    rx: VecDeque<u8>,
    /// One entry per accepted write.
    write_log: Vec<Vec<u8>>,
    applied: Vec<NeutralConfigDescriptor>,
    nonstandard_baud: Vec<u32>,
    lines: HashMap<ModemLine, bool>,
    /// Most bytes accepted by a single write.
    write_capacity: Option<usize>,
    stall_writes: bool,
    loopback: bool,
    fail_next_config: bool,
    fail_nonstandard_baud: bool,
    fail_next_read: Option<io::ErrorKind>,
    open: bool,
    open_count: usize,
    close_count: usize,
    active_reads: usize,
    max_concurrent_reads: usize,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<DeviceState>,
    changed: Condvar,
}

/// A simulated serial device.
///
/// Clones share the same device.
///
/// # Example
/// ```
/// use uniserial::port::{DeviceConnection, DeviceDriver, MockDevice, MockDriver};
/// use std::time::Duration;
///
/// let device = MockDevice::new("MOCK0");
/// let driver = MockDriver::new().with_device(device.clone());
/// let connection = driver.open("MOCK0").unwrap();
///
/// device.push_rx(b"hello");
/// let mut buffer = [0u8; 16];
/// let n = connection.read_raw(&mut buffer, Duration::from_millis(10)).unwrap();
/// assert_eq!(&buffer[..n], b"hello");
///
/// connection.write_raw(b"world", Duration::from_millis(10)).unwrap();
/// assert_eq!(device.written(), b"world");
/// ```
#[derive(Debug, Clone)]
pub struct MockDevice {
    name: String,
    shared: Arc<Shared>,
}

impl MockDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue bytes as if they had arrived on the wire.
    pub fn push_rx(&self, data: &[u8]) {
        self.shared.state.lock().rx.extend(data);
        self.shared.changed.notify_all();
    }

    /// Everything written so far, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.shared.state.lock().write_log.concat()
    }

    /// Each accepted write, in order.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().write_log.clone()
    }

    /// Every descriptor passed to `apply_config`, in order.
    pub fn applied_configs(&self) -> Vec<NeutralConfigDescriptor> {
        self.shared.state.lock().applied.clone()
    }

    /// Every rate passed to `apply_nonstandard_baud`, in order.
    pub fn nonstandard_baud_calls(&self) -> Vec<u32> {
        self.shared.state.lock().nonstandard_baud.clone()
    }

    /// Limit how many bytes a single write accepts.
    pub fn set_write_capacity(&self, capacity: Option<usize>) {
        self.shared.state.lock().write_capacity = capacity;
    }

    /// While set, writes accept nothing.
    pub fn set_stall_writes(&self, stall: bool) {
        self.shared.state.lock().stall_writes = stall;
        self.shared.changed.notify_all();
    }

    /// Echo written bytes back into the receive queue.
    pub fn set_loopback(&self, loopback: bool) {
        self.shared.state.lock().loopback = loopback;
    }

    /// Make the next `apply_config` fail.
    pub fn fail_next_config(&self) {
        self.shared.state.lock().fail_next_config = true;
    }

    /// Make every `apply_nonstandard_baud` fail.
    pub fn fail_nonstandard_baud(&self, fail: bool) {
        self.shared.state.lock().fail_nonstandard_baud = fail;
    }

    /// Make the next read fail with an I/O error of `kind`.
    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        self.shared.state.lock().fail_next_read = Some(kind);
        self.shared.changed.notify_all();
    }

    /// Set the state of an input line (CTS, DSR, RI, CD).
    pub fn set_input_line(&self, line: ModemLine, state: bool) {
        self.shared.state.lock().lines.insert(line, state);
    }

    /// Current state of any line as seen by the device.
    pub fn line(&self, line: ModemLine) -> bool {
        self.shared
            .state
            .lock()
            .lines
            .get(&line)
            .copied()
            .unwrap_or(false)
    }

    pub fn is_open(&self) -> bool {
        self.shared.state.lock().open
    }

    pub fn open_count(&self) -> usize {
        self.shared.state.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.shared.state.lock().close_count
    }

    /// The most reads that were ever inside the driver at once.
    pub fn max_concurrent_reads(&self) -> usize {
        self.shared.state.lock().max_concurrent_reads
    }

    /// Number of reads currently waiting inside the driver.
    pub fn active_reads(&self) -> usize {
        self.shared.state.lock().active_reads
    }
}

/// Opens [`MockDevice`]s by name.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    devices: Arc<Mutex<HashMap<String, MockDevice>>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, device: MockDevice) -> Self {
        self.add_device(device);
        self
    }

    pub fn add_device(&self, device: MockDevice) {
        self.devices.lock().insert(device.name.clone(), device);
    }

    pub fn device(&self, name: &str) -> Option<MockDevice> {
        self.devices.lock().get(name).cloned()
    }
}

impl DeviceDriver for MockDriver {
    type Connection = MockConnection;

    fn open(&self, port_name: &str) -> Result<MockConnection, DriverError> {
        let device = self
            .device(port_name)
            .ok_or_else(|| DriverError::not_found(port_name))?;

        {
            let mut state = device.shared.state.lock();
            if state.open {
                return Err(DriverError::Busy(port_name.to_string()));
            }
            state.open = true;
            state.open_count += 1;
        }

        Ok(MockConnection {
            device,
            closed: AtomicBool::new(false),
        })
    }
}

/// An open connection to a [`MockDevice`].
#[derive(Debug)]
pub struct MockConnection {
    device: MockDevice,
    closed: AtomicBool,
}

impl MockConnection {
    pub fn device(&self) -> &MockDevice {
        &self.device
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl DeviceConnection for MockConnection {
    fn apply_config(&self, descriptor: &NeutralConfigDescriptor) -> Result<(), DriverError> {
        let mut state = self.device.shared.state.lock();
        if std::mem::take(&mut state.fail_next_config) {
            return Err(DriverError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "mock device rejected configuration",
            )));
        }
        state.applied.push(descriptor.clone());
        Ok(())
    }

    fn apply_nonstandard_baud(&self, rate: u32) -> Result<(), DriverError> {
        let mut state = self.device.shared.state.lock();
        if state.fail_nonstandard_baud {
            return Err(DriverError::unsupported(format!("baud rate {}", rate)));
        }
        state.nonstandard_baud.push(rate);
        Ok(())
    }

    fn read_raw(&self, buffer: &mut [u8], wait: Duration) -> Result<usize, DriverError> {
        let shared = &self.device.shared;
        let deadline = Instant::now() + wait;

        let mut state = shared.state.lock();
        state.active_reads += 1;
        state.max_concurrent_reads = state.max_concurrent_reads.max(state.active_reads);

        let result = loop {
            if self.is_closed() {
                break Err(DriverError::Closed);
            }
            if let Some(kind) = state.fail_next_read.take() {
                break Err(DriverError::Io(io::Error::new(kind, "mock read failure")));
            }
            if !state.rx.is_empty() || buffer.is_empty() {
                let n = buffer.len().min(state.rx.len());
                for (slot, byte) in buffer.iter_mut().zip(state.rx.drain(..n)) {
                    *slot = byte;
                }
                break Ok(n);
            }
            if shared.changed.wait_until(&mut state, deadline).timed_out() {
                break Ok(0);
            }
        };

        state.active_reads -= 1;
        result
    }

    fn write_raw(&self, buffer: &[u8], wait: Duration) -> Result<usize, DriverError> {
        let shared = &self.device.shared;
        let deadline = Instant::now() + wait;

        let mut state = shared.state.lock();
        loop {
            if self.is_closed() {
                return Err(DriverError::Closed);
            }
            if !state.stall_writes {
                break;
            }
            if shared.changed.wait_until(&mut state, deadline).timed_out() {
                return Ok(0);
            }
        }

        let n = state
            .write_capacity
            .map_or(buffer.len(), |cap| cap.min(buffer.len()));
        if n > 0 {
            state.write_log.push(buffer[..n].to_vec());
            if state.loopback {
                state.rx.extend(&buffer[..n]);
                shared.changed.notify_all();
            }
        }
        Ok(n)
    }

    fn query_input_depth(&self) -> Result<usize, DriverError> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        Ok(self.device.shared.state.lock().rx.len())
    }

    fn modem_line(&self, line: ModemLine) -> Result<bool, DriverError> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        Ok(self.device.line(line))
    }

    fn set_modem_line(&self, line: ModemLine, state: bool) -> Result<(), DriverError> {
        if self.is_closed() {
            return Err(DriverError::Closed);
        }
        if !line.is_output() {
            return Err(DriverError::unsupported(format!("{} is an input line", line)));
        }
        self.device.shared.state.lock().lines.insert(line, state);
        Ok(())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let shared = &self.device.shared;
        {
            let mut state = shared.state.lock();
            state.open = false;
            state.close_count += 1;
        }
        shared.changed.notify_all();
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SHORT: Duration = Duration::from_millis(20);

    fn open(name: &str) -> (MockDevice, MockConnection) {
        let device = MockDevice::new(name);
        let driver = MockDriver::new().with_device(device.clone());
        let connection = driver.open(name).unwrap();
        (device, connection)
    }

    #[test]
    fn test_open_unknown_device() {
        let driver = MockDriver::new();
        assert!(matches!(
            driver.open("NOPE"),
            Err(DriverError::NotFound(name)) if name == "NOPE"
        ));
    }

    #[test]
    fn test_exclusive_open() {
        let device = MockDevice::new("MOCK0");
        let driver = MockDriver::new().with_device(device.clone());

        let first = driver.open("MOCK0").unwrap();
        assert!(matches!(driver.open("MOCK0"), Err(DriverError::Busy(_))));

        first.close();
        assert!(!device.is_open());
        assert!(driver.open("MOCK0").is_ok());
        assert_eq!(device.open_count(), 2);
    }

    #[test]
    fn test_read_times_out_empty() {
        let (_device, connection) = open("MOCK0");
        let mut buffer = [0u8; 4];

        let start = Instant::now();
        assert_eq!(connection.read_raw(&mut buffer, SHORT).unwrap(), 0);
        assert!(start.elapsed() >= SHORT);
    }

    #[test]
    fn test_read_is_partial() {
        let (device, connection) = open("MOCK0");
        device.push_rx(b"abcdef");

        let mut buffer = [0u8; 4];
        assert_eq!(connection.read_raw(&mut buffer, SHORT).unwrap(), 4);
        assert_eq!(&buffer, b"abcd");
        assert_eq!(connection.query_input_depth().unwrap(), 2);
    }

    #[test]
    fn test_read_wakes_on_push() {
        let (device, connection) = open("MOCK0");

        let feeder = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            device.push_rx(b"x");
        });

        let mut buffer = [0u8; 1];
        let n = connection
            .read_raw(&mut buffer, Duration::from_secs(5))
            .unwrap();
        assert_eq!(n, 1);
        feeder.join().unwrap();
    }

    #[test]
    fn test_close_wakes_reader() {
        let (_device, connection) = open("MOCK0");
        let connection = Arc::new(connection);

        let closer = {
            let connection = Arc::clone(&connection);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                connection.close();
            })
        };

        let mut buffer = [0u8; 1];
        let result = connection.read_raw(&mut buffer, Duration::from_secs(5));
        assert!(matches!(result, Err(DriverError::Closed)));
        closer.join().unwrap();
    }

    #[test]
    fn test_write_capacity_and_stall() {
        let (device, connection) = open("MOCK0");

        device.set_write_capacity(Some(2));
        assert_eq!(connection.write_raw(b"hello", SHORT).unwrap(), 2);
        assert_eq!(device.written(), b"he");

        device.set_stall_writes(true);
        assert_eq!(connection.write_raw(b"llo", SHORT).unwrap(), 0);
        assert_eq!(device.write_log().len(), 1);
    }

    #[test]
    fn test_loopback() {
        let (device, connection) = open("MOCK0");
        device.set_loopback(true);

        connection.write_raw(b"ping", SHORT).unwrap();
        let mut buffer = [0u8; 8];
        let n = connection.read_raw(&mut buffer, SHORT).unwrap();
        assert_eq!(&buffer[..n], b"ping");
    }

    #[test]
    fn test_injected_failures() {
        let (device, connection) = open("MOCK0");
        let descriptor = crate::config::translate(&crate::config::ConfigRequest::new("MOCK0")).unwrap();

        device.fail_next_config();
        assert!(connection.apply_config(&descriptor).is_err());
        assert!(connection.apply_config(&descriptor).is_ok());
        assert_eq!(device.applied_configs().len(), 1);

        device.fail_next_read(io::ErrorKind::BrokenPipe);
        let mut buffer = [0u8; 1];
        match connection.read_raw(&mut buffer, SHORT) {
            Err(DriverError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_modem_lines() {
        let (device, connection) = open("MOCK0");

        connection.set_modem_line(ModemLine::Dtr, true).unwrap();
        assert!(connection.modem_line(ModemLine::Dtr).unwrap());
        assert!(device.line(ModemLine::Dtr));

        device.set_input_line(ModemLine::Cts, true);
        assert!(connection.modem_line(ModemLine::Cts).unwrap());
        assert!(connection.set_modem_line(ModemLine::Cts, false).is_err());
    }

    #[test]
    fn test_drop_releases_device() {
        let (device, connection) = open("MOCK0");
        drop(connection);
        assert!(!device.is_open());
        assert_eq!(device.close_count(), 1);
    }
}
