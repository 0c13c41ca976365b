//! Utility functions for hardware testing.

use serialport::{SerialPortInfo, SerialPortType};
use std::env;
use std::time::Duration;
use uniserial::config::ConfigRequest;
use uniserial::port::{self, NativeConnection, Port};

/// Test port configuration from environment.
pub struct TestPortConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub loopback_enabled: bool,
}

impl TestPortConfig {
    /// Get test configuration from environment variables.
    pub fn from_env() -> Option<Self> {
        let port_name = env::var("TEST_PORT").ok()?;
        let baud_rate = env::var("TEST_BAUD")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(9600);
        let loopback_enabled = env::var("TEST_LOOPBACK").ok().as_deref() == Some("1");

        Some(TestPortConfig {
            port_name,
            baud_rate,
            loopback_enabled,
        })
    }

    /// A request for the test port with a one second timeout-only read.
    pub fn request(&self) -> ConfigRequest {
        ConfigRequest::new(self.port_name.clone())
            .with_baud_rate(self.baud_rate)
            .with_inter_character_timeout_ms(1000)
    }

    pub fn open(&self, request: &ConfigRequest) -> Port<NativeConnection> {
        port::open(request).unwrap_or_else(|e| panic!("Port open failed: {}", e))
    }
}

/// Skip test with a clear message if hardware is not available.
pub fn hardware() -> Option<TestPortConfig> {
    let config = TestPortConfig::from_env();
    if config.is_none() {
        println!("Skipping: TEST_PORT environment variable not set");
        println!("   Set TEST_PORT=COM3 (or /dev/ttyUSB0) to run hardware tests");
    }
    config
}

/// Like [`hardware`], but also requires TX wired to RX.
pub fn loopback() -> Option<TestPortConfig> {
    let config = hardware()?;
    if !config.loopback_enabled {
        println!("Skipping: TEST_LOOPBACK not set to 1");
        println!("   This test requires a loopback adapter (TX connected to RX)");
        return None;
    }
    Some(config)
}

/// Find USB serial ports (excludes Bluetooth and other types).
pub fn discover_usb_ports() -> Vec<SerialPortInfo> {
    port::available_ports()
        .unwrap_or_default()
        .into_iter()
        .filter(|port| matches!(port.port_type, SerialPortType::UsbPort(_)))
        .collect()
}

/// Assert that duration is within expected range.
pub fn assert_duration_within(
    actual: Duration,
    expected: Duration,
    tolerance: Duration,
    message: &str,
) {
    let lower = expected.saturating_sub(tolerance);
    let upper = expected + tolerance;

    assert!(
        actual >= lower && actual <= upper,
        "{}: expected {:?} ± {:?}, got {:?}",
        message,
        expected,
        tolerance,
        actual
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_usb_ports() {
        // Should not panic
        let usb_ports = discover_usb_ports();
        println!("Found {} USB ports", usb_ports.len());
    }

    #[test]
    fn test_assert_duration_within() {
        assert_duration_within(
            Duration::from_millis(100),
            Duration::from_millis(95),
            Duration::from_millis(10),
            "should be within tolerance",
        );
    }

    #[test]
    #[should_panic]
    fn test_assert_duration_out_of_range() {
        assert_duration_within(
            Duration::from_millis(200),
            Duration::from_millis(100),
            Duration::from_millis(10),
            "should panic",
        );
    }
}
