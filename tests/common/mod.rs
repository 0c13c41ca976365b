//! Shared test utilities for uniserial tests.
//!
//! This module provides common test infrastructure including:
//! - Mock port creation with pre-loaded receive data
//! - Request builders for each blocking regime
//! - Timing assertions

#![allow(dead_code)]

use std::time::Duration;
use uniserial::config::ConfigRequest;
use uniserial::port::{MockConnection, MockDevice, MockDriver, Port};

pub const MOCK_PORT: &str = "MOCK0";

/// Slack allowed on top of an expected wait. Generous for loaded CI machines.
pub const SLACK: Duration = Duration::from_millis(400);

/// Open a mock port for `request`, returning the device behind it.
pub fn open_mock(request: &ConfigRequest) -> (MockDevice, Port<MockConnection>) {
    let device = MockDevice::new(request.port_name.clone());
    let driver = MockDriver::new().with_device(device.clone());
    let port = Port::open(&driver, request).expect("mock port should open");
    (device, port)
}

/// Open a mock port whose device already holds `rx`.
pub fn open_mock_with_rx(request: &ConfigRequest, rx: &[u8]) -> (MockDevice, Port<MockConnection>) {
    let (device, port) = open_mock(request);
    device.push_rx(rx);
    (device, port)
}

/// Return as soon as data arrives, or after `timeout_ms` with nothing.
pub fn timeout_only(timeout_ms: u32) -> ConfigRequest {
    ConfigRequest::new(MOCK_PORT).with_inter_character_timeout_ms(timeout_ms)
}

/// Block until `min` bytes, no timer.
pub fn minimum_only(min: u32) -> ConfigRequest {
    ConfigRequest::new(MOCK_PORT)
        .with_inter_character_timeout_ms(0)
        .with_minimum_read_size(min)
}

/// Block until `min` bytes or an inter-byte gap longer than `timeout_ms`.
pub fn both(timeout_ms: u32, min: u32) -> ConfigRequest {
    ConfigRequest::new(MOCK_PORT)
        .with_inter_character_timeout_ms(timeout_ms)
        .with_minimum_read_size(min)
}

/// Assert `elapsed` is at least `expected` and not much more.
pub fn assert_elapsed_near(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected.saturating_sub(Duration::from_millis(5)),
        "returned after {:?}, expected at least {:?}",
        elapsed,
        expected
    );
    assert!(
        elapsed <= expected + SLACK,
        "returned after {:?}, expected about {:?}",
        elapsed,
        expected
    );
}
