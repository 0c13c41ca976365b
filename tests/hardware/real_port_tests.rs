//! Tests requiring actual serial hardware.
//!
//! # Running Hardware Tests
//!
//! ```bash
//! export TEST_PORT=/dev/ttyUSB0          # or COM3 on Windows
//! export TEST_BAUD=9600                  # optional, default: 9600
//! export TEST_LOOPBACK=1                 # if port has TX-RX loopback
//!
//! cargo test --all-features -- --ignored
//! ```

use super::utils::{assert_duration_within, hardware, loopback};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uniserial::port::PortError;

#[test]
#[ignore]
fn test_real_port_open_close() {
    let Some(config) = hardware() else { return };

    let port = config.open(&config.request());
    assert_eq!(port.name(), config.port_name);
    assert!(port.is_open());

    port.close();
    assert!(matches!(port.read(&mut [0u8; 1]), Err(PortError::PortClosed)));
}

#[test]
#[ignore]
fn test_real_port_nonstandard_baud() {
    let Some(config) = hardware() else { return };

    // Not every adapter accepts arbitrary rates; either outcome is reported
    let request = config.request().with_baud_rate(250_000);
    match uniserial::port::open(&request) {
        Ok(port) => println!("opened at {} baud", port.descriptor().baud_rate),
        Err(PortError::DeviceConfig(e)) => println!("adapter rejected 250000: {}", e),
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[test]
#[ignore]
fn test_real_port_timeout_only_read() {
    let Some(config) = hardware() else { return };
    let port = config.open(&config.request().with_inter_character_timeout_ms(500));

    let start = Instant::now();
    let n = port.read(&mut [0u8; 16]).unwrap();

    if n == 0 {
        assert_duration_within(
            start.elapsed(),
            Duration::from_millis(500),
            Duration::from_millis(300),
            "empty timeout-only read",
        );
    }
}

#[test]
#[ignore]
fn test_real_port_close_unblocks_read() {
    let Some(config) = hardware() else { return };
    let request = config
        .request()
        .with_inter_character_timeout_ms(0)
        .with_minimum_read_size(64);
    let port = Arc::new(config.open(&request));

    let closer = {
        let port = Arc::clone(&port);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            port.close();
        })
    };

    let result = port.read(&mut [0u8; 64]);
    closer.join().unwrap();
    assert!(matches!(result, Err(PortError::PortClosed)));
}

#[test]
#[ignore]
fn test_real_port_loopback_communication() {
    let Some(config) = loopback() else { return };
    let request = config
        .request()
        .with_inter_character_timeout_ms(500)
        .with_minimum_read_size(15);
    let port = config.open(&request);

    let test_data = b"LOOPBACK TEST\r\n";
    (&port).write_all(test_data).unwrap();

    let mut buffer = [0u8; 256];
    let read = port.read(&mut buffer).unwrap();

    assert_eq!(&buffer[..read], test_data, "Loopback data should match written data");
}

#[test]
#[ignore]
fn test_real_port_modem_lines() {
    let Some(config) = hardware() else { return };
    let port = config.open(&config.request());

    port.set_dtr(true).unwrap();
    port.set_rts(false).unwrap();
    println!("DTR={} RTS={}", port.dtr().unwrap(), port.rts().unwrap());
    println!("bytes waiting: {}", port.bytes_waiting().unwrap());
}
