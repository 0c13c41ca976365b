//! Walk through the blocking regimes against an in-memory device.
//!
//! ```bash
//! cargo run --example mock_port
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use uniserial::config::ConfigRequest;
use uniserial::port::{MockDevice, MockDriver, Port, PortError};

fn main() -> Result<(), PortError> {
    let device = MockDevice::new("MOCK0");
    let driver = MockDriver::new().with_device(device.clone());

    // Timeout only: an empty read returns 0 after the timeout
    let port = Port::open(
        &driver,
        &ConfigRequest::new("MOCK0").with_inter_character_timeout_ms(300),
    )?;
    let start = Instant::now();
    let n = port.read(&mut [0u8; 16])?;
    println!("timeout-only: {} bytes after {:?}", n, start.elapsed());
    port.close();

    // Minimum only: wait until 6 bytes have trickled in
    let port = Port::open(
        &driver,
        &ConfigRequest::new("MOCK0")
            .with_inter_character_timeout_ms(0)
            .with_minimum_read_size(6),
    )?;
    let feeder = {
        let device = device.clone();
        thread::spawn(move || {
            for chunk in [&b"ser"[..], b"ial"] {
                thread::sleep(Duration::from_millis(100));
                device.push_rx(chunk);
            }
        })
    };
    let mut buffer = [0u8; 16];
    let n = port.read(&mut buffer)?;
    println!(
        "minimum-only: {:?}",
        String::from_utf8_lossy(&buffer[..n])
    );
    let _ = feeder.join();
    port.close();

    // Non-standard rate and a close from another thread
    let port = Arc::new(Port::open(
        &driver,
        &ConfigRequest::new("MOCK0")
            .with_baud_rate(250_000)
            .with_inter_character_timeout_ms(0)
            .with_minimum_read_size(1),
    )?);
    println!(
        "two-phase baud: placeholder then {:?}",
        device.nonstandard_baud_calls()
    );
    let closer = {
        let port = Arc::clone(&port);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(200));
            port.close();
        })
    };
    match port.read(&mut buffer) {
        Err(PortError::PortClosed) => println!("blocked read ended by close"),
        other => println!("unexpected: {:?}", other),
    }
    let _ = closer.join();

    Ok(())
}
