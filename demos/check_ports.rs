//! Check available serial ports on the system.
//!
//! Lists every port with its properties and prints the environment needed
//! to point the hardware tests at one of them.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example check_ports
//! ```

use serialport::SerialPortType;
use uniserial::port::available_ports;

fn main() {
    println!("Serial Port Detection Utility");
    println!("{:=<70}", "");
    println!();

    let ports = match available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            println!("Error detecting serial ports: {}", e);
            println!();
            println!("Possible causes:");
            println!("  - Insufficient permissions");
            println!("  - Serial port drivers not installed");
            return;
        }
    };
    if ports.is_empty() {
        println!("No serial ports detected on this system");
        println!();
        println!("This could mean:");
        println!("  - No serial devices are connected");
        println!("  - USB-to-serial drivers are not installed");
        println!("  - Insufficient permissions to access serial ports");
        return;
    }

    println!("Found {} serial port(s):", ports.len());
    println!();

    for (idx, port) in ports.iter().enumerate() {
        println!("{}. {}", idx + 1, port.port_name);
        println!("{:-<70}", "");

        match &port.port_type {
            SerialPortType::UsbPort(usb_info) => {
                println!("   Type:         USB Serial Port");
                println!("   VID:          0x{:04X}", usb_info.vid);
                println!("   PID:          0x{:04X}", usb_info.pid);

                if let Some(ref manufacturer) = usb_info.manufacturer {
                    println!("   Manufacturer: {}", manufacturer);
                }
                if let Some(ref product) = usb_info.product {
                    println!("   Product:      {}", product);
                }
                if let Some(ref serial) = usb_info.serial_number {
                    println!("   Serial#:      {}", serial);
                }
            }
            SerialPortType::BluetoothPort => println!("   Type: Bluetooth Serial Port"),
            SerialPortType::PciPort => println!("   Type: PCI Serial Port"),
            SerialPortType::Unknown => println!("   Type: Unknown"),
        }

        println!();
    }

    println!("{:=<70}", "");
    println!("Hardware Testing Instructions:");
    println!("{:=<70}", "");
    println!();
    println!("  # Linux/macOS:");
    println!("  export TEST_PORT={}", ports[0].port_name);
    println!("  export TEST_BAUD=9600");
    println!("  export TEST_LOOPBACK=1   # only with TX wired to RX");
    println!("  cargo test --all-features -- --ignored");
    println!();
    println!("  # Windows:");
    println!("  set TEST_PORT={}", ports[0].port_name);
    println!("  set TEST_BAUD=9600");
    println!("  cargo test --all-features -- --ignored");
}
