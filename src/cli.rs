//! Command-line front end: open a port, optionally send a hex payload and
//! print what comes back.

use crate::config::{translate, ConfigRequest, Parity};
use crate::error::AppError;
use crate::port::{self, DeviceConnection, Port, PortError};
use crate::settings::{SerialSettings, Settings, SettingsLoader};
use clap::Parser;
use serialport::SerialPortType;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Size of each receive buffer in `--rx` mode.
const RX_CHUNK: usize = 32;

// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(
    name = "uniserial",
    version,
    about = "Open and configure a serial port, send a payload, watch the line.",
    long_about = "Opens a serial port with the given line settings and timing policy. \
Defaults for every setting come from uniserial.toml (see --config) and can be overridden here."
)]
pub struct Args {
    /// Serial port to use (/dev/ttyUSB0, COM3, or an alias from the settings file)
    #[arg(short, long, required_unless_present = "list")]
    pub port: Option<String>,

    /// Baud rate [default: 115200]
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Data bits, 5 to 8 [default: 8]
    #[arg(long)]
    pub databits: Option<u8>,

    /// Stop bits, 1 or 2 [default: 1]
    #[arg(long)]
    pub stopbits: Option<u8>,

    /// Enable even parity
    #[arg(long, conflicts_with = "odd")]
    pub even: bool,

    /// Enable odd parity
    #[arg(long)]
    pub odd: bool,

    /// Enable RTS/CTS hardware flow control
    #[arg(long)]
    pub rtscts: bool,

    /// Line-oriented (canonical) input
    #[arg(long)]
    pub canonical: bool,

    /// Enable RS-485 RTS direction control
    #[arg(long)]
    pub rs485: bool,

    /// RTS high while sending (RS-485)
    #[arg(long)]
    pub rs485_high_during_send: bool,

    /// RTS high after sending (RS-485)
    #[arg(long)]
    pub rs485_high_after_send: bool,

    /// Keep receiving while sending (RS-485)
    #[arg(long)]
    pub rs485_rx_during_tx: bool,

    /// Delay between raising RTS and sending, in ms (RS-485)
    #[arg(long)]
    pub rs485_delay_before_ms: Option<u32>,

    /// Delay between the end of sending and dropping RTS, in ms (RS-485)
    #[arg(long)]
    pub rs485_delay_after_ms: Option<u32>,

    /// Inter-character timeout in ms [default: 100]
    #[arg(long)]
    pub chartimeout: Option<u32>,

    /// Minimum read count [default: 0]
    #[arg(long)]
    pub minread: Option<u32>,

    /// Data to send, in hex (01ab238b)
    #[arg(long)]
    pub txdata: Option<String>,

    /// Print received data until interrupted
    #[arg(long)]
    pub rx: bool,

    /// Print the resolved device configuration as JSON and exit without opening the port
    #[arg(long)]
    pub describe: bool,

    /// List the serial ports on this system and exit
    #[arg(long)]
    pub list: bool,

    /// Settings file to use instead of the standard locations
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the request: settings defaults first, then flags.
    pub fn to_request(&self, serial: &SerialSettings) -> Result<ConfigRequest, AppError> {
        let port = self
            .port
            .as_deref()
            .ok_or_else(|| AppError::Usage("Must specify --port".to_string()))?;

        let mut request = serial.request_for(port);

        if let Some(baud) = self.baud {
            request.baud_rate = baud;
        }
        if let Some(bits) = self.databits {
            request.data_bits = bits;
        }
        if let Some(bits) = self.stopbits {
            request.stop_bits = bits;
        }
        if self.even {
            request.parity = Parity::Even;
        } else if self.odd {
            request.parity = Parity::Odd;
        }
        if self.rtscts {
            request.hardware_flow_control = true;
        }
        if self.canonical {
            request.canonical = true;
        }
        if let Some(timeout) = self.chartimeout {
            request.inter_character_timeout_ms = timeout;
        }
        if let Some(min) = self.minread {
            request.minimum_read_size = min;
        }

        let rs485 = &mut request.rs485;
        rs485.enabled |= self.rs485;
        rs485.rts_high_during_send |= self.rs485_high_during_send;
        rs485.rts_high_after_send |= self.rs485_high_after_send;
        rs485.rx_during_tx |= self.rs485_rx_during_tx;
        if let Some(delay) = self.rs485_delay_before_ms {
            rs485.delay_rts_before_send_ms = delay;
        }
        if let Some(delay) = self.rs485_delay_after_ms {
            rs485.delay_rts_after_send_ms = delay;
        }

        Ok(request)
    }

    /// Load settings from `--config` if given, else the standard locations.
    pub fn load_settings(&self) -> Result<Settings, AppError> {
        let loader = match self.config {
            Some(ref path) => SettingsLoader::load_from(path)?,
            None => SettingsLoader::load()?,
        };
        let mut settings = loader.into_settings();
        if self.verbose {
            settings.logging.level = "debug".to_string();
        }
        Ok(settings)
    }
}

/// Run the command described by `args` against `settings`.
pub fn run(args: &Args, settings: &Settings) -> Result<(), AppError> {
    if args.list {
        return list_ports();
    }

    let request = args.to_request(&settings.serial)?;

    if args.describe {
        let descriptor = translate(&request)?;
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    let payload = args.txdata.as_deref().map(decode_hex).transpose()?;

    let port = port::open(&request)?;
    exercise(&port, payload.as_deref(), args.rx)
}

/// Send `payload` (if any) then, with `rx`, print received chunks until the
/// port closes.
pub fn exercise<C: DeviceConnection>(
    port: &Port<C>,
    payload: Option<&[u8]>,
    rx: bool,
) -> Result<(), AppError> {
    if let Some(payload) = payload {
        println!("Sending: {}", encode_hex(payload));
        let mut sent = 0;
        while sent < payload.len() {
            sent += port.write(&payload[sent..])?;
        }
        println!("Wrote {} bytes", sent);
    }

    if rx {
        info!("receiving on {}", port.name());
        let mut buffer = [0u8; RX_CHUNK];
        loop {
            match port.read(&mut buffer) {
                Ok(0) => continue,
                Ok(n) => {
                    println!("Rx: {}", encode_hex(&buffer[..n]));
                    std::io::stdout().flush()?;
                }
                Err(PortError::Timeout) => continue,
                Err(PortError::PortClosed) => {
                    debug!("port closed, leaving receive loop");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

fn list_ports() -> Result<(), AppError> {
    let ports = port::available_ports()?;
    if ports.is_empty() {
        println!("No serial ports detected on this system");
        return Ok(());
    }

    for info in ports {
        match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let product = usb.product.unwrap_or_default();
                println!(
                    "{}\tUSB 0x{:04X}:0x{:04X} {}",
                    info.port_name, usb.vid, usb.pid, product
                );
            }
            SerialPortType::PciPort => println!("{}\tPCI", info.port_name),
            SerialPortType::BluetoothPort => println!("{}\tBluetooth", info.port_name),
            SerialPortType::Unknown => println!("{}\tUnknown", info.port_name),
        }
    }
    Ok(())
}

/// Decode a hex string such as `01ab238b`.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, AppError> {
    let text = text.trim();
    if text.len() % 2 != 0 {
        return Err(AppError::InvalidPayload(format!(
            "odd number of hex digits ({})",
            text.len()
        )));
    }

    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let high = hex_digit(pair[0])?;
            let low = hex_digit(pair[1])?;
            Ok((high << 4) | low)
        })
        .collect()
}

fn hex_digit(c: u8) -> Result<u8, AppError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => {
            warn!("rejecting payload with byte 0x{:02x}", c);
            Err(AppError::InvalidPayload(format!(
                "invalid hex digit '{}'",
                c as char
            )))
        }
    }
}

/// Lowercase hex, two digits per byte.
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
