//! The caller-facing configuration request.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default baud rate for a new request.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default inter-character timeout for a new request.
pub const DEFAULT_INTER_CHARACTER_TIMEOUT_MS: u32 = 100;

/// Everything needed to open and configure one serial port.
///
/// Data bits and stop bits are carried as raw numbers so that out-of-range
/// values coming from a CLI or settings file surface as typed
/// [`ConfigError`]s from [`translate`](super::translate) rather than as parse
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRequest {
    /// System path of the device, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port_name: String,

    /// Baud rate in bits per second.
    pub baud_rate: u32,

    /// Number of data bits per frame (5, 6, 7 or 8).
    pub data_bits: u8,

    /// Number of stop bits per frame (1 or 2).
    pub stop_bits: u8,

    /// Parity mode. Parity errors are not reported, bytes are delivered as received.
    pub parity: Parity,

    /// Enable RTS/CTS handshaking.
    pub hardware_flow_control: bool,

    /// Line-buffered (canonical) input instead of raw bytes.
    pub canonical: bool,

    /// Inter-character timeout in milliseconds, rounded to the nearest 100ms.
    pub inter_character_timeout_ms: u32,

    /// Minimum number of bytes a read blocks for.
    pub minimum_read_size: u32,

    /// RS-485 direction control.
    pub rs485: Rs485Options,
}

impl ConfigRequest {
    /// Create a request for `port_name` with 115200 8N1 and a 100ms timeout.
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            stop_bits: 1,
            parity: Parity::None,
            hardware_flow_control: false,
            canonical: false,
            inter_character_timeout_ms: DEFAULT_INTER_CHARACTER_TIMEOUT_MS,
            minimum_read_size: 0,
            rs485: Rs485Options::default(),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_data_bits(mut self, data_bits: u8) -> Self {
        self.data_bits = data_bits;
        self
    }

    pub fn with_stop_bits(mut self, stop_bits: u8) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    pub fn with_hardware_flow_control(mut self, enabled: bool) -> Self {
        self.hardware_flow_control = enabled;
        self
    }

    pub fn with_canonical(mut self, canonical: bool) -> Self {
        self.canonical = canonical;
        self
    }

    pub fn with_inter_character_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.inter_character_timeout_ms = timeout_ms;
        self
    }

    pub fn with_minimum_read_size(mut self, minimum_read_size: u32) -> Self {
        self.minimum_read_size = minimum_read_size;
        self
    }

    pub fn with_rs485(mut self, rs485: Rs485Options) -> Self {
        self.rs485 = rs485;
        self
    }
}

/// Parity checking modes.
///
/// Deserializes through [`FromStr`], so unknown modes fail with
/// [`ConfigError::InvalidParity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Parity::None => "none",
            Parity::Odd => "odd",
            Parity::Even => "even",
        };
        f.write_str(name)
    }
}

impl FromStr for Parity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            _ => Err(ConfigError::InvalidParity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Parity {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Numeric parity codes: 0 = none, 1 = odd, 2 = even.
impl TryFrom<u8> for Parity {
    type Error = ConfigError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Parity::None),
            1 => Ok(Parity::Odd),
            2 => Ok(Parity::Even),
            other => Err(ConfigError::InvalidParity(other.to_string())),
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

/// RS-485 half-duplex direction control via the RTS line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Rs485Options {
    /// Drive RTS for transmit direction.
    pub enabled: bool,
    /// RTS logic level high while sending.
    pub rts_high_during_send: bool,
    /// RTS logic level high after sending.
    pub rts_high_after_send: bool,
    /// Keep the receiver enabled while transmitting.
    pub rx_during_tx: bool,
    /// Delay between asserting RTS and the first transmitted bit.
    pub delay_rts_before_send_ms: u32,
    /// Delay between the last transmitted bit and releasing RTS.
    pub delay_rts_after_send_ms: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request() {
        let request = ConfigRequest::new("/dev/ttyS0");
        assert_eq!(request.baud_rate, 115_200);
        assert_eq!(request.data_bits, 8);
        assert_eq!(request.stop_bits, 1);
        assert_eq!(request.parity, Parity::None);
        assert_eq!(request.inter_character_timeout_ms, 100);
        assert_eq!(request.minimum_read_size, 0);
        assert!(!request.rs485.enabled);
    }

    #[test]
    fn test_parity_from_str() {
        assert_eq!("even".parse::<Parity>().unwrap(), Parity::Even);
        assert_eq!(" ODD ".parse::<Parity>().unwrap(), Parity::Odd);
        assert_eq!("n".parse::<Parity>().unwrap(), Parity::None);
        assert_eq!(
            "mark".parse::<Parity>(),
            Err(ConfigError::InvalidParity("mark".to_string()))
        );
    }

    #[test]
    fn test_parity_from_code() {
        assert_eq!(Parity::try_from(2).unwrap(), Parity::Even);
        assert!(matches!(
            Parity::try_from(3),
            Err(ConfigError::InvalidParity(_))
        ));
    }

    #[test]
    fn test_parity_deserialize_uses_from_str() {
        #[derive(Debug, Deserialize)]
        struct Line {
            parity: Parity,
        }

        let line: Line = toml::from_str(r#"parity = "E""#).unwrap();
        assert_eq!(line.parity, Parity::Even);

        let err = toml::from_str::<Line>(r#"parity = "mark""#).unwrap_err();
        assert!(err.to_string().contains("Invalid parity 'mark'"), "{}", err);
    }

    #[test]
    fn test_parity_conversion() {
        let native: serialport::Parity = Parity::Odd.into();
        assert_eq!(native, serialport::Parity::Odd);
    }

    #[test]
    fn test_request_deserializes_from_toml() {
        let request: ConfigRequest = toml::from_str(
            r#"
            port_name = "COM4"
            baud_rate = 9600
            data_bits = 7
            stop_bits = 2
            parity = "even"
            hardware_flow_control = true
            canonical = false
            inter_character_timeout_ms = 0
            minimum_read_size = 4

            [rs485]
            enabled = true
            delay_rts_before_send_ms = 2
            "#,
        )
        .unwrap();

        assert_eq!(request.parity, Parity::Even);
        assert_eq!(request.minimum_read_size, 4);
        assert!(request.rs485.enabled);
        assert!(!request.rs485.rts_high_after_send);
        assert_eq!(request.rs485.delay_rts_before_send_ms, 2);
    }
}
