//! Settings schema definitions.

use crate::config::{ConfigRequest, Parity, Rs485Options};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Defaults for opening ports
    pub serial: SerialSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Defaults applied to every port the binary opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
    pub hardware_flow_control: bool,
    pub canonical: bool,
    pub inter_character_timeout_ms: u32,
    pub minimum_read_size: u32,
    pub rs485: Rs485Options,
    /// Port aliases for convenience
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialSettings {
    fn default() -> Self {
        let request = ConfigRequest::new("");
        Self {
            baud_rate: request.baud_rate,
            data_bits: request.data_bits,
            stop_bits: request.stop_bits,
            parity: request.parity,
            hardware_flow_control: request.hardware_flow_control,
            canonical: request.canonical,
            inter_character_timeout_ms: request.inter_character_timeout_ms,
            minimum_read_size: request.minimum_read_size,
            rs485: request.rs485,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialSettings {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// A request for `port` (alias or path) carrying these defaults.
    pub fn request_for(&self, port: &str) -> ConfigRequest {
        ConfigRequest {
            port_name: self.resolve_port(port),
            baud_rate: self.baud_rate,
            data_bits: self.data_bits,
            stop_bits: self.stop_bits,
            parity: self.parity,
            hardware_flow_control: self.hardware_flow_control,
            canonical: self.canonical,
            inter_character_timeout_ms: self.inter_character_timeout_ms,
            minimum_read_size: self.minimum_read_size,
            rs485: self.rs485,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset, e.g. "info" or "uniserial=debug"
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
        })
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}
