//! Composition of validation, baud classification and timeout policy into a
//! single platform-neutral descriptor.

use super::baud::BaudStrategy;
use super::error::ConfigResult;
use super::request::{ConfigRequest, Parity, Rs485Options};
use super::timing::{BlockingRegime, ReadSchedule, TimeoutPolicy, TimingParameters};
use super::validate;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    pub fn bits(&self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

/// Flow control modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Input processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    Raw,
    Canonical,
}

/// A validated configuration, ready for a device driver to apply.
///
/// Produced by [`translate`]. Drivers read it and never modify it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeutralConfigDescriptor {
    pub port_name: String,
    pub baud_rate: u32,
    pub baud_strategy: BaudStrategy,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
    pub line_mode: LineMode,
    pub timing: TimingParameters,
    pub regime: BlockingRegime,
    /// Modem status lines never hang up the port (`CLOCAL`). Always set.
    pub ignore_modem_status: bool,
    /// The receiver is enabled (`CREAD`). Always set.
    pub enable_receiver: bool,
    pub rs485: Rs485Options,
}

impl NeutralConfigDescriptor {
    /// The rate a driver applies alongside the other line settings: the
    /// placeholder under the two-phase strategy, else the requested rate.
    pub fn initial_baud_rate(&self) -> u32 {
        match self.baud_strategy {
            BaudStrategy::Standard => self.baud_rate,
            BaudStrategy::TwoPhase { placeholder } => placeholder,
        }
    }

    /// Start tracking one read of `capacity` bytes.
    pub fn read_schedule(&self, capacity: usize, now: Instant) -> ReadSchedule {
        ReadSchedule::new(self.timing, capacity, now)
    }
}

/// Runs the translation pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigTranslator;

impl ConfigTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `request` and derive its descriptor.
    ///
    /// # Errors
    ///
    /// The first [`ConfigError`](super::ConfigError) found, in the order
    /// data bits, stop bits, parity, baud rate, timing.
    pub fn translate(&self, request: &ConfigRequest) -> ConfigResult<NeutralConfigDescriptor> {
        validate::validate(request)?;
        let data_bits = validate::data_bits(request.data_bits)?;
        let stop_bits = validate::stop_bits(request.stop_bits)?;

        let baud_strategy = BaudStrategy::for_rate(request.baud_rate);

        let policy = TimeoutPolicy::new(
            request.inter_character_timeout_ms,
            request.minimum_read_size,
        );
        let timing = policy.evaluate()?;

        Ok(NeutralConfigDescriptor {
            port_name: request.port_name.clone(),
            baud_rate: request.baud_rate,
            baud_strategy,
            data_bits,
            stop_bits,
            parity: request.parity,
            flow_control: if request.hardware_flow_control {
                FlowControl::Hardware
            } else {
                FlowControl::None
            },
            line_mode: if request.canonical {
                LineMode::Canonical
            } else {
                LineMode::Raw
            },
            timing,
            regime: policy.regime(),
            ignore_modem_status: true,
            enable_receiver: true,
            rs485: request.rs485,
        })
    }
}

/// Shorthand for [`ConfigTranslator::translate`].
pub fn translate(request: &ConfigRequest) -> ConfigResult<NeutralConfigDescriptor> {
    ConfigTranslator::new().translate(request)
}
