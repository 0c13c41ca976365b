//! Discrete field validation.
//!
//! Checks run in a fixed order and the first violation is reported. Timing
//! fields are left to [`TimeoutPolicy`](super::TimeoutPolicy).

use super::error::{ConfigError, ConfigResult};
use super::request::{ConfigRequest, Parity};
use super::translate::{DataBits, StopBits};

/// Validate the line settings of `request`.
pub fn validate(request: &ConfigRequest) -> ConfigResult<()> {
    data_bits(request.data_bits)?;
    stop_bits(request.stop_bits)?;
    parity(request.parity)?;
    baud_rate(request.baud_rate)?;
    Ok(())
}

pub fn data_bits(bits: u8) -> ConfigResult<DataBits> {
    match bits {
        5 => Ok(DataBits::Five),
        6 => Ok(DataBits::Six),
        7 => Ok(DataBits::Seven),
        8 => Ok(DataBits::Eight),
        other => Err(ConfigError::InvalidDataBits(other)),
    }
}

pub fn stop_bits(bits: u8) -> ConfigResult<StopBits> {
    match bits {
        1 => Ok(StopBits::One),
        2 => Ok(StopBits::Two),
        other => Err(ConfigError::InvalidStopBits(other)),
    }
}

/// Every [`Parity`] variant is legal; out-of-range modes are rejected where
/// they are parsed (`FromStr`, `TryFrom<u8>`).
pub fn parity(parity: Parity) -> ConfigResult<Parity> {
    Ok(parity)
}

/// Any positive rate is accepted here. Whether a non-standard rate works is
/// for the driver to decide.
pub fn baud_rate(rate: u32) -> ConfigResult<u32> {
    if rate == 0 {
        return Err(ConfigError::InvalidBaudRate(rate));
    }
    Ok(rate)
}
