//! Baud rate classification.
//!
//! Some native APIs only accept rates from a fixed enumeration. A rate outside
//! [`STANDARD_BAUD_RATES`] is configured in two phases: a placeholder standard
//! rate goes in with the rest of the line settings, then a second
//! platform-specific call sets the exact rate.

use serde::{Deserialize, Serialize};

/// The fixed set of standard baud rates, ascending.
pub const STANDARD_BAUD_RATES: &[u32] = &[
    50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 7200, 9600, 14400, 19200,
    28800, 38400, 57600, 76800, 115200, 230400,
];

/// Standard rate applied in the first phase of a two-phase configuration.
pub const PLACEHOLDER_BAUD_RATE: u32 = 14_400;

/// Whether `rate` belongs to [`STANDARD_BAUD_RATES`]. Zero is non-standard.
pub fn is_standard(rate: u32) -> bool {
    STANDARD_BAUD_RATES.binary_search(&rate).is_ok()
}

/// How a driver must apply the baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BaudStrategy {
    /// The rate can be set together with the other line settings.
    Standard,
    /// Apply `placeholder` first, then the exact rate in a second call.
    TwoPhase { placeholder: u32 },
}

impl BaudStrategy {
    /// Pick the strategy for `rate`.
    pub fn for_rate(rate: u32) -> Self {
        if is_standard(rate) {
            BaudStrategy::Standard
        } else {
            BaudStrategy::TwoPhase {
                placeholder: PLACEHOLDER_BAUD_RATE,
            }
        }
    }

    pub fn is_two_phase(&self) -> bool {
        matches!(self, BaudStrategy::TwoPhase { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rates_are_sorted() {
        assert!(STANDARD_BAUD_RATES.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(STANDARD_BAUD_RATES.len(), 22);
    }

    #[test]
    fn test_every_standard_rate_is_standard() {
        for &rate in STANDARD_BAUD_RATES {
            assert!(is_standard(rate), "{} should be standard", rate);
        }
    }

    #[test]
    fn test_non_standard_rates() {
        for rate in [0, 123, 14401, 250_000, 460_800, 921_600, u32::MAX] {
            assert!(!is_standard(rate), "{} should not be standard", rate);
        }
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(BaudStrategy::for_rate(9600), BaudStrategy::Standard);
        assert_eq!(
            BaudStrategy::for_rate(3_000_000),
            BaudStrategy::TwoPhase { placeholder: 14_400 }
        );
        assert!(is_standard(PLACEHOLDER_BAUD_RATE));
    }
}
