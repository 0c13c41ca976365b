//! Read-timeout policy.
//!
//! A read is governed by two user-facing knobs, an inter-character timeout and
//! a minimum read size, which map onto the termios `VTIME`/`VMIN` pair. Their
//! combination selects one of four [`BlockingRegime`]s:
//!
//! | timeout | minimum | regime        | a read returns when                                  |
//! |---------|---------|---------------|------------------------------------------------------|
//! | 0       | 0       | `NeitherSet`  | rejected                                             |
//! | > 0     | 0       | `TimeoutOnly` | any data is queued, or `vtime` elapses from the call |
//! | > 0     | > 0     | `Both`        | `minimum` bytes arrived, or an inter-byte gap > `vtime` |
//! | 0       | > 0     | `MinimumOnly` | `minimum` bytes arrived                              |
//!
//! In `Both`, the inter-byte timer starts with the first byte of the call.
//!
//! [`ReadSchedule`] replays these rules against a clock so that a port can
//! realize them over any driver that offers bounded waits, and
//! [`EventTimeouts`] projects them onto a Win32-style total/interval model.

use super::error::TimingError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Granularity of the timeout encoding.
pub const VTIME_UNIT_MS: u64 = 100;

/// Largest timeout representable in one byte of tenths.
pub const MAX_VTIME_MS: u64 = 25_500;

/// `MAXDWORD` in the event-model timeout fields.
pub const MAXDWORD: u32 = u32::MAX;

/// Round to the nearest integer with ties going toward positive infinity.
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Encoded blocking parameters, ready for a termios-like driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimingParameters {
    /// Minimum bytes per read (`VMIN`).
    pub vmin: u8,
    /// Timeout in tenths of a second (`VTIME`).
    pub vtime_tenths: u8,
}

impl TimingParameters {
    pub fn vtime_ms(&self) -> u64 {
        u64::from(self.vtime_tenths) * VTIME_UNIT_MS
    }

    pub fn vtime(&self) -> Duration {
        Duration::from_millis(self.vtime_ms())
    }

    /// Project onto total/interval read timeouts.
    ///
    /// - `vmin == 0`: return queued data at once, else wait up to `vtime` for
    ///   the first byte and return as soon as it arrives.
    /// - `vmin > 0, vtime > 0`: wait indefinitely for the first byte, then stop
    ///   on an inter-byte gap longer than `vtime`.
    /// - `vmin > 0, vtime == 0`: wait until the request, sized to `vmin`, fills.
    pub fn event_timeouts(&self) -> EventTimeouts {
        let vtime_ms = u32::from(self.vtime_tenths) * VTIME_UNIT_MS as u32;
        match (self.vmin, self.vtime_tenths) {
            (0, _) => EventTimeouts {
                read_interval_ms: MAXDWORD,
                read_total_multiplier_ms: MAXDWORD,
                read_total_constant_ms: vtime_ms,
            },
            (_, 0) => EventTimeouts::default(),
            _ => EventTimeouts {
                read_interval_ms: vtime_ms,
                read_total_multiplier_ms: 0,
                read_total_constant_ms: 0,
            },
        }
    }
}

/// Read timeouts in the shape of Win32 `COMMTIMEOUTS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventTimeouts {
    pub read_interval_ms: u32,
    pub read_total_multiplier_ms: u32,
    pub read_total_constant_ms: u32,
}

/// How a read call blocks, classified from the raw timeout and minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingRegime {
    NeitherSet,
    TimeoutOnly,
    Both,
    MinimumOnly,
}

impl BlockingRegime {
    pub fn classify(inter_character_timeout_ms: u32, minimum_read_size: u32) -> Self {
        match (inter_character_timeout_ms > 0, minimum_read_size > 0) {
            (false, false) => BlockingRegime::NeitherSet,
            (true, false) => BlockingRegime::TimeoutOnly,
            (true, true) => BlockingRegime::Both,
            (false, true) => BlockingRegime::MinimumOnly,
        }
    }
}

/// Derives [`TimingParameters`] from the two timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    pub inter_character_timeout_ms: u32,
    pub minimum_read_size: u32,
}

impl TimeoutPolicy {
    pub fn new(inter_character_timeout_ms: u32, minimum_read_size: u32) -> Self {
        Self {
            inter_character_timeout_ms,
            minimum_read_size,
        }
    }

    pub fn regime(&self) -> BlockingRegime {
        BlockingRegime::classify(self.inter_character_timeout_ms, self.minimum_read_size)
    }

    /// The timeout rounded to the nearest 100ms.
    pub fn vtime_ms(&self) -> u64 {
        let units = round_half_up(f64::from(self.inter_character_timeout_ms) / VTIME_UNIT_MS as f64);
        units as u64 * VTIME_UNIT_MS
    }

    pub fn evaluate(&self) -> Result<TimingParameters, TimingError> {
        let vtime_ms = self.vtime_ms();

        if self.minimum_read_size == 0 && vtime_ms < VTIME_UNIT_MS {
            return Err(TimingError::NothingToWaitFor {
                timeout_ms: self.inter_character_timeout_ms,
            });
        }

        if vtime_ms > MAX_VTIME_MS {
            return Err(TimingError::TimeoutTooLarge {
                timeout_ms: self.inter_character_timeout_ms,
            });
        }

        let vmin = u8::try_from(self.minimum_read_size)
            .map_err(|_| TimingError::MinimumReadSizeOutOfRange(self.minimum_read_size))?;

        Ok(TimingParameters {
            vmin,
            vtime_tenths: (vtime_ms / VTIME_UNIT_MS) as u8,
        })
    }
}

/// What a reader should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStep {
    /// Return the bytes gathered so far.
    Complete,
    /// Wait for more data, at most this long (`None` = no limit).
    Wait(Option<Duration>),
}

/// Progress of one read call under a set of [`TimingParameters`].
///
/// Time is passed in explicitly, which keeps the schedule a pure state
/// machine. A `vtime` of zero means "no timer", matching termios.
#[derive(Debug, Clone)]
pub struct ReadSchedule {
    timing: TimingParameters,
    capacity: usize,
    started: Instant,
    filled: usize,
    last_byte: Option<Instant>,
}

impl ReadSchedule {
    pub fn new(timing: TimingParameters, capacity: usize, now: Instant) -> Self {
        Self {
            timing,
            capacity,
            started: now,
            filled: 0,
            last_byte: None,
        }
    }

    /// Account for `n` bytes received at `now`.
    pub fn record(&mut self, n: usize, now: Instant) {
        if n > 0 {
            self.filled = (self.filled + n).min(self.capacity);
            self.last_byte = Some(now);
        }
    }

    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Bytes still to be gathered before the read can complete on count alone.
    pub fn target(&self) -> usize {
        if self.timing.vmin == 0 {
            1.min(self.capacity)
        } else {
            usize::from(self.timing.vmin).min(self.capacity)
        }
    }

    pub fn next_step(&self, now: Instant) -> ReadStep {
        if self.capacity == 0 || self.filled >= self.target() {
            return ReadStep::Complete;
        }

        let vtime = self.timing.vtime();

        if self.timing.vmin == 0 {
            let elapsed = now.saturating_duration_since(self.started);
            return match vtime.checked_sub(elapsed) {
                Some(left) if !left.is_zero() => ReadStep::Wait(Some(left)),
                _ => ReadStep::Complete,
            };
        }

        match self.last_byte {
            Some(last) if !vtime.is_zero() => {
                let gap = now.saturating_duration_since(last);
                match vtime.checked_sub(gap) {
                    Some(left) if !left.is_zero() => ReadStep::Wait(Some(left)),
                    _ => ReadStep::Complete,
                }
            }
            _ => ReadStep::Wait(None),
        }
    }
}
