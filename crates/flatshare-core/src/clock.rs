//! House clock and simulated time tracking.
//!
//! The clock is the single source of truth for temporal state in the
//! simulation. It tracks the current tick, holds the simulated time of day
//! as a [`NaiveTime`], and renders the human-readable time label embedded
//! in every prompt.
//!
//! # Design Principles
//!
//! - The tick counter advances with checked arithmetic (no silent overflow).
//! - Time-of-day wraps at midnight; minute and hour bounds are guaranteed
//!   by `NaiveTime` itself, never re-validated downstream.
//! - The clock advances exactly once per tick, after all actors have acted.

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::HouseholdConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. unparseable start time).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Coarse period of the day, derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// 05:00 through 11:59.
    Morning,
    /// 12:00 through 16:59.
    Afternoon,
    /// 17:00 through 21:59.
    Evening,
    /// 22:00 through 04:59.
    Night,
}

impl TimeOfDay {
    /// Derive the period from an hour in `[0, 24)`.
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=21 => Self::Evening,
            _ => Self::Night,
        }
    }

    /// Human-readable name used in time labels.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Night => "Night",
        }
    }
}

/// House clock tracking the simulation's temporal state.
///
/// The clock advances once per tick by a fixed number of simulated minutes,
/// wrapping at midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HouseClock {
    /// Current simulated time of day.
    time: NaiveTime,
    /// Current tick number (0-indexed, incremented after each full tick).
    tick: u64,
    /// Simulated minutes added per tick.
    minutes_per_tick: u32,
}

impl HouseClock {
    /// Create a new clock from the household configuration.
    ///
    /// The start time must parse as `HH:MM` and `minutes_per_tick` must be
    /// at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: &HouseholdConfig) -> Result<Self, ClockError> {
        let time = NaiveTime::parse_from_str(&config.start_time, "%H:%M").map_err(|e| {
            ClockError::InvalidConfig {
                reason: format!("unparseable start_time {:?}: {e}", config.start_time),
            }
        })?;
        Self::from_parts(time, 0, config.minutes_per_tick)
    }

    /// Create a clock from explicit parts (useful for testing and state
    /// restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `minutes_per_tick` is 0.
    pub fn from_parts(
        time: NaiveTime,
        tick: u64,
        minutes_per_tick: u32,
    ) -> Result<Self, ClockError> {
        if minutes_per_tick == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "minutes_per_tick must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            time,
            tick,
            minutes_per_tick,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// The simulated time wraps at midnight; `overflowing_add_signed` never
    /// fails, it reports the wrapped seconds which are deliberately ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        let (wrapped, _overflow_secs) = self
            .time
            .overflowing_add_signed(TimeDelta::minutes(i64::from(self.minutes_per_tick)));
        self.time = wrapped;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the current simulated time.
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// Return the configured simulated minutes per tick.
    pub const fn minutes_per_tick(&self) -> u32 {
        self.minutes_per_tick
    }

    /// Compute the current period of the day from the hour.
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::from_hour(self.time.hour())
    }

    /// Render the human-readable time label embedded in prompts,
    /// e.g. `"Morning 07:15"`.
    pub fn time_label(&self) -> String {
        format!(
            "{} {:02}:{:02}",
            self.time_of_day().as_str(),
            self.time.hour(),
            self.time.minute()
        )
    }
}
