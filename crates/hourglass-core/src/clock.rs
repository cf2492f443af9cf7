//! Game clock and calendar arithmetic for a play session.
//!
//! The clock is the single source of truth for in-game time. It holds the
//! day counter, the time of day, and the weekday, and it is advanced once
//! per simulation step by the orchestrator.
//!
//! # Design Principles
//!
//! - Durations are converted to whole minutes by truncation. Sub-minute
//!   remainders are dropped, not carried into the next step.
//! - Day and weekday rollover are derived from the minute total in one
//!   place. Nothing else in the crate re-derives calendar arithmetic.
//! - Integer arithmetic is checked; a day counter overflow is an error,
//!   never a silent wrap.

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::ClockConfig;

/// Minutes in one in-game day.
pub const MINUTES_PER_DAY: u64 = 1440;

/// Days in one in-game week.
pub const DAYS_PER_WEEK: u64 = 7;

/// Format used for every time-of-day string in the simulation.
const CLOCK_FORMAT: &str = "%H:%M";

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The requested duration is negative, NaN, or infinite.
    #[error("invalid duration: {hours} hours")]
    InvalidDuration {
        /// The rejected duration.
        hours: f64,
    },

    /// The day counter would overflow.
    #[error("day counter overflow: cannot advance {days} days past day {day}")]
    DayOverflow {
        /// Day counter before the advance.
        day: u32,
        /// Days that were to be added.
        days: u64,
    },

    /// A clock was built with an impossible field value.
    #[error("invalid clock: {reason}")]
    InvalidClock {
        /// Explanation of what is wrong.
        reason: String,
    },

    /// The configured start time could not be parsed.
    #[error(transparent)]
    Parse(#[from] TimeParseError),
}

/// A time-of-day string that is not valid `"HH:MM"`.
#[derive(Debug, thiserror::Error)]
#[error("malformed time {value:?}: {source}")]
pub struct TimeParseError {
    /// The offending input.
    pub value: String,
    /// The underlying chrono parse error.
    pub source: chrono::ParseError,
}

/// Coarse part of the day, derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayPeriod {
    /// 06:00 to 11:59.
    Morning,
    /// 12:00 to 17:59.
    Afternoon,
    /// 18:00 to 21:59.
    Evening,
    /// 22:00 to 05:59.
    Night,
}

/// Summary of a single [`GameClock::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockAdvance {
    /// Whole minutes actually added.
    pub minutes: u64,
    /// Midnights crossed.
    pub days_passed: u64,
}

/// The in-game clock of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    /// Current day, starting at 1.
    day: u32,
    /// Current time of day, whole minutes only.
    time: NaiveTime,
    /// Current weekday.
    weekday: Weekday,
}

impl GameClock {
    /// Create a clock at the given day, time, and weekday.
    ///
    /// Seconds are discarded from `time`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidClock`] if `day` is 0.
    pub fn new(day: u32, time: NaiveTime, weekday: Weekday) -> Result<Self, ClockError> {
        if day == 0 {
            return Err(ClockError::InvalidClock {
                reason: "day must be at least 1".to_owned(),
            });
        }
        let time = time_from_minutes(u64::from(minute_of_day(time)))?;
        Ok(Self { day, time, weekday })
    }

    /// Create a clock from the configured session start.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] if the start day is 0 or the start time is
    /// not `"HH:MM"`.
    pub fn from_config(config: &ClockConfig) -> Result<Self, ClockError> {
        let time = parse_clock_time(&config.start_time)?;
        Self::new(config.start_day, time, config.start_weekday)
    }

    /// Current day number.
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Current time of day.
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// Current weekday.
    pub const fn weekday(&self) -> Weekday {
        self.weekday
    }

    /// Current time rendered as `"HH:MM"`.
    pub fn time_string(&self) -> String {
        self.time.format(CLOCK_FORMAT).to_string()
    }

    /// Minutes elapsed since midnight.
    pub fn minute_of_day(&self) -> u32 {
        minute_of_day(self.time)
    }

    /// Coarse part of the day for the current hour.
    pub fn day_period(&self) -> DayPeriod {
        match self.time.hour() {
            6..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            18..=21 => DayPeriod::Evening,
            _ => DayPeriod::Night,
        }
    }

    /// Advance the clock by `hours` of in-game time.
    ///
    /// The duration is truncated to whole minutes. Crossing midnight bumps
    /// the day counter and rotates the weekday Monday through Sunday.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidDuration`] for negative or non-finite
    /// durations and [`ClockError::DayOverflow`] if the day counter would
    /// exceed `u32::MAX`.
    pub fn advance(&mut self, hours: f64) -> Result<ClockAdvance, ClockError> {
        let minutes = hours_to_minutes(hours)?;

        let total = u64::from(self.minute_of_day())
            .checked_add(minutes)
            .ok_or(ClockError::InvalidDuration { hours })?;
        let days_passed = total.checked_div(MINUTES_PER_DAY).unwrap_or(0);
        let remaining = total.checked_rem(MINUTES_PER_DAY).unwrap_or(0);

        let time = time_from_minutes(remaining)?;

        if days_passed > 0 {
            let overflow = ClockError::DayOverflow {
                day: self.day,
                days: days_passed,
            };
            let added = u32::try_from(days_passed).map_err(|_err| ClockError::DayOverflow {
                day: self.day,
                days: days_passed,
            })?;
            self.day = self.day.checked_add(added).ok_or(overflow)?;
            self.weekday = advance_weekday(self.weekday, days_passed);
        }
        self.time = time;

        Ok(ClockAdvance {
            minutes,
            days_passed,
        })
    }
}

/// Parse an `"HH:MM"` string into a time of day.
///
/// # Errors
///
/// Returns [`TimeParseError`] if the string is not a valid 24-hour time.
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, TimeParseError> {
    NaiveTime::parse_from_str(value.trim(), CLOCK_FORMAT).map_err(|source| TimeParseError {
        value: value.to_owned(),
        source,
    })
}

/// Minutes elapsed since midnight for a time of day.
pub fn minute_of_day(time: NaiveTime) -> u32 {
    // hour < 24 and minute < 60, so this stays below 1440.
    time.hour().saturating_mul(60).saturating_add(time.minute())
}

/// Rotate a weekday forward by `days`, Monday through Sunday.
pub fn advance_weekday(weekday: Weekday, days: u64) -> Weekday {
    let steps = days.checked_rem(DAYS_PER_WEEK).unwrap_or(0);
    (0..steps).fold(weekday, |day, _| day.succ())
}

/// Convert hours to whole minutes, dropping any sub-minute remainder.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn hours_to_minutes(hours: f64) -> Result<u64, ClockError> {
    if !hours.is_finite() || hours < 0.0 {
        return Err(ClockError::InvalidDuration { hours });
    }
    let minutes = (hours * 60.0).floor();
    if minutes >= u64::MAX as f64 {
        return Err(ClockError::InvalidDuration { hours });
    }
    // Non-negative, finite, and below u64::MAX: the cast is exact.
    Ok(minutes as u64)
}

/// Build a time of day from a minute offset below [`MINUTES_PER_DAY`].
fn time_from_minutes(minutes: u64) -> Result<NaiveTime, ClockError> {
    let invalid = || ClockError::InvalidClock {
        reason: format!("minute offset {minutes} is outside one day"),
    };
    let hour = u32::try_from(minutes.checked_div(60).unwrap_or(0)).map_err(|_err| invalid())?;
    let minute = u32::try_from(minutes.checked_rem(60).unwrap_or(0)).map_err(|_err| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}
