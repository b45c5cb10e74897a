// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minute/hour/weekday recurrence patterns.

use std::fmt;

use chrono::{Datelike, Timelike};

use crate::error::ConfigError;

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// One field of a [`CronSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CronField {
    /// Matches every value.
    Every,
    /// Matches exactly one value.
    Fixed(u32),
    /// Matches `min, min + step, ...` up to `max` inclusive.
    Range {
        /// First matching value.
        min: u32,
        /// Last value considered.
        max: u32,
        /// Distance between matching values, never zero.
        step: u32,
    },
}

impl CronField {
    /// Returns `true` if `value` matches this field.
    #[must_use]
    pub fn matches(&self, value: u32) -> bool {
        match *self {
            Self::Every => true,
            Self::Fixed(v) => v == value,
            Self::Range { min, max, step } => {
                step != 0 && (min..=max).contains(&value) && (value - min) % step == 0
            }
        }
    }
}

impl fmt::Display for CronField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Every => f.write_str("*"),
            Self::Fixed(v) => write!(f, "{v}"),
            Self::Range { min, max, step } => write!(f, "{min}-{max}/{step}"),
        }
    }
}

/// A recurrence pattern evaluated once per minute.
///
/// Weekdays count from Sunday = 0.
///
/// # Examples
///
/// ```
/// use httpdev_lib::scheduler::{CronField, CronSpec};
///
/// // Every 15 minutes
/// let spec = CronSpec::from_period_minutes(15).unwrap();
/// assert_eq!(spec.minute, CronField::Range { min: 0, max: 59, step: 15 });
/// assert_eq!(spec.hour, CronField::Every);
///
/// // Every 2 hours, on the hour
/// let spec = CronSpec::from_period_minutes(120).unwrap();
/// assert_eq!(spec.minute, CronField::Fixed(0));
/// assert_eq!(spec.hour, CronField::Range { min: 0, max: 23, step: 2 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CronSpec {
    /// Minute of the hour (0-59).
    pub minute: CronField,
    /// Hour of the day (0-23).
    pub hour: CronField,
    /// Day of the week (0-6, Sunday = 0).
    pub weekday: CronField,
}

impl CronSpec {
    /// A pattern matching every minute.
    pub const EVERY_MINUTE: Self = Self {
        minute: CronField::Every,
        hour: CronField::Every,
        weekday: CronField::Every,
    };

    /// Converts a period in whole minutes into a pattern.
    ///
    /// Periods under an hour tick by minute, periods under a day tick by
    /// hour on minute 0, longer periods tick by weekday at midnight. The
    /// period is expected to divide its unit; the step is rounded to the
    /// nearest whole unit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero period.
    pub fn from_period_minutes(period: u32) -> Result<Self, ConfigError> {
        if period == 0 {
            return Err(ConfigError::invalid("period", "must be at least one minute"));
        }

        let spec = if period < MINUTES_PER_HOUR {
            Self {
                minute: CronField::Range {
                    min: 0,
                    max: 59,
                    step: period,
                },
                hour: CronField::Every,
                weekday: CronField::Every,
            }
        } else if period < MINUTES_PER_DAY {
            Self {
                minute: CronField::Fixed(0),
                hour: CronField::Range {
                    min: 0,
                    max: 23,
                    step: rounded_div(period, MINUTES_PER_HOUR),
                },
                weekday: CronField::Every,
            }
        } else {
            Self {
                minute: CronField::Fixed(0),
                hour: CronField::Fixed(0),
                weekday: CronField::Range {
                    min: 0,
                    max: 6,
                    step: rounded_div(period, MINUTES_PER_DAY),
                },
            }
        };
        Ok(spec)
    }

    /// Returns `true` if the pattern fires at `time`.
    #[must_use]
    pub fn matches<T: Datelike + Timelike>(&self, time: &T) -> bool {
        self.minute.matches(time.minute())
            && self.hour.matches(time.hour())
            && self.weekday.matches(time.weekday().num_days_from_sunday())
    }
}

impl fmt::Display for CronSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} * * {}", self.minute, self.hour, self.weekday)
    }
}

/// Integer division rounding halves up.
fn rounded_div(value: u32, unit: u32) -> u32 {
    (value + unit / 2) / unit
}
