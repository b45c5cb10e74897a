// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device level values.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ParseError;

use super::DeviceType;

/// The value reported in a device's `level` metric.
///
/// Binary kinds use [`Level::On`] / [`Level::Off`]; multilevel kinds carry a
/// finite number.
///
/// # Examples
///
/// ```
/// use httpdev_lib::types::{DeviceType, Level};
///
/// assert_eq!(Level::parse_default(" true\n", DeviceType::SwitchBinary).unwrap(), Level::On);
/// assert_eq!(
///     Level::parse_default("21.5", DeviceType::SensorMultilevel).unwrap(),
///     Level::Value(21.5)
/// );
/// assert_eq!(Level::Value(99.0).to_string(), "99");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Level {
    /// Binary on.
    On,
    /// Binary off.
    Off,
    /// Numeric level.
    Value(f64),
}

impl Level {
    /// Parses a raw payload with the built-in rules for `device_type`.
    ///
    /// The payload is trimmed first. Binary kinds accept `1`/`on`/`true` and
    /// `0`/`off`/`false`; multilevel kinds accept any finite float.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the payload does not match the rules, or
    /// if the device type carries no readable level.
    pub fn parse_default(payload: &str, device_type: DeviceType) -> Result<Self, ParseError> {
        let data = payload.trim();

        if device_type.is_binary() {
            return match data {
                "1" | "on" | "true" => Ok(Self::On),
                "0" | "off" | "false" => Ok(Self::Off),
                other => Err(ParseError::UnrecognizedToken(other.to_string())),
            };
        }

        if device_type.is_multilevel() {
            return data
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Value)
                .ok_or_else(|| ParseError::InvalidNumber(data.to_string()));
        }

        Err(ParseError::NotParsable(device_type.to_string()))
    }

    /// Returns the numeric value, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::On | Self::Off => None,
        }
    }

    /// Returns `true` for [`Level::On`].
    #[must_use]
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for Level {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<i64> for Level {
    fn from(value: i64) -> Self {
        // Levels are small integers (0-99), well within f64's exact range
        #[allow(clippy::cast_precision_loss)]
        Self::Value(value as f64)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Text(String),
    Number(f64),
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::On => serializer.serialize_str("on"),
            Self::Off => serializer.serialize_str("off"),
            Self::Value(v) => serializer.serialize_f64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LevelRepr::deserialize(deserializer)? {
            LevelRepr::Number(v) => Ok(Self::Value(v)),
            LevelRepr::Text(s) => match s.as_str() {
                "on" => Ok(Self::On),
                "off" => Ok(Self::Off),
                other => Err(serde::de::Error::custom(format!(
                    "invalid level {other:?}"
                ))),
            },
        }
    }
}
