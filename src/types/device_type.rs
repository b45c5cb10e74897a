// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Virtual device kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

use super::Level;

/// The kind of virtual device an adapter exposes.
///
/// The string forms (`sensorBinary`, `switchMultilevel`, ...) are the ones
/// used by host configuration files and by the device identifier.
///
/// # Examples
///
/// ```
/// use httpdev_lib::types::DeviceType;
///
/// let kind: DeviceType = "switchBinary".parse().unwrap();
/// assert_eq!(kind, DeviceType::SwitchBinary);
/// assert!(kind.is_binary());
/// assert!(kind.is_switch());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Read-only binary sensor (door contact, motion, ...).
    #[serde(rename = "sensorBinary")]
    SensorBinary,
    /// Read-only numeric sensor (temperature, humidity, ...).
    #[serde(rename = "sensorMultilevel")]
    SensorMultilevel,
    /// Binary actuator.
    #[serde(rename = "switchBinary")]
    SwitchBinary,
    /// Multilevel actuator (dimmer, blind).
    #[serde(rename = "switchMultilevel")]
    SwitchMultilevel,
    /// Momentary push button.
    #[serde(rename = "toggleButton")]
    ToggleButton,
}

impl DeviceType {
    /// All supported device types.
    pub const ALL: [Self; 5] = [
        Self::SensorBinary,
        Self::SensorMultilevel,
        Self::SwitchBinary,
        Self::SwitchMultilevel,
        Self::ToggleButton,
    ];

    /// Returns the configuration string for this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SensorBinary => "sensorBinary",
            Self::SensorMultilevel => "sensorMultilevel",
            Self::SwitchBinary => "switchBinary",
            Self::SwitchMultilevel => "switchMultilevel",
            Self::ToggleButton => "toggleButton",
        }
    }

    /// Returns `true` for kinds whose level is `on`/`off`.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::SensorBinary | Self::SwitchBinary)
    }

    /// Returns `true` for kinds whose level is numeric.
    #[must_use]
    pub const fn is_multilevel(&self) -> bool {
        matches!(self, Self::SensorMultilevel | Self::SwitchMultilevel)
    }

    /// Returns `true` for actuators, the kinds refreshed by the switch refresher.
    #[must_use]
    pub const fn is_switch(&self) -> bool {
        matches!(self, Self::SwitchBinary | Self::SwitchMultilevel)
    }

    /// Returns `true` if the level of this kind can be read back by polling.
    #[must_use]
    pub const fn is_pollable(&self) -> bool {
        !matches!(self, Self::ToggleButton)
    }

    /// Level a freshly created device of this kind starts with.
    #[must_use]
    pub const fn initial_level(&self) -> Level {
        match self {
            Self::SensorBinary | Self::SwitchBinary => Level::Off,
            Self::SensorMultilevel | Self::SwitchMultilevel => Level::Value(0.0),
            Self::ToggleButton => Level::On,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::invalid("deviceType", format!("unknown type {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_all_names() {
        for kind in DeviceType::ALL {
            assert_eq!(kind.as_str().parse::<DeviceType>().unwrap(), kind);
        }
    }

    #[test]
    fn parse_unknown_fails() {
        assert!("thermostat".parse::<DeviceType>().is_err());
    }

    #[test]
    fn classification() {
        assert!(DeviceType::SensorBinary.is_binary());
        assert!(!DeviceType::SensorBinary.is_switch());
        assert!(DeviceType::SwitchMultilevel.is_multilevel());
        assert!(DeviceType::SwitchMultilevel.is_switch());
        assert!(!DeviceType::ToggleButton.is_pollable());
        assert!(!DeviceType::ToggleButton.is_binary());
    }

    #[test]
    fn initial_levels() {
        assert_eq!(DeviceType::SwitchBinary.initial_level(), Level::Off);
        assert_eq!(DeviceType::SensorMultilevel.initial_level(), Level::Value(0.0));
        assert_eq!(DeviceType::ToggleButton.initial_level(), Level::On);
    }

    #[test]
    fn serde_uses_config_names() {
        let json = serde_json::to_string(&DeviceType::SwitchMultilevel).unwrap();
        assert_eq!(json, "\"switchMultilevel\"");
        let back: DeviceType = serde_json::from_str("\"toggleButton\"").unwrap();
        assert_eq!(back, DeviceType::ToggleButton);
    }
}
