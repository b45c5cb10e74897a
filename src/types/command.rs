// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Commands sent to virtual devices and the setter actions they map to.

use std::fmt;

use serde_json::Value;

/// A command dispatched to a device's command handler.
///
/// # Examples
///
/// ```
/// use httpdev_lib::types::DeviceCommand;
/// use serde_json::json;
///
/// assert_eq!(DeviceCommand::from_parts("on", &json!(null)), Some(DeviceCommand::On));
/// assert_eq!(
///     DeviceCommand::from_parts("exact", &json!({ "level": "42" })),
///     Some(DeviceCommand::Exact(42))
/// );
/// assert_eq!(DeviceCommand::from_parts("blink", &json!(null)), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    /// Re-read the device state from the remote endpoint.
    Update,
    /// Switch on.
    On,
    /// Switch off.
    Off,
    /// Set an exact level.
    Exact(i64),
}

impl DeviceCommand {
    /// Builds a command from its host-side name and argument object.
    ///
    /// `exact` takes its level from `args.level`, given either as a number
    /// (truncated) or as a string starting with an integer (`"42.7"` and
    /// `"42%"` both give 42). Returns `None` for unknown names and for an
    /// `exact` without a usable level.
    #[must_use]
    pub fn from_parts(name: &str, args: &Value) -> Option<Self> {
        match name {
            "update" => Some(Self::Update),
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            "exact" => level_arg(args).map(Self::Exact),
            _ => None,
        }
    }

    /// Returns the host-side command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::On => "on",
            Self::Off => "off",
            Self::Exact(_) => "exact",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(level) => write!(f, "exact({level})"),
            other => f.write_str(other.name()),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn level_arg(args: &Value) -> Option<i64> {
    match args.get("level")? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => leading_integer(s),
        _ => None,
    }
}

/// Parses the optionally signed run of digits at the start of `s`.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with(['+', '-']));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// The setter an act cycle resolves for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `setterOn_<type>`.
    On,
    /// `setterOff_<type>`.
    Off,
    /// `setterLevel_<type>`.
    Level,
}

impl Action {
    /// All setter actions.
    pub const ALL: [Self; 3] = [Self::On, Self::Off, Self::Level];

    /// Returns the name used in setter configuration keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "On",
            Self::Off => "Off",
            Self::Level => "Level",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
