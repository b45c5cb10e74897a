// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping of device commands to adapter operations.

use crate::types::{Action, DeviceCommand, DeviceType, Level};

/// Level sent for `on` to a multilevel switch.
pub const MULTILEVEL_ON: i64 = 99;

/// Level sent for `off` to a multilevel switch.
pub const MULTILEVEL_OFF: i64 = 0;

/// What an adapter does in response to a command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// Run one poll cycle.
    Poll,
    /// Run one act cycle.
    Act {
        /// Setter to resolve.
        action: Action,
        /// Value substituted into the setter template.
        value: Option<Level>,
        /// Value written locally when no request confirms the change.
        self_value: Option<Level>,
    },
}

/// Resolves the operation `command` triggers on a device of `device_type`.
///
/// Returns `None` for combinations the device kind does not support.
///
/// # Examples
///
/// ```
/// use httpdev_lib::adapter::{Operation, dispatch};
/// use httpdev_lib::types::{Action, DeviceCommand, DeviceType, Level};
///
/// assert_eq!(dispatch(DeviceType::SensorBinary, DeviceCommand::Update), Some(Operation::Poll));
/// assert_eq!(dispatch(DeviceType::SensorBinary, DeviceCommand::On), None);
/// assert_eq!(
///     dispatch(DeviceType::SwitchMultilevel, DeviceCommand::Exact(42)),
///     Some(Operation::Act {
///         action: Action::Level,
///         value: Some(Level::Value(42.0)),
///         self_value: Some(Level::Value(42.0)),
///     })
/// );
/// ```
#[must_use]
pub fn dispatch(device_type: DeviceType, command: DeviceCommand) -> Option<Operation> {
    use DeviceType::{SensorBinary, SensorMultilevel, SwitchBinary, SwitchMultilevel, ToggleButton};

    match (command, device_type) {
        (DeviceCommand::Update, SensorBinary | SensorMultilevel | SwitchBinary | SwitchMultilevel) => {
            Some(Operation::Poll)
        }
        (DeviceCommand::On, ToggleButton | SwitchBinary) => Some(Operation::Act {
            action: Action::On,
            value: None,
            self_value: Some(Level::On),
        }),
        (DeviceCommand::Off, SwitchBinary) => Some(Operation::Act {
            action: Action::Off,
            value: None,
            self_value: Some(Level::Off),
        }),
        (DeviceCommand::On, SwitchMultilevel) => Some(level_act(MULTILEVEL_ON)),
        (DeviceCommand::Off, SwitchMultilevel) => Some(level_act(MULTILEVEL_OFF)),
        (DeviceCommand::Exact(level), SwitchMultilevel) => Some(level_act(level)),
        _ => None,
    }
}

fn level_act(level: i64) -> Operation {
    let level = Level::from(level);
    Operation::Act {
        action: Action::Level,
        value: Some(level),
        self_value: Some(level),
    }
}
