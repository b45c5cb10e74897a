// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use serde::Serialize;

use crate::types::Level;

use super::DeviceId;

/// Events emitted by a device registry.
///
/// These events notify subscribers about device lifecycle changes and
/// metric updates. All events include the relevant device ID.
///
/// # Examples
///
/// ```
/// use httpdev_lib::event::{DeviceEvent, DeviceId};
/// use httpdev_lib::types::Level;
///
/// let device_id = DeviceId::from("HTTP_Device_switchBinary_1");
/// let event = DeviceEvent::level_changed(device_id.clone(), Level::On);
/// assert!(event.is_metric());
/// assert_eq!(event.device_id(), &device_id);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeviceEvent {
    /// A device was created (or re-registered) in the registry.
    DeviceCreated {
        /// The ID of the created device.
        device_id: DeviceId,
    },

    /// A device was removed from the registry.
    DeviceRemoved {
        /// The ID of the removed device.
        device_id: DeviceId,
    },

    /// A level was written to the device.
    ///
    /// Emitted on every write, including writes of an unchanged value.
    LevelChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// The level that was written.
        level: Level,
    },

    /// The device's `isFailed` flag flipped.
    LivenessChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// Whether the device is now marked as failed.
        failed: bool,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::DeviceCreated { device_id }
            | Self::DeviceRemoved { device_id }
            | Self::LevelChanged { device_id, .. }
            | Self::LivenessChanged { device_id, .. } => device_id,
        }
    }

    /// Returns `true` if this is a device lifecycle event (created/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::DeviceCreated { .. } | Self::DeviceRemoved { .. })
    }

    /// Returns `true` if this is a metric update event.
    #[must_use]
    pub fn is_metric(&self) -> bool {
        matches!(self, Self::LevelChanged { .. } | Self::LivenessChanged { .. })
    }

    /// Creates a device created event.
    #[must_use]
    pub fn device_created(device_id: DeviceId) -> Self {
        Self::DeviceCreated { device_id }
    }

    /// Creates a device removed event.
    #[must_use]
    pub fn device_removed(device_id: DeviceId) -> Self {
        Self::DeviceRemoved { device_id }
    }

    /// Creates a level changed event.
    #[must_use]
    pub fn level_changed(device_id: DeviceId, level: Level) -> Self {
        Self::LevelChanged { device_id, level }
    }

    /// Creates a liveness changed event.
    #[must_use]
    pub fn liveness_changed(device_id: DeviceId, failed: bool) -> Self {
        Self::LivenessChanged { device_id, failed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let id = DeviceId::from("d");
        assert!(DeviceEvent::device_created(id.clone()).is_lifecycle());
        assert!(DeviceEvent::device_removed(id.clone()).is_lifecycle());
        assert!(DeviceEvent::liveness_changed(id.clone(), true).is_metric());
        assert!(!DeviceEvent::level_changed(id, Level::Off).is_lifecycle());
    }

    #[test]
    fn serializes_with_tag() {
        let event = DeviceEvent::liveness_changed(DeviceId::from("d1"), true);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "livenessChanged");
        assert_eq!(json["device_id"], "d1");
        assert_eq!(json["failed"], true);
    }
}
