// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Virtual device descriptors and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::DeviceId;
use crate::types::{DeviceType, Level};

/// Everything a registry needs to create a virtual device.
///
/// `title` is a default: a registry re-creating an existing device keeps the
/// title it already has. All other fields overwrite the stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Registry identifier.
    pub id: DeviceId,
    /// Identity of the module that owns the device.
    pub module_id: String,
    /// Device kind.
    pub device_type: DeviceType,
    /// Probe type shown by host UIs (`door-window`, `temperature`, ...).
    pub probe_type: String,
    /// Display name.
    pub title: String,
    /// Icon name.
    pub icon: String,
    /// Initial level.
    pub level: Level,
    /// Unit shown next to multilevel sensor values.
    pub scale_title: String,
}

/// Observable metrics of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Current level.
    pub level: Level,
    /// Liveness flag, `true` once the device stopped answering.
    pub is_failed: bool,
    /// Display name.
    pub title: String,
    /// Icon name.
    pub icon: String,
    /// Unit for multilevel sensors.
    pub scale_title: String,
}

/// A point-in-time copy of a registered device.
///
/// This is the adapter's public output surface: host UIs render it, and the
/// switch refresher reads `update_time` and `device_type` from it.
///
/// # Examples
///
/// ```
/// use httpdev_lib::registry::{DeviceDescriptor, DeviceSnapshot};
/// use httpdev_lib::types::{DeviceType, Level};
///
/// let snapshot = DeviceSnapshot::from_descriptor(DeviceDescriptor {
///     id: "HTTP_Device_switchBinary_1".into(),
///     module_id: "1".to_string(),
///     device_type: DeviceType::SwitchBinary,
///     probe_type: String::new(),
///     title: "Garden pump".to_string(),
///     icon: "switch".to_string(),
///     level: Level::Off,
///     scale_title: String::new(),
/// });
///
/// let json = serde_json::to_value(&snapshot).unwrap();
/// assert_eq!(json["deviceType"], "switchBinary");
/// assert_eq!(json["metrics"]["isFailed"], false);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// Registry identifier.
    pub id: DeviceId,
    /// Owning module.
    pub module_id: String,
    /// Device kind.
    pub device_type: DeviceType,
    /// Probe type.
    pub probe_type: String,
    /// Observable metrics.
    pub metrics: Metrics,
    /// Time of the last level write.
    pub update_time: DateTime<Utc>,
}

impl DeviceSnapshot {
    /// Builds a fresh snapshot from a descriptor, stamped with the current time.
    #[must_use]
    pub fn from_descriptor(descriptor: DeviceDescriptor) -> Self {
        Self {
            id: descriptor.id,
            module_id: descriptor.module_id,
            device_type: descriptor.device_type,
            probe_type: descriptor.probe_type,
            metrics: Metrics {
                level: descriptor.level,
                is_failed: false,
                title: descriptor.title,
                icon: descriptor.icon,
                scale_title: descriptor.scale_title,
            },
            update_time: Utc::now(),
        }
    }

    /// Applies a re-registration on top of this snapshot.
    ///
    /// The title and liveness flag survive; everything else is replaced.
    pub(crate) fn overlay(&mut self, descriptor: DeviceDescriptor) {
        self.device_type = descriptor.device_type;
        self.probe_type = descriptor.probe_type;
        self.metrics.level = descriptor.level;
        self.metrics.icon = descriptor.icon;
        self.metrics.scale_title = descriptor.scale_title;
        self.update_time = Utc::now();
    }

    /// Current level.
    #[must_use]
    pub fn level(&self) -> Level {
        self.metrics.level
    }

    /// Liveness flag.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.metrics.is_failed
    }

    /// Display name.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.metrics.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(title: &str, level: Level) -> DeviceDescriptor {
        DeviceDescriptor {
            id: DeviceId::from("dev"),
            module_id: "3".to_string(),
            device_type: DeviceType::SwitchMultilevel,
            probe_type: String::new(),
            title: title.to_string(),
            icon: "multilevel".to_string(),
            level,
            scale_title: String::new(),
        }
    }

    #[test]
    fn overlay_keeps_title_and_liveness() {
        let mut snapshot = DeviceSnapshot::from_descriptor(descriptor("Blinds", Level::Value(40.0)));
        snapshot.metrics.is_failed = true;

        snapshot.overlay(descriptor("Renamed", Level::Value(0.0)));

        assert_eq!(snapshot.title(), "Blinds");
        assert!(snapshot.is_failed());
        assert_eq!(snapshot.level(), Level::Value(0.0));
    }

    #[test]
    fn snapshot_json_round_trips() {
        let snapshot = DeviceSnapshot::from_descriptor(descriptor("Blinds", Level::Value(40.0)));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: DeviceSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
