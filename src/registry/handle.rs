// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed access to one registered device.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::{DeviceCommand, Level};

use super::{DeviceId, DeviceRegistry, DeviceSnapshot};

/// A reference to a device living in a registry.
///
/// Every read goes to the registry, so a handle always observes the latest
/// stored state rather than a captured copy.
#[derive(Clone)]
pub struct DeviceHandle {
    registry: Arc<dyn DeviceRegistry>,
    id: DeviceId,
}

impl DeviceHandle {
    /// Creates a handle for `id` in `registry`.
    #[must_use]
    pub fn new(registry: Arc<dyn DeviceRegistry>, id: DeviceId) -> Self {
        Self { registry, id }
    }

    /// Returns the device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns the current snapshot, or `None` once the device is removed.
    #[must_use]
    pub fn snapshot(&self) -> Option<DeviceSnapshot> {
        self.registry.snapshot(&self.id)
    }

    /// Returns `true` while the device is registered.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Returns the current level.
    #[must_use]
    pub fn level(&self) -> Option<Level> {
        self.snapshot().map(|s| s.metrics.level)
    }

    /// Returns the liveness flag (`false` for removed devices).
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.snapshot().is_some_and(|s| s.metrics.is_failed)
    }

    /// Returns the display title, falling back to the identifier.
    #[must_use]
    pub fn title(&self) -> String {
        self.snapshot()
            .map_or_else(|| self.id.to_string(), |s| s.metrics.title)
    }

    /// Returns the time of the last level write.
    #[must_use]
    pub fn update_time(&self) -> Option<DateTime<Utc>> {
        self.snapshot().map(|s| s.update_time)
    }

    /// Writes the level.
    pub fn set_level(&self, level: Level) -> bool {
        self.registry.set_level(&self.id, level)
    }

    /// Writes the liveness flag.
    pub fn set_failed(&self, failed: bool) -> bool {
        self.registry.set_failed(&self.id, failed)
    }

    /// Dispatches a command to the device's handler.
    pub fn perform_command(&self, command: DeviceCommand) -> bool {
        self.registry.perform_command(&self.id, command)
    }

    /// Removes the device from the registry.
    pub fn remove(&self) -> bool {
        self.registry.remove(&self.id)
    }
}

impl fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DeviceDescriptor, MemoryRegistry};
    use crate::types::DeviceType;

    fn registry_with_device() -> (Arc<MemoryRegistry>, DeviceHandle) {
        let registry = Arc::new(MemoryRegistry::new());
        let snapshot = registry
            .create(
                DeviceDescriptor {
                    id: DeviceId::from("pump"),
                    module_id: "1".to_string(),
                    device_type: DeviceType::SwitchBinary,
                    probe_type: String::new(),
                    title: "Pump".to_string(),
                    icon: "switch".to_string(),
                    level: Level::Off,
                    scale_title: String::new(),
                },
                Arc::new(|_| {}),
            )
            .unwrap();
        let handle = DeviceHandle::new(registry.clone(), snapshot.id);
        (registry, handle)
    }

    #[test]
    fn reads_follow_registry_writes() {
        let (registry, handle) = registry_with_device();

        registry.set_level(handle.id(), Level::On);
        assert_eq!(handle.level(), Some(Level::On));

        handle.set_failed(true);
        assert!(handle.is_failed());
        assert_eq!(handle.title(), "Pump");
    }

    #[test]
    fn removed_device_reads_as_absent() {
        let (_registry, handle) = registry_with_device();

        assert!(handle.remove());
        assert!(!handle.exists());
        assert_eq!(handle.level(), None);
        assert!(!handle.is_failed());
        assert_eq!(handle.title(), "pump");
        assert!(!handle.set_level(Level::On));
    }
}
