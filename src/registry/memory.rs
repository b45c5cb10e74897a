// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory device registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::error::RegistryError;
use crate::event::{DeviceEvent, EventBus};
use crate::types::{DeviceCommand, Level};

use super::{CommandHandler, DeviceDescriptor, DeviceId, DeviceRegistry, DeviceSnapshot};

struct Entry {
    snapshot: DeviceSnapshot,
    handler: CommandHandler,
}

/// Thread-safe in-memory [`DeviceRegistry`].
///
/// Cloning is cheap; clones share the same devices and event bus. Every
/// mutation is published as a [`DeviceEvent`].
///
/// A device identifier belongs to the module that first created it: a
/// different module trying to create the same identifier is rejected.
#[derive(Clone)]
pub struct MemoryRegistry {
    devices: Arc<RwLock<HashMap<DeviceId, Entry>>>,
    event_bus: EventBus,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            event_bus: EventBus::new(),
        }
    }

    /// Creates an empty registry with a custom event bus capacity.
    #[must_use]
    pub fn with_capacity(event_capacity: usize) -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            event_bus: EventBus::with_capacity(event_capacity),
        }
    }

    /// Subscribes to registry events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_bus.subscribe()
    }

    /// Returns the number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Returns `true` if no device is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn create(
        &self,
        descriptor: DeviceDescriptor,
        handler: CommandHandler,
    ) -> Result<DeviceSnapshot, RegistryError> {
        let id = descriptor.id.clone();
        if id.as_str().is_empty() {
            return Err(RegistryError::Rejected {
                device_id: id,
                reason: "empty device identifier".to_string(),
            });
        }

        let snapshot = {
            let mut devices = self.devices.write();
            match devices.get_mut(&id) {
                Some(entry) if entry.snapshot.module_id != descriptor.module_id => {
                    return Err(RegistryError::Rejected {
                        reason: format!("owned by module {}", entry.snapshot.module_id),
                        device_id: id,
                    });
                }
                Some(entry) => {
                    tracing::debug!(device_id = %id, "Re-registering device");
                    entry.snapshot.overlay(descriptor);
                    entry.handler = handler;
                    entry.snapshot.clone()
                }
                None => {
                    tracing::debug!(device_id = %id, "Registering device");
                    let snapshot = DeviceSnapshot::from_descriptor(descriptor);
                    devices.insert(
                        id.clone(),
                        Entry {
                            snapshot: snapshot.clone(),
                            handler,
                        },
                    );
                    snapshot
                }
            }
        };

        self.event_bus.publish(DeviceEvent::device_created(id));
        Ok(snapshot)
    }

    fn remove(&self, id: &DeviceId) -> bool {
        let removed = self.devices.write().remove(id).is_some();
        if removed {
            tracing::debug!(device_id = %id, "Removed device");
            self.event_bus.publish(DeviceEvent::device_removed(id.clone()));
        }
        removed
    }

    fn snapshot(&self, id: &DeviceId) -> Option<DeviceSnapshot> {
        self.devices.read().get(id).map(|e| e.snapshot.clone())
    }

    fn set_level(&self, id: &DeviceId, level: Level) -> bool {
        {
            let mut devices = self.devices.write();
            let Some(entry) = devices.get_mut(id) else {
                return false;
            };
            entry.snapshot.metrics.level = level;
            entry.snapshot.update_time = Utc::now();
        }
        self.event_bus
            .publish(DeviceEvent::level_changed(id.clone(), level));
        true
    }

    fn set_failed(&self, id: &DeviceId, failed: bool) -> bool {
        let changed = {
            let mut devices = self.devices.write();
            let Some(entry) = devices.get_mut(id) else {
                return false;
            };
            let changed = entry.snapshot.metrics.is_failed != failed;
            entry.snapshot.metrics.is_failed = failed;
            changed
        };
        if changed {
            self.event_bus
                .publish(DeviceEvent::liveness_changed(id.clone(), failed));
        }
        true
    }

    fn perform_command(&self, id: &DeviceId, command: DeviceCommand) -> bool {
        // Handlers may call back into the registry, so the lock is released first
        let handler = self.devices.read().get(id).map(|e| Arc::clone(&e.handler));
        match handler {
            Some(handler) => {
                tracing::debug!(device_id = %id, %command, "Dispatching command");
                handler(command);
                true
            }
            None => false,
        }
    }

    fn devices(&self) -> Vec<DeviceSnapshot> {
        self.devices
            .read()
            .values()
            .map(|e| e.snapshot.clone())
            .collect()
    }

    fn filter(&self, predicate: &dyn Fn(&DeviceSnapshot) -> bool) -> Vec<DeviceSnapshot> {
        self.devices
            .read()
            .values()
            .filter(|e| predicate(&e.snapshot))
            .map(|e| e.snapshot.clone())
            .collect()
    }
}

impl fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegistry")
            .field("devices", &self.len())
            .field("subscribers", &self.event_bus.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn descriptor(id: &str, module_id: &str, title: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            id: DeviceId::from(id),
            module_id: module_id.to_string(),
            device_type: DeviceType::SwitchBinary,
            probe_type: String::new(),
            title: title.to_string(),
            icon: "switch".to_string(),
            level: Level::Off,
            scale_title: String::new(),
        }
    }

    fn noop() -> CommandHandler {
        Arc::new(|_| {})
    }

    #[test]
    fn create_and_snapshot() {
        let registry = MemoryRegistry::new();
        let snapshot = registry.create(descriptor("a", "1", "A"), noop()).unwrap();

        assert_eq!(snapshot.title(), "A");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot(&DeviceId::from("a")), Some(snapshot));
    }

    #[test]
    fn re_registration_is_idempotent_and_keeps_title() {
        let registry = MemoryRegistry::new();
        registry.create(descriptor("a", "1", "Original"), noop()).unwrap();
        registry.set_level(&DeviceId::from("a"), Level::On);

        let again = registry.create(descriptor("a", "1", "Other"), noop()).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(again.title(), "Original");
        assert_eq!(again.level(), Level::Off);
    }

    #[test]
    fn foreign_module_is_rejected() {
        let registry = MemoryRegistry::new();
        registry.create(descriptor("a", "1", "A"), noop()).unwrap();

        let err = registry.create(descriptor("a", "2", "A"), noop()).unwrap_err();
        assert!(matches!(err, RegistryError::Rejected { .. }));
    }

    #[test]
    fn empty_id_is_rejected() {
        let registry = MemoryRegistry::new();
        assert!(registry.create(descriptor("", "1", "A"), noop()).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_is_safe_when_absent() {
        let registry = MemoryRegistry::new();
        registry.create(descriptor("a", "1", "A"), noop()).unwrap();

        assert!(registry.remove(&DeviceId::from("a")));
        assert!(!registry.remove(&DeviceId::from("a")));
        assert!(!registry.remove(&DeviceId::from("never")));
    }

    #[test]
    fn set_level_bumps_update_time_even_for_same_value() {
        let registry = MemoryRegistry::new();
        let id = DeviceId::from("a");
        let created = registry.create(descriptor("a", "1", "A"), noop()).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(registry.set_level(&id, Level::Off));

        let after = registry.snapshot(&id).unwrap();
        assert!(after.update_time > created.update_time);
    }

    #[test]
    fn set_failed_does_not_touch_update_time() {
        let registry = MemoryRegistry::new();
        let id = DeviceId::from("a");
        let created = registry.create(descriptor("a", "1", "A"), noop()).unwrap();

        assert!(registry.set_failed(&id, true));
        let after = registry.snapshot(&id).unwrap();
        assert!(after.is_failed());
        assert_eq!(after.update_time, created.update_time);
    }

    #[test]
    fn perform_command_invokes_handler() {
        let registry = MemoryRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        registry
            .create(
                descriptor("a", "1", "A"),
                Arc::new(move |command| {
                    assert_eq!(command, DeviceCommand::Update);
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        assert!(registry.perform_command(&DeviceId::from("a"), DeviceCommand::Update));
        assert!(!registry.perform_command(&DeviceId::from("b"), DeviceCommand::Update));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_reenter_registry() {
        let registry = MemoryRegistry::new();
        let inner = registry.clone();
        registry
            .create(
                descriptor("a", "1", "A"),
                Arc::new(move |_| {
                    inner.set_level(&DeviceId::from("a"), Level::On);
                }),
            )
            .unwrap();

        registry.perform_command(&DeviceId::from("a"), DeviceCommand::On);
        assert_eq!(
            registry.snapshot(&DeviceId::from("a")).unwrap().level(),
            Level::On
        );
    }

    #[test]
    fn filter_selects_matching_devices() {
        let registry = MemoryRegistry::new();
        registry.create(descriptor("a", "1", "A"), noop()).unwrap();
        registry.create(descriptor("b", "1", "B"), noop()).unwrap();

        let matched = registry.filter(&|d| d.title() == "B");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, DeviceId::from("b"));
    }

    #[tokio::test]
    async fn mutations_are_published() {
        let registry = MemoryRegistry::new();
        let mut rx = registry.subscribe();
        let id = DeviceId::from("a");

        registry.create(descriptor("a", "1", "A"), noop()).unwrap();
        registry.set_level(&id, Level::On);
        registry.set_failed(&id, true);
        registry.set_failed(&id, true);
        registry.remove(&id);

        assert_eq!(rx.recv().await.unwrap(), DeviceEvent::device_created(id.clone()));
        assert_eq!(
            rx.recv().await.unwrap(),
            DeviceEvent::level_changed(id.clone(), Level::On)
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            DeviceEvent::liveness_changed(id.clone(), true)
        );
        assert_eq!(rx.recv().await.unwrap(), DeviceEvent::device_removed(id));
    }
}
