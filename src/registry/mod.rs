// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device registry abstraction.
//!
//! The registry owns virtual devices: their metrics, their update timestamps
//! and the command handler each one was registered with. Adapters create and
//! remove their device through [`DeviceRegistry`] and read or write metrics
//! through a [`DeviceHandle`]; the switch refresher queries it for stale
//! devices.
//!
//! [`MemoryRegistry`] is the in-process implementation shipped with the
//! library. Hosts with their own device store implement the trait instead.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use httpdev_lib::registry::{DeviceDescriptor, DeviceRegistry, MemoryRegistry};
//! use httpdev_lib::types::{DeviceCommand, DeviceType, Level};
//!
//! let registry = MemoryRegistry::new();
//! let snapshot = registry
//!     .create(
//!         DeviceDescriptor {
//!             id: "lamp".into(),
//!             module_id: "1".to_string(),
//!             device_type: DeviceType::SwitchBinary,
//!             probe_type: String::new(),
//!             title: "Lamp".to_string(),
//!             icon: "switch".to_string(),
//!             level: Level::Off,
//!             scale_title: String::new(),
//!         },
//!         Arc::new(|command: DeviceCommand| println!("lamp got {command}")),
//!     )
//!     .unwrap();
//!
//! assert!(registry.perform_command(&snapshot.id, DeviceCommand::On));
//! ```

mod device;
mod handle;
mod memory;

pub use device::{DeviceDescriptor, DeviceSnapshot, Metrics};
pub use handle::DeviceHandle;
pub use memory::MemoryRegistry;

pub use crate::event::DeviceId;

use std::sync::Arc;

use crate::error::RegistryError;
use crate::types::{DeviceCommand, Level};

/// Callback invoked by the registry when a command targets a device.
///
/// Handlers must not block: long running work is spawned.
pub type CommandHandler = Arc<dyn Fn(DeviceCommand) + Send + Sync>;

/// Storage and dispatch for virtual devices.
///
/// All methods are synchronous and must be cheap; registries are called from
/// inside adapter tasks and refresher sweeps.
pub trait DeviceRegistry: Send + Sync {
    /// Registers a device, or re-registers it if the identifier exists.
    ///
    /// Re-registration under the same identifier by the same module is
    /// idempotent: the handler is replaced and the descriptor overlaid.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Rejected`] if the registry refuses the device.
    fn create(
        &self,
        descriptor: DeviceDescriptor,
        handler: CommandHandler,
    ) -> Result<DeviceSnapshot, RegistryError>;

    /// Unregisters a device. Returns `false` if it was not registered.
    fn remove(&self, id: &DeviceId) -> bool;

    /// Returns a copy of the device, if registered.
    fn snapshot(&self, id: &DeviceId) -> Option<DeviceSnapshot>;

    /// Writes the level metric and bumps the update time.
    ///
    /// Returns `false` if the device is not registered.
    fn set_level(&self, id: &DeviceId, level: Level) -> bool;

    /// Writes the liveness flag. Returns `false` if the device is not registered.
    fn set_failed(&self, id: &DeviceId, failed: bool) -> bool;

    /// Invokes the device's command handler.
    ///
    /// Returns `false` if the device is not registered.
    fn perform_command(&self, id: &DeviceId, command: DeviceCommand) -> bool;

    /// Returns copies of all registered devices.
    fn devices(&self) -> Vec<DeviceSnapshot>;

    /// Returns copies of all devices matching `predicate`.
    fn filter(&self, predicate: &dyn Fn(&DeviceSnapshot) -> bool) -> Vec<DeviceSnapshot> {
        self.devices().into_iter().filter(|d| predicate(d)).collect()
    }
}
