// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for registry changes.
//!
//! [`MemoryRegistry`](crate::registry::MemoryRegistry) publishes a
//! [`DeviceEvent`] on its [`EventBus`] whenever a device is created, removed
//! or has a metric written. The bus uses tokio's broadcast channel so any
//! number of host components can follow device state.
//!
//! # Examples
//!
//! ```
//! use httpdev_lib::event::{DeviceEvent, DeviceId, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::device_created(DeviceId::from("HTTP_Device_switchBinary_1")));
//! ```

mod device_event;
mod device_id;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_id::DeviceId;
pub use event_bus::EventBus;
