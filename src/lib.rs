// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `httpdev_lib` - HTTP endpoints as virtual home-automation devices.
//!
//! This library binds arbitrary HTTP resources to virtual devices held by a
//! host's device registry, and keeps stale switches fresh on a schedule.
//!
//! # Components
//!
//! - **Polling adapter** ([`adapter::PollingAdapter`]): polls a getter URL to
//!   read a device level, sends setter requests for commands, marks the
//!   device dead after repeated failures and slows its polling until the
//!   device answers again.
//! - **Switch refresher** ([`refresh::SwitchRefresher`]): on a calendar
//!   schedule, sends `update` to every switch that did not change since the
//!   previous firing.
//! - **Plugin loader** ([`plugin::PluginLoader`]): instantiates both from
//!   the host's JSON module configuration.
//!
//! The host services are traits with a default implementation each:
//!
//! | Service | Trait | Default |
//! |---------|-------|---------|
//! | Device storage | [`registry::DeviceRegistry`] | [`registry::MemoryRegistry`] |
//! | Recurring tasks | [`scheduler::Scheduler`] | [`scheduler::CronScheduler`] |
//! | User notifications | [`notify::Notifier`] | [`notify::TracingNotifier`] |
//! | HTTP | [`protocol::Transport`] | `protocol::HttpTransport` (feature `http`) |
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use httpdev_lib::adapter::PollingAdapter;
//! use httpdev_lib::config::{AdapterConfig, GetterConfig};
//! use httpdev_lib::notify::TracingNotifier;
//! use httpdev_lib::protocol::HttpTransport;
//! use httpdev_lib::registry::{DeviceRegistry, MemoryRegistry};
//! use httpdev_lib::types::{DeviceCommand, DeviceType};
//!
//! #[tokio::main]
//! async fn main() -> httpdev_lib::Result<()> {
//!     let registry = Arc::new(MemoryRegistry::new());
//!
//!     let config = AdapterConfig::new(DeviceType::SensorMultilevel)
//!         .with_title("Cellar temperature")
//!         .with_getter(
//!             DeviceType::SensorMultilevel,
//!             GetterConfig::new("http://192.168.1.40/temp").with_poll_interval(Duration::from_secs(30)),
//!         )
//!         .with_sensor_multilevel_scale("°C");
//!
//!     let adapter = PollingAdapter::new(
//!         "1",
//!         config,
//!         HttpTransport::new()?,
//!         registry.clone(),
//!         Arc::new(TracingNotifier),
//!     )?;
//!     adapter.start();
//!
//!     // Force a refresh through the registry
//!     registry.perform_command(adapter.device_id(), DeviceCommand::Update);
//!
//!     adapter.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Host Configuration
//!
//! ```no_run
//! use std::sync::Arc;
//! use httpdev_lib::notify::TracingNotifier;
//! use httpdev_lib::plugin::{ModuleContext, PluginLoader};
//! use httpdev_lib::registry::MemoryRegistry;
//! use httpdev_lib::scheduler::CronScheduler;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> httpdev_lib::Result<()> {
//!     let scheduler = Arc::new(CronScheduler::new());
//!     scheduler.start();
//!
//!     let context = ModuleContext::new(
//!         Arc::new(MemoryRegistry::new()),
//!         scheduler,
//!         Arc::new(TracingNotifier),
//!     );
//!     let loader = PluginLoader::new();
//!
//!     let pump = loader.instantiate(
//!         "HTTPDevice",
//!         "7",
//!         &context,
//!         &json!({
//!             "deviceType": "switchBinary",
//!             "getter_switchBinary": "http://pump.local/state",
//!             "getterPollInterval_switchBinary": 10,
//!             "setterOn_switchBinary": "http://pump.local/relay?state=1",
//!             "setterOff_switchBinary": "http://pump.local/relay?state=0",
//!             "maxAttempts": 3,
//!             "pollIntervalTimeout": 300
//!         }),
//!     )?;
//!     let refresher = loader.instantiate("SwitchPolling", "8", &context, &json!({ "period": 15 }))?;
//!
//!     refresher.stop();
//!     pump.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The library emits [`tracing`] events and never installs a subscriber.

pub mod adapter;
pub mod config;
pub mod error;
pub mod event;
pub mod notify;
pub mod plugin;
pub mod protocol;
pub mod refresh;
pub mod registry;
pub mod scheduler;
pub mod types;

pub use adapter::{PollMode, PollableDevice, PollingAdapter};
pub use config::{AdapterConfig, GetterConfig, RefresherConfig, ResponseParser};
pub use error::{ConfigError, Error, ParseError, ProtocolError, RegistryError, Result};
pub use event::{DeviceEvent, DeviceId, EventBus};
pub use notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
pub use plugin::{Module, ModuleContext, PluginLoader};
#[cfg(feature = "http")]
pub use protocol::HttpTransport;
pub use protocol::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use refresh::SwitchRefresher;
pub use registry::{DeviceHandle, DeviceRegistry, DeviceSnapshot, MemoryRegistry};
pub use scheduler::{CronScheduler, CronSpec, Scheduler};
pub use types::{Action, DeviceCommand, DeviceType, Level};
