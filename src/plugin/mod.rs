// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Module instantiation from host configuration.
//!
//! A host keeps a [`PluginLoader`] and asks it to instantiate modules by
//! name with their JSON configuration. The loader ships two built-in
//! factories:
//!
//! | Name | Module |
//! |------|--------|
//! | `HTTPDevice` | a [`PollingAdapter`](crate::adapter::PollingAdapter) over [`HttpTransport`](crate::protocol::HttpTransport) (requires the `http` feature) |
//! | `SwitchPolling` | a [`SwitchRefresher`](crate::refresh::SwitchRefresher) |
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use httpdev_lib::notify::TracingNotifier;
//! use httpdev_lib::plugin::{ModuleContext, PluginLoader};
//! use httpdev_lib::registry::MemoryRegistry;
//! use httpdev_lib::scheduler::CronScheduler;
//! use serde_json::json;
//!
//! let context = ModuleContext::new(
//!     Arc::new(MemoryRegistry::new()),
//!     Arc::new(CronScheduler::new()),
//!     Arc::new(TracingNotifier),
//! );
//! let loader = PluginLoader::new();
//!
//! let module = loader
//!     .instantiate("SwitchPolling", "3", &context, &json!({ "period": 60 }))
//!     .unwrap();
//! assert_eq!(module.name(), "SwitchPolling");
//! module.stop();
//! ```

mod modules;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::registry::DeviceRegistry;
use crate::scheduler::Scheduler;

#[cfg(feature = "http")]
pub use modules::HttpDeviceModule;
pub use modules::SwitchPollingModule;

/// A running module instance.
pub trait Module: Send + Sync {
    /// Returns the factory name the module was created from.
    fn name(&self) -> &str;

    /// Returns the module instance identity.
    fn id(&self) -> &str;

    /// Releases everything the module registered. Idempotent.
    fn stop(&self);
}

/// Host services handed to module factories.
#[derive(Clone)]
pub struct ModuleContext {
    /// Device registry.
    pub registry: Arc<dyn DeviceRegistry>,
    /// Recurring task scheduler.
    pub scheduler: Arc<dyn Scheduler>,
    /// Notification sink.
    pub notifier: Arc<dyn Notifier>,
}

impl ModuleContext {
    /// Bundles the host services.
    #[must_use]
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        scheduler: Arc<dyn Scheduler>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            scheduler,
            notifier,
        }
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext").finish_non_exhaustive()
    }
}

/// Builds a module from its instance identity and JSON configuration.
pub type ModuleFactory =
    Arc<dyn Fn(&str, &ModuleContext, &Value) -> Result<Box<dyn Module>> + Send + Sync>;

/// Named module factories.
pub struct PluginLoader {
    factories: HashMap<String, ModuleFactory>,
}

impl PluginLoader {
    /// Creates a loader with the built-in factories.
    #[must_use]
    pub fn new() -> Self {
        let mut loader = Self::empty();
        #[cfg(feature = "http")]
        loader.register(modules::HTTP_DEVICE, Arc::new(modules::HttpDeviceModule::create));
        loader.register(
            modules::SWITCH_POLLING,
            Arc::new(modules::SwitchPollingModule::create),
        );
        loader
    }

    /// Creates a loader without any factory.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers `factory` under `name`, replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, factory: ModuleFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Returns `true` if a factory is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered factory names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiates the module registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownModule`] if no factory is registered under
    /// `name`, or the factory's own error.
    pub fn instantiate(
        &self,
        name: &str,
        module_id: &str,
        context: &ModuleContext,
        config: &Value,
    ) -> Result<Box<dyn Module>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))?;
        let module = factory(module_id, context, config)?;
        tracing::info!(module = name, module_id, "Module instantiated");
        Ok(module)
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginLoader")
            .field("factories", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::TracingNotifier;
    use crate::registry::MemoryRegistry;
    use crate::scheduler::CronScheduler;
    use serde_json::json;

    fn context() -> ModuleContext {
        ModuleContext::new(
            Arc::new(MemoryRegistry::new()),
            Arc::new(CronScheduler::new()),
            Arc::new(TracingNotifier),
        )
    }

    struct Noop(String);

    impl Module for Noop {
        fn name(&self) -> &str {
            "Noop"
        }

        fn id(&self) -> &str {
            &self.0
        }

        fn stop(&self) {}
    }

    #[test]
    fn unknown_module() {
        let loader = PluginLoader::new();
        let result = loader.instantiate("ZWave", "1", &context(), &json!({}));
        assert!(matches!(result, Err(Error::UnknownModule(name)) if name == "ZWave"));
    }

    #[test]
    fn builtin_names() {
        let loader = PluginLoader::new();
        assert!(loader.contains("SwitchPolling"));
        #[cfg(feature = "http")]
        assert_eq!(loader.names(), vec!["HTTPDevice", "SwitchPolling"]);
        assert!(PluginLoader::empty().names().is_empty());
    }

    #[test]
    fn custom_factory() {
        let mut loader = PluginLoader::empty();
        loader.register(
            "Noop",
            Arc::new(|id: &str, _: &ModuleContext, _: &Value| {
                Ok(Box::new(Noop(id.to_string())) as Box<dyn Module>)
            }),
        );

        let module = loader.instantiate("Noop", "9", &context(), &json!(null)).unwrap();
        assert_eq!(module.id(), "9");
    }

    #[test]
    fn factory_errors_propagate() {
        let loader = PluginLoader::new();
        let result = loader.instantiate("SwitchPolling", "1", &context(), &json!({ "period": 0 }));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
