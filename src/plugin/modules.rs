// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Built-in modules.

use serde_json::Value;

#[cfg(feature = "http")]
use crate::adapter::PollingAdapter;
#[cfg(feature = "http")]
use crate::config::AdapterConfig;
use crate::config::RefresherConfig;
use crate::error::Result;
#[cfg(feature = "http")]
use crate::protocol::HttpTransport;
use crate::refresh::SwitchRefresher;

use super::{Module, ModuleContext};

#[cfg(feature = "http")]
pub(super) const HTTP_DEVICE: &str = "HTTPDevice";
pub(super) const SWITCH_POLLING: &str = "SwitchPolling";

/// One HTTP-backed virtual device.
#[cfg(feature = "http")]
#[derive(Debug)]
pub struct HttpDeviceModule {
    adapter: PollingAdapter<HttpTransport>,
}

#[cfg(feature = "http")]
impl HttpDeviceModule {
    /// Builds the adapter from the flat JSON configuration and starts polling.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the HTTP client
    /// cannot be built or the registry refuses the device.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn create(
        module_id: &str,
        context: &ModuleContext,
        config: &Value,
    ) -> Result<Box<dyn Module>> {
        let config = AdapterConfig::from_module_json(config)?;
        let transport = HttpTransport::builder()
            .timeout(config.request_timeout())
            .build()?;
        let adapter = PollingAdapter::new(
            module_id,
            config,
            transport,
            context.registry.clone(),
            context.notifier.clone(),
        )?;
        adapter.start();
        Ok(Box::new(Self { adapter }))
    }

    /// Returns the running adapter.
    #[must_use]
    pub fn adapter(&self) -> &PollingAdapter<HttpTransport> {
        &self.adapter
    }
}

#[cfg(feature = "http")]
impl Module for HttpDeviceModule {
    fn name(&self) -> &str {
        HTTP_DEVICE
    }

    fn id(&self) -> &str {
        self.adapter.module_id()
    }

    fn stop(&self) {
        self.adapter.shutdown();
    }
}

/// Periodic refresh of stale switches.
#[derive(Debug)]
pub struct SwitchPollingModule {
    module_id: String,
    refresher: SwitchRefresher,
}

impl SwitchPollingModule {
    /// Parses `{ "period", "devices" }` and schedules the refresher.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is malformed or the period is zero.
    pub fn create(
        module_id: &str,
        context: &ModuleContext,
        config: &Value,
    ) -> Result<Box<dyn Module>> {
        let config = RefresherConfig::from_module_json(config)?;
        let refresher = SwitchRefresher::start(
            module_id,
            config,
            context.registry.clone(),
            context.scheduler.clone(),
        )?;
        Ok(Box::new(Self {
            module_id: module_id.to_string(),
            refresher,
        }))
    }

    /// Returns the running refresher.
    #[must_use]
    pub fn refresher(&self) -> &SwitchRefresher {
        &self.refresher
    }
}

impl Module for SwitchPollingModule {
    fn name(&self) -> &str {
        SWITCH_POLLING
    }

    fn id(&self) -> &str {
        &self.module_id
    }

    fn stop(&self) {
        self.refresher.stop();
    }
}
