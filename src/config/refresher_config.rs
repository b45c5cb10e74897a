// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch refresher configuration.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::event::DeviceId;
use crate::scheduler::CronSpec;

/// Configuration of a [`SwitchRefresher`](crate::refresh::SwitchRefresher).
///
/// The JSON form is `{ "period": <minutes>, "devices": [<excluded ids>] }`.
///
/// # Examples
///
/// ```
/// use httpdev_lib::config::RefresherConfig;
/// use serde_json::json;
///
/// let config: RefresherConfig = serde_json::from_value(json!({
///     "period": 120,
///     "devices": ["ZWayVDev_2-0-37", "ZWayVDev_2-0-37"]
/// }))
/// .unwrap();
///
/// assert_eq!(config.period_minutes(), 120);
/// assert_eq!(config.excluded().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefresherConfig {
    #[serde(rename = "period")]
    period_minutes: u32,
    #[serde(rename = "devices", default)]
    excluded: BTreeSet<DeviceId>,
}

impl RefresherConfig {
    /// Creates a configuration refreshing every `period_minutes` minutes.
    #[must_use]
    pub fn new(period_minutes: u32) -> Self {
        Self {
            period_minutes,
            excluded: BTreeSet::new(),
        }
    }

    /// Excludes a device from refreshing.
    #[must_use]
    pub fn with_excluded(mut self, id: impl Into<DeviceId>) -> Self {
        self.excluded.insert(id.into());
        self
    }

    /// Returns the refresh period in minutes.
    #[must_use]
    pub fn period_minutes(&self) -> u32 {
        self.period_minutes
    }

    /// Returns the excluded devices.
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<DeviceId> {
        &self.excluded
    }

    /// Returns `true` if `id` is excluded.
    #[must_use]
    pub fn is_excluded(&self, id: &DeviceId) -> bool {
        self.excluded.contains(id)
    }

    /// Converts the period into the schedule the refresher registers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero period.
    pub fn cron_spec(&self) -> Result<CronSpec, ConfigError> {
        CronSpec::from_period_minutes(self.period_minutes)
    }

    /// Parses the JSON module configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is malformed or the period is zero.
    pub fn from_module_json(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config = Self::deserialize(value)?;
        config.cron_spec()?;
        Ok(config)
    }
}
