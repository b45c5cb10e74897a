// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic refresh of stale switch devices.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::config::RefresherConfig;
use crate::error::Result;
use crate::event::DeviceId;
use crate::registry::DeviceRegistry;
use crate::scheduler::Scheduler;
use crate::types::DeviceCommand;

struct RefresherInner {
    task_name: String,
    config: RefresherConfig,
    registry: Arc<dyn DeviceRegistry>,
    scheduler: Arc<dyn Scheduler>,
    last_run: Mutex<Option<DateTime<Utc>>>,
    stopped: AtomicBool,
}

/// Sends `update` to every switch that did not change since the previous
/// firing.
///
/// The refresher registers one scheduled task. On each firing it selects
/// the binary and multilevel switches that are not excluded and whose
/// update time is at or before the previous firing, and sends each of them
/// an `update` command without waiting for the resulting polls. The very
/// first firing only records the marker.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use httpdev_lib::config::RefresherConfig;
/// use httpdev_lib::refresh::SwitchRefresher;
/// use httpdev_lib::registry::MemoryRegistry;
/// use httpdev_lib::scheduler::CronScheduler;
///
/// let scheduler = Arc::new(CronScheduler::new());
/// let refresher = SwitchRefresher::start(
///     "5",
///     RefresherConfig::new(15).with_excluded("ZWayVDev_4-0-37"),
///     Arc::new(MemoryRegistry::new()),
///     scheduler.clone(),
/// )
/// .unwrap();
///
/// assert_eq!(scheduler.len(), 1);
/// refresher.stop();
/// assert!(scheduler.is_empty());
/// ```
pub struct SwitchRefresher {
    inner: Arc<RefresherInner>,
}

impl SwitchRefresher {
    /// Registers the refresh task with `scheduler`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the period is zero.
    pub fn start(
        module_id: &str,
        config: RefresherConfig,
        registry: Arc<dyn DeviceRegistry>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Result<Self> {
        let spec = config.cron_spec()?;
        let inner = Arc::new(RefresherInner {
            task_name: format!("SwitchPolling.poll.{module_id}"),
            config,
            registry,
            scheduler,
            last_run: Mutex::new(None),
            stopped: AtomicBool::new(false),
        });

        let weak = Arc::downgrade(&inner);
        inner.scheduler.add_task(
            &inner.task_name,
            spec,
            Arc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.sweep_at(Utc::now());
                }
            }),
        );
        tracing::info!(
            task = %inner.task_name,
            schedule = %spec,
            excluded = inner.config.excluded().len(),
            "Switch refresher started"
        );

        Ok(Self { inner })
    }

    /// Runs one sweep at the current time.
    pub fn sweep(&self) -> Vec<DeviceId> {
        self.inner.sweep_at(Utc::now())
    }

    /// Runs one sweep as if fired at `now` and returns the refreshed devices.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Vec<DeviceId> {
        self.inner.sweep_at(now)
    }

    /// Returns the time of the previous sweep.
    #[must_use]
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_run.lock()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RefresherConfig {
        &self.inner.config
    }

    /// Returns the name of the scheduled task.
    #[must_use]
    pub fn task_name(&self) -> &str {
        &self.inner.task_name
    }

    /// Unregisters the scheduled task. Idempotent.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.scheduler.remove_task(&self.inner.task_name);
        tracing::info!(task = %self.inner.task_name, "Switch refresher stopped");
    }
}

impl fmt::Debug for SwitchRefresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchRefresher")
            .field("task_name", &self.inner.task_name)
            .field("config", &self.inner.config)
            .field("last_run", &self.last_run())
            .finish_non_exhaustive()
    }
}

impl RefresherInner {
    fn sweep_at(&self, now: DateTime<Utc>) -> Vec<DeviceId> {
        if self.stopped.load(Ordering::SeqCst) {
            return Vec::new();
        }
        let Some(previous) = self.last_run.lock().replace(now) else {
            tracing::debug!(task = %self.task_name, "First run, marker recorded");
            return Vec::new();
        };

        let stale: Vec<DeviceId> = self
            .registry
            .filter(&|device| {
                device.device_type.is_switch()
                    && !self.config.is_excluded(&device.id)
                    && device.update_time <= previous
            })
            .into_iter()
            .map(|device| device.id)
            .collect();

        for id in &stale {
            if !self.registry.perform_command(id, DeviceCommand::Update) {
                tracing::debug!(device_id = %id, "Device vanished before refresh");
            }
        }
        tracing::debug!(task = %self.task_name, refreshed = stale.len(), "Refresh sweep done");
        stale
    }
}
