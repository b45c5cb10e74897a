// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The polling adapter.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::{AdapterConfig, GetterConfig};
use crate::error::{ProtocolError, Result};
use crate::event::DeviceId;
use crate::notify::{Notification, Notifier};
use crate::protocol::{HttpResponse, Transport};
use crate::registry::{CommandHandler, DeviceDescriptor, DeviceHandle, DeviceRegistry};
use crate::types::{Action, DeviceCommand, DeviceType, Level};

use super::PollableDevice;
use super::dispatch::{Operation, dispatch};
use super::request::{act_request, poll_request, substitute};

/// Prefix of the registry identifiers created by adapters.
pub const DEVICE_ID_PREFIX: &str = "HTTP_Device";

/// Polling cadence of an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PollMode {
    /// Polling at the getter's interval.
    #[default]
    Normal,
    /// Polling at the failure timeout while the device is dead.
    Degraded,
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// A level was read and written to the device.
    Updated(Level),
    /// A level was read but matched the stored one and was not written.
    Unchanged(Level),
    /// The endpoint answered but no level could be extracted.
    Unparsable,
    /// The request failed.
    Failed,
    /// No getter is configured for the device type.
    NoGetter,
    /// The adapter was shut down before or during the cycle.
    Discarded,
}

/// Result of one act cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActOutcome {
    /// The setter request succeeded.
    Sent,
    /// The setter request failed.
    Failed,
    /// No setter is configured for the action.
    NoSetter,
    /// The adapter was shut down before the cycle started.
    Discarded,
}

struct RuntimeState {
    failed_attempts: u32,
    mode: PollMode,
    timer: Option<JoinHandle<()>>,
    stopped: bool,
}

struct Inner<T> {
    module_id: String,
    config: AdapterConfig,
    transport: T,
    device: DeviceHandle,
    notifier: Arc<dyn Notifier>,
    runtime: Mutex<Option<Handle>>,
    state: Mutex<RuntimeState>,
}

/// Binds one virtual device to a remote HTTP resource.
///
/// The adapter registers its device on construction, polls the configured
/// getter on a timer, sends setter requests for commands and tracks the
/// device's liveness. After `max_attempts` consecutive failed polls the
/// device is marked dead and polled at `poll_interval_timeout` until the
/// next successful poll.
///
/// Clones share the same adapter.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use httpdev_lib::adapter::PollingAdapter;
/// use httpdev_lib::config::{AdapterConfig, GetterConfig};
/// use httpdev_lib::notify::TracingNotifier;
/// use httpdev_lib::protocol::HttpTransport;
/// use httpdev_lib::registry::MemoryRegistry;
/// use httpdev_lib::types::{Action, DeviceType};
///
/// # #[tokio::main]
/// # async fn main() -> httpdev_lib::Result<()> {
/// let config = AdapterConfig::new(DeviceType::SwitchBinary)
///     .with_getter(
///         DeviceType::SwitchBinary,
///         GetterConfig::new("http://relay.local/state").with_poll_interval(Duration::from_secs(10)),
///     )
///     .with_setter(Action::On, DeviceType::SwitchBinary, "http://relay.local/on")
///     .with_setter(Action::Off, DeviceType::SwitchBinary, "http://relay.local/off");
///
/// let adapter = PollingAdapter::new(
///     "12",
///     config,
///     HttpTransport::new()?,
///     Arc::new(MemoryRegistry::new()),
///     Arc::new(TracingNotifier),
/// )?;
/// adapter.start();
/// # Ok(())
/// # }
/// ```
pub struct PollingAdapter<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for PollingAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> PollingAdapter<T> {
    /// Creates the adapter and registers its device.
    ///
    /// The device is registered as `HTTP_Device_<type>_<module_id>` with
    /// the type defaults for icon, probe type and initial level. Polling
    /// starts with [`start`](Self::start).
    ///
    /// When called inside a tokio runtime, that runtime also runs the
    /// operations of commands dispatched from threads outside it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is invalid, or [`Error::Registry`](crate::Error::Registry) if the
    /// registry refuses the device.
    pub fn new(
        module_id: impl Into<String>,
        config: AdapterConfig,
        transport: T,
        registry: Arc<dyn DeviceRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate()?;
        let module_id = module_id.into();
        let id = DeviceId::composite(DEVICE_ID_PREFIX, config.device_type(), &module_id);
        let descriptor = descriptor(&config, id.clone(), &module_id);

        let inner = Arc::new(Inner {
            module_id,
            config,
            transport,
            device: DeviceHandle::new(Arc::clone(&registry), id),
            notifier,
            runtime: Mutex::new(Handle::try_current().ok()),
            state: Mutex::new(RuntimeState {
                failed_attempts: 0,
                mode: PollMode::Normal,
                timer: None,
                stopped: false,
            }),
        });

        let weak = Arc::downgrade(&inner);
        let handler: CommandHandler = Arc::new(move |command: DeviceCommand| {
            if let Some(inner) = weak.upgrade() {
                Inner::spawn_command(&inner, command);
            }
        });
        registry.create(descriptor, handler)?;
        tracing::info!(
            device_id = %inner.device.id(),
            device_type = %inner.config.device_type(),
            "Device registered"
        );

        Ok(Self { inner })
    }

    /// Arms the normal polling timer and runs the first poll cycle.
    ///
    /// Does nothing if no getter is configured for the device type, or once
    /// the adapter is shut down. Records the current runtime for command
    /// dispatch if none was captured at construction.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) {
        self.inner
            .runtime
            .lock()
            .get_or_insert_with(Handle::current);
        if self.inner.getter().is_none() {
            tracing::debug!(device_id = %self.inner.device.id(), "No getter, polling disabled");
            return;
        }
        {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            Inner::arm_timer(&self.inner, &mut state, PollMode::Normal);
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.poll().await;
        });
    }

    /// Runs one poll cycle and applies its result.
    pub async fn poll(&self) -> PollOutcome {
        self.inner.poll().await
    }

    /// Runs one act cycle.
    ///
    /// `value` is substituted into the setter template. `self_value` is
    /// written to the device when no setter exists or `update_on_action` is
    /// set.
    pub async fn act(
        &self,
        action: Action,
        value: Option<Level>,
        self_value: Option<Level>,
    ) -> ActOutcome {
        self.inner.act(action, value, self_value).await
    }

    /// Dispatches a command and runs the resulting operation in the background.
    ///
    /// Commands the device kind does not support are ignored.
    pub fn handle_command(&self, command: DeviceCommand) {
        Inner::spawn_command(&self.inner, command);
    }

    /// Stops polling and removes the device. Idempotent.
    pub fn shutdown(&self) {
        let timer = {
            let mut state = self.inner.state.lock();
            if state.stopped {
                return;
            }
            state.stopped = true;
            state.timer.take()
        };
        if let Some(timer) = timer {
            timer.abort();
        }
        self.inner.device.remove();
        tracing::info!(device_id = %self.inner.device.id(), "Adapter stopped");
    }

    /// Returns the registry identifier of the device.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        self.inner.device.id()
    }

    /// Returns the device kind.
    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        self.inner.config.device_type()
    }

    /// Returns a handle to the adapter's device.
    #[must_use]
    pub fn device(&self) -> &DeviceHandle {
        &self.inner.device
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    /// Returns the identity of the owning module.
    #[must_use]
    pub fn module_id(&self) -> &str {
        &self.inner.module_id
    }

    /// Returns the current polling cadence.
    #[must_use]
    pub fn poll_mode(&self) -> PollMode {
        self.inner.state.lock().mode
    }

    /// Returns the number of consecutive failed polls.
    #[must_use]
    pub fn failed_attempts(&self) -> u32 {
        self.inner.state.lock().failed_attempts
    }

    /// Returns the interval of the current polling cadence, if polling.
    #[must_use]
    pub fn current_interval(&self) -> Option<Duration> {
        let mode = {
            let state = self.inner.state.lock();
            if state.timer.is_none() {
                return None;
            }
            state.mode
        };
        self.inner.interval(mode)
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has run.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock().stopped
    }
}

impl<T: Transport> fmt::Debug for PollingAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("PollingAdapter")
            .field("device_id", self.inner.device.id())
            .field("mode", &state.mode)
            .field("failed_attempts", &state.failed_attempts)
            .field("stopped", &state.stopped)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> PollableDevice for PollingAdapter<T> {
    fn device_id(&self) -> &DeviceId {
        PollingAdapter::device_id(self)
    }

    fn device_type(&self) -> DeviceType {
        PollingAdapter::device_type(self)
    }

    fn poll(&self) -> impl Future<Output = PollOutcome> + Send {
        PollingAdapter::poll(self)
    }

    fn act(
        &self,
        action: Action,
        value: Option<Level>,
        self_value: Option<Level>,
    ) -> impl Future<Output = ActOutcome> + Send {
        PollingAdapter::act(self, action, value, self_value)
    }

    fn handle_command(&self, command: DeviceCommand) {
        PollingAdapter::handle_command(self, command);
    }

    fn shutdown(&self) {
        PollingAdapter::shutdown(self);
    }
}

impl<T: Transport> Inner<T> {
    fn getter(&self) -> Option<&GetterConfig> {
        self.config.getter(self.config.device_type())
    }

    fn interval(&self, mode: PollMode) -> Option<Duration> {
        match mode {
            PollMode::Normal => self.getter().map(GetterConfig::poll_interval),
            PollMode::Degraded => Some(self.config.poll_interval_timeout()),
        }
    }

    fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    fn spawn_command(this: &Arc<Self>, command: DeviceCommand) {
        let device_type = this.config.device_type();
        let Some(operation) = dispatch(device_type, command) else {
            tracing::debug!(device_id = %this.device.id(), %command, "Command ignored");
            return;
        };
        let Some(runtime) = Handle::try_current()
            .ok()
            .or_else(|| this.runtime.lock().clone())
        else {
            tracing::warn!(device_id = %this.device.id(), %command, "No runtime, command dropped");
            return;
        };

        let inner = Arc::clone(this);
        runtime.spawn(async move {
            match operation {
                Operation::Poll => {
                    inner.poll().await;
                }
                Operation::Act {
                    action,
                    value,
                    self_value,
                } => {
                    inner.act(action, value, self_value).await;
                }
            }
        });
    }

    /// Replaces the polling timer with one ticking at `mode`'s interval.
    ///
    /// Must be called with the state lock held so the old timer is aborted
    /// before the new one exists.
    fn arm_timer(this: &Arc<Self>, state: &mut RuntimeState, mode: PollMode) {
        if state.stopped {
            return;
        }
        let Some(period) = this.interval(mode) else {
            return;
        };
        if let Some(previous) = state.timer.take() {
            previous.abort();
        }
        state.mode = mode;
        state.timer = Some(tokio::spawn(run_timer(Arc::downgrade(this), period)));
        tracing::debug!(
            device_id = %this.device.id(),
            ?mode,
            interval_secs = period.as_secs_f64(),
            "Polling timer armed"
        );
    }

    async fn poll(self: &Arc<Self>) -> PollOutcome {
        if self.is_stopped() {
            return PollOutcome::Discarded;
        }
        let Some(getter) = self.getter() else {
            return PollOutcome::NoGetter;
        };

        let request = poll_request(&self.config, getter);
        tracing::debug!(device_id = %self.device.id(), url = getter.url(), "Polling device");
        let result = self.transport.request(request).await;

        if self.is_stopped() {
            tracing::debug!(device_id = %self.device.id(), "Discarding response after shutdown");
            return PollOutcome::Discarded;
        }
        match result {
            Ok(response) => self.poll_succeeded(getter, &response),
            Err(e) => self.poll_failed(getter, &e),
        }
    }

    fn poll_succeeded(self: &Arc<Self>, getter: &GetterConfig, response: &HttpResponse) -> PollOutcome {
        let device_type = self.config.device_type();
        let parsed = match getter.parser() {
            Some(parser) => parser.parse(response),
            None => Level::parse_default(response.body(), device_type),
        };

        let outcome = match parsed {
            Ok(level)
                if self.config.skip_event_if_same_value() && self.device.level() == Some(level) =>
            {
                PollOutcome::Unchanged(level)
            }
            Ok(level) => {
                self.device.set_level(level);
                PollOutcome::Updated(level)
            }
            Err(e) => {
                tracing::debug!(device_id = %self.device.id(), error = %e, "Response not usable");
                PollOutcome::Unparsable
            }
        };

        let revived = {
            let mut state = self.state.lock();
            state.failed_attempts = 0;
            let revived = self.device.is_failed();
            if revived {
                self.device.set_failed(false);
            }
            Self::arm_timer(self, &mut state, PollMode::Normal);
            revived
        };

        if revived {
            let title = self.device.title();
            tracing::info!(device_id = %self.device.id(), "Device is alive again");
            self.notify(Notification::info(
                format!("Device {title} is now alive."),
                &self.module_id,
            ));
        }
        outcome
    }

    fn poll_failed(self: &Arc<Self>, getter: &GetterConfig, error: &ProtocolError) -> PollOutcome {
        tracing::warn!(
            device_id = %self.device.id(),
            url = getter.url(),
            error = %error,
            "Can not make request"
        );

        let died = {
            let mut state = self.state.lock();
            state.failed_attempts = state.failed_attempts.saturating_add(1);
            if state.failed_attempts < self.config.max_attempts() {
                false
            } else {
                let died = !self.device.is_failed();
                if died {
                    self.device.set_failed(true);
                }
                Self::arm_timer(self, &mut state, PollMode::Degraded);
                died
            }
        };

        if died {
            let title = self.device.title();
            tracing::info!(device_id = %self.device.id(), "Device is dead");
            self.notify(Notification::error(
                format!("Device {title} is now dead."),
                &self.module_id,
            ));
        }
        PollOutcome::Failed
    }

    async fn act(
        self: &Arc<Self>,
        action: Action,
        value: Option<Level>,
        self_value: Option<Level>,
    ) -> ActOutcome {
        if self.is_stopped() {
            return ActOutcome::Discarded;
        }
        let device_type = self.config.device_type();
        let setter = self.config.setter(action, device_type);

        if setter.is_none() || self.config.update_on_action() {
            if let Some(level) = self_value {
                self.device.set_level(level);
            }
        }

        let Some(template) = setter else {
            return ActOutcome::NoSetter;
        };
        let url = substitute(template, value);
        let request = act_request(&self.config, url.clone(), value);
        tracing::debug!(device_id = %self.device.id(), %action, url = %url, "Sending setter request");

        match self.transport.request(request).await {
            Ok(_) => ActOutcome::Sent,
            Err(e) => {
                tracing::warn!(device_id = %self.device.id(), url = %url, error = %e, "Setter request failed");
                self.notify(Notification::error(
                    format!("Request failed: {e} ({url})"),
                    &self.module_id,
                ));
                ActOutcome::Failed
            }
        }
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        if let Some(timer) = self.state.get_mut().timer.take() {
            timer.abort();
        }
    }
}

/// Spawns a detached poll every `period` until the adapter is gone.
async fn run_timer<T: Transport>(adapter: Weak<Inner<T>>, period: Duration) {
    let Some(first) = Instant::now().checked_add(period) else {
        tracing::error!(interval_secs = period.as_secs_f64(), "Polling interval out of range");
        return;
    };
    let mut ticker = tokio::time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = adapter.upgrade() else {
            break;
        };
        tokio::spawn(async move {
            inner.poll().await;
        });
    }
}

/// Builds the registry descriptor with the per-type defaults.
fn descriptor(config: &AdapterConfig, id: DeviceId, module_id: &str) -> DeviceDescriptor {
    let device_type = config.device_type();
    let (icon, probe_type, scale_title) = match device_type {
        DeviceType::SensorBinary => {
            let icon = config.sensor_binary_icon().to_string();
            let probe_type = if icon == "door" {
                "door-window".to_string()
            } else {
                icon.clone()
            };
            (icon, probe_type, String::new())
        }
        DeviceType::SensorMultilevel => {
            let icon = config.sensor_multilevel_icon().to_string();
            (
                icon.clone(),
                icon,
                config.sensor_multilevel_scale().to_string(),
            )
        }
        DeviceType::SwitchBinary => ("switch".to_string(), String::new(), String::new()),
        DeviceType::SwitchMultilevel => ("multilevel".to_string(), String::new(), String::new()),
        DeviceType::ToggleButton => ("gesture".to_string(), String::new(), String::new()),
    };

    DeviceDescriptor {
        id,
        module_id: module_id.to_string(),
        device_type,
        probe_type,
        title: config
            .title()
            .map_or_else(|| format!("HTTP Device {module_id}"), str::to_string),
        icon,
        level: device_type.initial_level(),
        scale_title,
    }
}
