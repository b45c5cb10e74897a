// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP polling adapters.
//!
//! A [`PollingAdapter`] exposes an HTTP endpoint as a virtual device:
//!
//! - **Poll cycle**: read the getter URL, parse the level, write it to the
//!   device and update the liveness bookkeeping.
//! - **Act cycle**: resolve the setter template for an action, substitute
//!   the `$$` placeholder and send it.
//! - **Adaptive scheduling**: poll at the getter interval while the device
//!   answers ([`PollMode::Normal`]) and at the failure timeout once it is
//!   dead ([`PollMode::Degraded`]).
//!
//! Commands reach the adapter through the registry's command handler and
//! are mapped to operations by [`dispatch`].

mod dispatch;
mod polling;
mod request;

pub use dispatch::{MULTILEVEL_OFF, MULTILEVEL_ON, Operation, dispatch};
pub use polling::{ActOutcome, DEVICE_ID_PREFIX, PollMode, PollOutcome, PollingAdapter};
pub use request::{PLACEHOLDER, substitute};

use crate::event::DeviceId;
use crate::types::{Action, DeviceCommand, DeviceType, Level};

/// A device whose state is read by polling and changed by requests.
pub trait PollableDevice: Send + Sync {
    /// Returns the registry identifier.
    fn device_id(&self) -> &DeviceId;

    /// Returns the device kind.
    fn device_type(&self) -> DeviceType;

    /// Runs one poll cycle.
    fn poll(&self) -> impl Future<Output = PollOutcome> + Send;

    /// Runs one act cycle.
    fn act(
        &self,
        action: Action,
        value: Option<Level>,
        self_value: Option<Level>,
    ) -> impl Future<Output = ActOutcome> + Send;

    /// Dispatches a command without waiting for its operation.
    fn handle_command(&self, command: DeviceCommand);

    /// Stops the device. Calling it more than once has no effect.
    fn shutdown(&self);
}
