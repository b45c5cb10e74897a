// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named recurring tasks.
//!
//! Components register work under a name with a [`CronSpec`]; the
//! [`Scheduler`] invokes it whenever the current local minute matches.
//! [`CronScheduler`] is the tokio-driven implementation.

mod cron;
mod cron_spec;

use std::sync::Arc;

pub use cron::CronScheduler;
pub use cron_spec::{CronField, CronSpec};

/// Callback invoked when a scheduled task fires.
pub type TaskCallback = Arc<dyn Fn() + Send + Sync>;

/// A registry of named recurring tasks.
pub trait Scheduler: Send + Sync {
    /// Registers `task` under `name`, replacing any task with that name.
    fn add_task(&self, name: &str, spec: CronSpec, task: TaskCallback);

    /// Removes the task registered under `name`.
    ///
    /// Returns `true` if a task was removed.
    fn remove_task(&self, name: &str) -> bool;
}
