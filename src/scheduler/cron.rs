// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tokio-driven scheduler evaluating tasks on minute boundaries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, Timelike};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use super::{CronSpec, Scheduler, TaskCallback};

struct ScheduledTask {
    spec: CronSpec,
    callback: TaskCallback,
}

/// Scheduler that wakes at the start of every local minute and runs the
/// tasks whose [`CronSpec`] matches.
///
/// Tasks can be registered before or after [`start`](Self::start). The
/// matching logic is exposed through [`tick`](Self::tick) so it can be
/// driven with an explicit time.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use chrono::NaiveDate;
/// use httpdev_lib::scheduler::{CronScheduler, CronSpec, Scheduler};
///
/// let scheduler = CronScheduler::new();
/// let runs = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&runs);
/// scheduler.add_task(
///     "refresh",
///     CronSpec::from_period_minutes(30).unwrap(),
///     Arc::new(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     }),
/// );
///
/// let half_past = NaiveDate::from_ymd_opt(2024, 9, 2)
///     .unwrap()
///     .and_hms_opt(10, 30, 0)
///     .unwrap();
/// assert_eq!(scheduler.tick(&half_past), 1);
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
pub struct CronScheduler {
    tasks: Arc<Mutex<HashMap<String, ScheduledTask>>>,
    runner: Mutex<Option<JoinHandle<()>>>,
}

impl CronScheduler {
    /// Creates a scheduler with no tasks. Nothing runs until [`start`](Self::start).
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(Mutex::new(HashMap::new())),
            runner: Mutex::new(None),
        }
    }

    /// Returns the number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Returns `true` if no task is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Returns `true` if a task is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.lock().contains_key(name)
    }

    /// Runs every task matching `now` and returns how many ran.
    ///
    /// Callbacks run outside the task lock, so they may add or remove tasks.
    pub fn tick<T: Datelike + Timelike>(&self, now: &T) -> usize {
        run_matching(&self.tasks, now)
    }

    /// Starts the background loop on the current tokio runtime.
    ///
    /// Calling `start` on a running scheduler does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) {
        let mut runner = self.runner.lock();
        if runner.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let tasks = Arc::clone(&self.tasks);
        *runner = Some(tokio::spawn(async move {
            let mut last_minute = None;
            loop {
                tokio::time::sleep(until_next_minute()).await;
                let now = Local::now();
                let minute = now.timestamp().div_euclid(60);
                if last_minute == Some(minute) {
                    continue;
                }
                last_minute = Some(minute);
                let ran = run_matching(&tasks, &now);
                if ran > 0 {
                    tracing::debug!(time = %now.format("%H:%M"), ran, "Scheduled tasks ran");
                }
            }
        }));
        tracing::debug!("Cron scheduler started");
    }

    /// Stops the background loop. Registered tasks are kept.
    pub fn stop(&self) {
        if let Some(handle) = self.runner.lock().take() {
            handle.abort();
            tracing::debug!("Cron scheduler stopped");
        }
    }

    /// Returns `true` while the background loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.runner
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for CronScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CronScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.runner.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.tasks.lock().keys().cloned().collect();
        names.sort();
        f.debug_struct("CronScheduler")
            .field("tasks", &names)
            .field("running", &self.is_running())
            .finish()
    }
}

impl Scheduler for CronScheduler {
    fn add_task(&self, name: &str, spec: CronSpec, task: TaskCallback) {
        tracing::debug!(task = name, schedule = %spec, "Task scheduled");
        self.tasks.lock().insert(
            name.to_string(),
            ScheduledTask {
                spec,
                callback: task,
            },
        );
    }

    fn remove_task(&self, name: &str) -> bool {
        let removed = self.tasks.lock().remove(name).is_some();
        if removed {
            tracing::debug!(task = name, "Task unscheduled");
        }
        removed
    }
}

fn run_matching<T: Datelike + Timelike>(
    tasks: &Mutex<HashMap<String, ScheduledTask>>,
    now: &T,
) -> usize {
    let due: Vec<TaskCallback> = tasks
        .lock()
        .values()
        .filter(|task| task.spec.matches(now))
        .map(|task| Arc::clone(&task.callback))
        .collect();

    for callback in &due {
        callback();
    }
    due.len()
}

fn until_next_minute() -> Duration {
    let now = Local::now();
    let into_minute_ms =
        u64::from(now.second()) * 1000 + u64::from(now.timestamp_subsec_millis().min(999));
    // Land slightly after the boundary so the minute has rolled over.
    Duration::from_millis(60_000 - into_minute_ms + 5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_task(counter: &Arc<AtomicUsize>) -> TaskCallback {
        let counter = Arc::clone(counter);
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn at(hour: u32, minute: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 9, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn tick_runs_only_matching_tasks() {
        let scheduler = CronScheduler::new();
        let every_ten = Arc::new(AtomicUsize::new(0));
        let hourly = Arc::new(AtomicUsize::new(0));
        scheduler.add_task(
            "ten",
            CronSpec::from_period_minutes(10).unwrap(),
            counter_task(&every_ten),
        );
        scheduler.add_task(
            "hour",
            CronSpec::from_period_minutes(60).unwrap(),
            counter_task(&hourly),
        );

        assert_eq!(scheduler.tick(&at(9, 0)), 2);
        assert_eq!(scheduler.tick(&at(9, 10)), 1);
        assert_eq!(scheduler.tick(&at(9, 15)), 0);

        assert_eq!(every_ten.load(Ordering::SeqCst), 2);
        assert_eq!(hourly.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn add_task_replaces_same_name() {
        let scheduler = CronScheduler::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        scheduler.add_task("job", CronSpec::EVERY_MINUTE, counter_task(&first));
        scheduler.add_task("job", CronSpec::EVERY_MINUTE, counter_task(&second));

        assert_eq!(scheduler.len(), 1);
        scheduler.tick(&at(1, 1));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remove_task() {
        let scheduler = CronScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        scheduler.add_task("job", CronSpec::EVERY_MINUTE, counter_task(&runs));

        assert!(scheduler.remove_task("job"));
        assert!(!scheduler.remove_task("job"));
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.tick(&at(1, 1)), 0);
    }

    #[test]
    fn callback_may_unschedule_itself() {
        let scheduler = Arc::new(CronScheduler::new());
        let weak = Arc::downgrade(&scheduler);
        scheduler.add_task(
            "once",
            CronSpec::EVERY_MINUTE,
            Arc::new(move || {
                if let Some(scheduler) = weak.upgrade() {
                    scheduler.remove_task("once");
                }
            }),
        );

        assert_eq!(scheduler.tick(&at(1, 1)), 1);
        assert!(!scheduler.contains("once"));
    }

    #[tokio::test]
    async fn start_and_stop() {
        let scheduler = CronScheduler::new();
        assert!(!scheduler.is_running());

        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop();
        assert!(!scheduler.is_running());
    }
}
