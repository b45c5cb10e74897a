// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-visible notifications.
//!
//! Adapters report liveness transitions and failed actions through a
//! [`Notifier`]. Any `Fn(Notification)` closure is a notifier, and
//! [`TracingNotifier`] forwards notifications to `tracing`.

use std::fmt;

use serde::Serialize;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Informational (device came back).
    Info,
    /// Error (device died, action failed).
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A message for the host's notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Human readable message.
    pub message: String,
    /// Identity of the emitting module.
    pub source: String,
}

impl Notification {
    /// Creates an informational notification.
    #[must_use]
    pub fn info(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            source: source.into(),
        }
    }

    /// Creates an error notification.
    #[must_use]
    pub fn error(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            source: source.into(),
        }
    }
}

/// Sink for user-visible notifications.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use httpdev_lib::notify::{Notification, Notifier};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = {
///     let seen = Arc::clone(&seen);
///     move |n: Notification| seen.lock().unwrap().push(n)
/// };
///
/// sink.notify(Notification::info("Device Lamp is now alive.", "HTTPDevice_1"));
/// assert_eq!(seen.lock().unwrap().len(), 1);
/// ```
pub trait Notifier: Send + Sync {
    /// Delivers a notification. Must not block.
    fn notify(&self, notification: Notification);
}

impl<F> Notifier for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification);
    }
}

/// Notifier that emits each notification as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => {
                tracing::info!(source = %notification.source, "{}", notification.message);
            }
            NotificationLevel::Error => {
                tracing::error!(source = %notification.source, "{}", notification.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_level() {
        assert_eq!(Notification::info("m", "s").level, NotificationLevel::Info);
        assert_eq!(Notification::error("m", "s").level, NotificationLevel::Error);
    }

    #[test]
    fn serializes_lowercase_level() {
        let json = serde_json::to_value(Notification::error("boom", "HTTPDevice_2")).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["source"], "HTTPDevice_2");
    }

    #[test]
    fn tracing_notifier_accepts_both_levels() {
        TracingNotifier.notify(Notification::info("up", "test"));
        TracingNotifier.notify(Notification::error("down", "test"));
    }
}
