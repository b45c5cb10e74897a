// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::DeviceType;

/// Identifier of a virtual device, unique within a registry.
///
/// Adapters derive their identifier deterministically from the device type
/// and the owning module, so re-creating an adapter after a restart claims
/// the same registry entry instead of adding a duplicate.
///
/// # Examples
///
/// ```
/// use httpdev_lib::event::DeviceId;
/// use httpdev_lib::types::DeviceType;
///
/// let id = DeviceId::composite("HTTP_Device", DeviceType::SwitchBinary, "7");
/// assert_eq!(id.as_str(), "HTTP_Device_switchBinary_7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates an identifier from an arbitrary string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the `<prefix>_<deviceType>_<moduleId>` composite identifier.
    #[must_use]
    pub fn composite(prefix: &str, device_type: DeviceType, module_id: &str) -> Self {
        Self(format!("{prefix}_{device_type}_{module_id}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_is_deterministic() {
        let a = DeviceId::composite("HTTP_Device", DeviceType::SensorMultilevel, "12");
        let b = DeviceId::composite("HTTP_Device", DeviceType::SensorMultilevel, "12");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "HTTP_Device_sensorMultilevel_12");
    }

    #[test]
    fn serde_is_transparent() {
        let id = DeviceId::from("ZWayVDev_5-0-37");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ZWayVDev_5-0-37\"");
        let back: DeviceId = serde_json::from_str("\"ZWayVDev_5-0-37\"").unwrap();
        assert_eq!(back, id);
    }
}
