// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loading adapter configuration from a host's flat JSON module config.
//!
//! Hosts store module settings as one flat object with per-type keys
//! (`getter_switchBinary`, `setterLevel_switchMultilevel`, ...). This module
//! turns such an object into an [`AdapterConfig`].

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::protocol::HttpMethod;
use crate::types::{Action, DeviceType};

use super::{AdapterConfig, GetterConfig};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModuleJson {
    device_type: DeviceType,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    method: Option<HttpMethod>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    method_for_get_value: Option<HttpMethod>,
    #[serde(default)]
    content_type_for_get_value: Option<String>,
    #[serde(default)]
    data_for_get_value: Option<String>,
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    poll_interval_timeout: Option<u64>,
    #[serde(default)]
    skip_event_if_same_value: Option<bool>,
    #[serde(default)]
    update_on_action: Option<bool>,
    #[serde(default)]
    request_timeout: Option<u64>,
    #[serde(default)]
    icon_sensor_binary: Option<String>,
    #[serde(default)]
    icon_sensor_multilevel: Option<String>,
    #[serde(default, rename = "scale_sensorMultilevel")]
    scale_sensor_multilevel: Option<String>,
    #[serde(flatten)]
    per_type: HashMap<String, Value>,
}

impl ModuleJson {
    fn string(&self, key: &str) -> Option<&str> {
        self.per_type
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn seconds(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        match self.per_type.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|s| Some(Duration::from_secs(s)))
                .ok_or_else(|| ConfigError::invalid(key, "must be a whole number of seconds")),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(|s| Some(Duration::from_secs(s)))
                .map_err(|_| ConfigError::invalid(key, "must be a whole number of seconds")),
            Some(_) => Err(ConfigError::invalid(key, "must be a number")),
        }
    }
}

impl AdapterConfig {
    /// Builds a configuration from a flat JSON module config.
    ///
    /// Recognised keys: `deviceType`, `title`, `getter_<type>`,
    /// `getterPollInterval_<type>` (seconds), `setterOn_<type>`,
    /// `setterOff_<type>`, `setterLevel_<type>`, `method`, `contentType`,
    /// `data`, `methodForGetValue`, `contentTypeForGetValue`,
    /// `dataForGetValue` (read overrides, switch types only), `login`,
    /// `password`, `maxAttempts`, `pollIntervalTimeout` (seconds),
    /// `skipEventIfSameValue`, `updateOnAction`, `requestTimeout` (seconds),
    /// `iconSensorBinary`, `iconSensorMultilevel`, `scale_sensorMultilevel`.
    ///
    /// `getterParser_<type>` expressions are not evaluated; they are logged
    /// and ignored. Attach a [`ResponseParser`](super::ResponseParser) with
    /// [`GetterConfig::with_parser`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is malformed or the resulting
    /// configuration fails [`validate`](Self::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use httpdev_lib::config::AdapterConfig;
    /// use httpdev_lib::types::{Action, DeviceType};
    /// use serde_json::json;
    ///
    /// let config = AdapterConfig::from_module_json(&json!({
    ///     "deviceType": "switchMultilevel",
    ///     "getter_switchMultilevel": "http://dimmer.local/level",
    ///     "getterPollInterval_switchMultilevel": 15,
    ///     "setterLevel_switchMultilevel": "http://dimmer.local/level?set=$$",
    ///     "maxAttempts": 5,
    ///     "pollIntervalTimeout": 600
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(config.device_type(), DeviceType::SwitchMultilevel);
    /// assert_eq!(config.max_attempts(), 5);
    /// assert_eq!(
    ///     config.getter(DeviceType::SwitchMultilevel).unwrap().poll_interval(),
    ///     Duration::from_secs(15)
    /// );
    /// ```
    pub fn from_module_json(value: &Value) -> Result<Self, ConfigError> {
        let raw = ModuleJson::deserialize(value)?;
        let mut config = AdapterConfig::new(raw.device_type);

        if let Some(title) = raw.title.as_deref().filter(|t| !t.is_empty()) {
            config = config.with_title(title);
        }
        if let Some(method) = raw.method {
            config = config.with_method(method);
        }
        if let Some(content_type) = raw.content_type.as_deref().filter(|c| !c.is_empty()) {
            config = config.with_content_type(content_type);
        }
        if let Some(data) = raw.data.as_deref().filter(|d| !d.is_empty()) {
            config = config.with_body(data);
        }
        if let (Some(login), Some(password)) = (&raw.login, &raw.password) {
            config = config.with_credentials(login.as_str(), password.as_str());
        }
        if let Some(max_attempts) = raw.max_attempts {
            config = config.with_max_attempts(max_attempts);
        }
        if let Some(timeout) = raw.poll_interval_timeout {
            config = config.with_poll_interval_timeout(Duration::from_secs(timeout));
        }
        if let Some(skip) = raw.skip_event_if_same_value {
            config = config.with_skip_event_if_same_value(skip);
        }
        if let Some(update) = raw.update_on_action {
            config = config.with_update_on_action(update);
        }
        if let Some(timeout) = raw.request_timeout {
            config = config.with_request_timeout(Duration::from_secs(timeout));
        }
        if let Some(icon) = raw.icon_sensor_binary.as_deref() {
            config = config.with_sensor_binary_icon(icon);
        }
        if let Some(icon) = raw.icon_sensor_multilevel.as_deref() {
            config = config.with_sensor_multilevel_icon(icon);
        }
        if let Some(scale) = raw.scale_sensor_multilevel.as_deref() {
            config = config.with_sensor_multilevel_scale(scale);
        }

        for device_type in DeviceType::ALL {
            if let Some(url) = raw.string(&format!("getter_{device_type}")) {
                let mut getter = GetterConfig::new(url);
                if let Some(interval) = raw.seconds(&format!("getterPollInterval_{device_type}"))? {
                    getter = getter.with_poll_interval(interval);
                }
                if device_type.is_switch() {
                    getter = apply_read_overrides(getter, &raw);
                }
                config = config.with_getter(device_type, getter);
            }

            if raw.string(&format!("getterParser_{device_type}")).is_some() {
                tracing::warn!(
                    %device_type,
                    "Ignoring getterParser expression; attach a ResponseParser instead"
                );
            }

            for action in Action::ALL {
                if let Some(url) = raw.string(&format!("setter{action}_{device_type}")) {
                    config = config.with_setter(action, device_type, url);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn apply_read_overrides(mut getter: GetterConfig, raw: &ModuleJson) -> GetterConfig {
    if let Some(method) = raw.method_for_get_value {
        getter = getter.with_method(method);
    }
    if let Some(content_type) = raw.content_type_for_get_value.as_deref().filter(|c| !c.is_empty()) {
        getter = getter.with_content_type(content_type);
    }
    if let Some(data) = raw.data_for_get_value.as_deref().filter(|d| !d.is_empty()) {
        getter = getter.with_body(data);
    }
    getter
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn full_switch_binary_config() {
        let config = AdapterConfig::from_module_json(&json!({
            "deviceType": "switchBinary",
            "title": "Pump",
            "getter_switchBinary": "http://x/state",
            "getterPollInterval_switchBinary": 10,
            "setterOn_switchBinary": "http://x/on",
            "setterOff_switchBinary": "http://x/off",
            "method": "POST",
            "contentType": "application/json",
            "data": "{\"v\":\"$$\"}",
            "login": "admin",
            "password": "secret",
            "maxAttempts": 3,
            "pollIntervalTimeout": 300,
            "skipEventIfSameValue": true,
            "updateOnAction": true
        }))
        .unwrap();

        assert_eq!(config.title(), Some("Pump"));
        assert_eq!(config.method(), HttpMethod::Post);
        assert_eq!(config.content_type(), Some("application/json"));
        assert_eq!(config.body(), Some("{\"v\":\"$$\"}"));
        assert!(config.credentials().is_some());
        assert_eq!(config.poll_interval_timeout(), Duration::from_secs(300));
        assert!(config.skip_event_if_same_value());
        assert!(config.update_on_action());
        assert_eq!(config.setter(Action::Off, DeviceType::SwitchBinary), Some("http://x/off"));
        assert_eq!(
            config.getter(DeviceType::SwitchBinary).unwrap().poll_interval(),
            Duration::from_secs(10)
        );
    }

    #[test]
    fn read_overrides_only_apply_to_switches() {
        let value = json!({
            "deviceType": "sensorBinary",
            "getter_sensorBinary": "http://x/contact",
            "getter_switchBinary": "http://x/state",
            "methodForGetValue": "POST",
            "dataForGetValue": "query"
        });
        let config = AdapterConfig::from_module_json(&value).unwrap();

        let sensor = config.getter(DeviceType::SensorBinary).unwrap();
        assert_eq!(sensor.method(), None);
        assert_eq!(sensor.body(), None);

        let switch = config.getter(DeviceType::SwitchBinary).unwrap();
        assert_eq!(switch.method(), Some(HttpMethod::Post));
        assert_eq!(switch.body(), Some("query"));
    }

    #[test]
    fn interval_accepts_numeric_strings() {
        let config = AdapterConfig::from_module_json(&json!({
            "deviceType": "sensorMultilevel",
            "getter_sensorMultilevel": "http://x/temp",
            "getterPollInterval_sensorMultilevel": "30",
            "scale_sensorMultilevel": "°C"
        }))
        .unwrap();

        let getter = config.getter(DeviceType::SensorMultilevel).unwrap();
        assert_eq!(getter.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.sensor_multilevel_scale(), "°C");
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let config = AdapterConfig::from_module_json(&json!({
            "deviceType": "switchBinary",
            "getter_switchBinary": "",
            "setterOn_switchBinary": ""
        }))
        .unwrap();

        assert!(config.getter(DeviceType::SwitchBinary).is_none());
        assert!(config.setter(Action::On, DeviceType::SwitchBinary).is_none());
    }

    #[test]
    fn parser_expressions_are_ignored() {
        let config = AdapterConfig::from_module_json(&json!({
            "deviceType": "sensorMultilevel",
            "getter_sensorMultilevel": "http://x/temp",
            "getterParser_sensorMultilevel": "JSON.parse($$).temp"
        }))
        .unwrap();

        assert!(
            config
                .getter(DeviceType::SensorMultilevel)
                .unwrap()
                .parser()
                .is_none()
        );
    }

    #[test]
    fn missing_device_type_is_an_error() {
        let err = AdapterConfig::from_module_json(&json!({ "getter_switchBinary": "x" })).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn invalid_interval_is_an_error() {
        let err = AdapterConfig::from_module_json(&json!({
            "deviceType": "switchBinary",
            "getter_switchBinary": "http://x",
            "getterPollInterval_switchBinary": "soon"
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn oversized_interval_fails_validation() {
        let err = AdapterConfig::from_module_json(&json!({
            "deviceType": "switchBinary",
            "getter_switchBinary": "http://x/s",
            "getterPollInterval_switchBinary": u64::MAX
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "getterPollInterval_switchBinary"
        ));

        let err = AdapterConfig::from_module_json(&json!({
            "deviceType": "switchBinary",
            "pollIntervalTimeout": u64::MAX
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let err = AdapterConfig::from_module_json(&json!({
            "deviceType": "switchBinary",
            "maxAttempts": 0
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
