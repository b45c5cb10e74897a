// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polling adapter configuration.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConfigError, ParseError};
use crate::protocol::{Credentials, HttpMethod, HttpResponse};
use crate::types::{Action, DeviceType, Level};

/// Longest accepted polling interval or failure timeout (one year).
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

type ParserFn = dyn Fn(&HttpResponse) -> Result<Level, ParseError> + Send + Sync;

/// A user supplied transformation from a raw response to a level.
///
/// Replaces the built-in parsing for one device type. A parser that returns
/// an error, or panics, leaves the device level untouched.
///
/// # Examples
///
/// ```
/// use httpdev_lib::config::ResponseParser;
/// use httpdev_lib::error::ParseError;
/// use httpdev_lib::protocol::HttpResponse;
/// use httpdev_lib::types::Level;
///
/// let parser = ResponseParser::new(|response: &HttpResponse| {
///     let json: serde_json::Value = response.parse()?;
///     json["temperature"]
///         .as_f64()
///         .map(Level::Value)
///         .ok_or_else(|| ParseError::Custom("no temperature".to_string()))
/// });
///
/// let level = parser.parse(&HttpResponse::ok(r#"{"temperature": 19.5}"#)).unwrap();
/// assert_eq!(level, Level::Value(19.5));
/// ```
#[derive(Clone)]
pub struct ResponseParser(Arc<ParserFn>);

impl ResponseParser {
    /// Wraps a parsing function.
    pub fn new<F>(parser: F) -> Self
    where
        F: Fn(&HttpResponse) -> Result<Level, ParseError> + Send + Sync + 'static,
    {
        Self(Arc::new(parser))
    }

    /// Runs the parser, converting a panic into [`ParseError::Panicked`].
    ///
    /// # Errors
    ///
    /// Returns the parser's own error, or `Panicked` if it panicked.
    pub fn parse(&self, response: &HttpResponse) -> Result<Level, ParseError> {
        catch_unwind(AssertUnwindSafe(|| (self.0)(response))).unwrap_or(Err(ParseError::Panicked))
    }
}

impl fmt::Debug for ResponseParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResponseParser(..)")
    }
}

/// How to read the state of one device type.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use httpdev_lib::config::GetterConfig;
/// use httpdev_lib::protocol::HttpMethod;
///
/// let getter = GetterConfig::new("http://192.168.1.20/state")
///     .with_poll_interval(Duration::from_secs(10))
///     .with_method(HttpMethod::Post)
///     .with_body("{\"query\":\"state\"}");
///
/// assert_eq!(getter.poll_interval(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct GetterConfig {
    url: String,
    poll_interval: Duration,
    parser: Option<ResponseParser>,
    method: Option<HttpMethod>,
    content_type: Option<String>,
    body: Option<String>,
}

impl GetterConfig {
    /// Poll interval used when none is configured.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

    /// Creates a getter for `url` with the default poll interval.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            parser: None,
            method: None,
            content_type: None,
            body: None,
        }
    }

    /// Sets the normal polling interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replaces the built-in response parsing.
    #[must_use]
    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Overrides the adapter-wide method for reads.
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Overrides the adapter-wide content type for reads.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Overrides the adapter-wide body for reads.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the normal polling interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the custom parser, if any.
    #[must_use]
    pub fn parser(&self) -> Option<&ResponseParser> {
        self.parser.as_ref()
    }

    /// Returns the method override, if any.
    #[must_use]
    pub fn method(&self) -> Option<HttpMethod> {
        self.method
    }

    /// Returns the content type override, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the body override, if any.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Configuration of a [`PollingAdapter`](crate::adapter::PollingAdapter).
///
/// Getter and setter entries are keyed by device type, mirroring the host's
/// configuration format; the adapter only consults the entries for its own
/// [`device_type`](Self::device_type).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use httpdev_lib::config::{AdapterConfig, GetterConfig};
/// use httpdev_lib::types::{Action, DeviceType};
///
/// let config = AdapterConfig::new(DeviceType::SwitchBinary)
///     .with_title("Garden pump")
///     .with_getter(
///         DeviceType::SwitchBinary,
///         GetterConfig::new("http://pump.local/state").with_poll_interval(Duration::from_secs(10)),
///     )
///     .with_setter(Action::On, DeviceType::SwitchBinary, "http://pump.local/set?v=1")
///     .with_setter(Action::Off, DeviceType::SwitchBinary, "http://pump.local/set?v=0")
///     .with_max_attempts(3)
///     .with_poll_interval_timeout(Duration::from_secs(300));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.setter(Action::On, DeviceType::SwitchBinary), Some("http://pump.local/set?v=1"));
/// ```
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    device_type: DeviceType,
    title: Option<String>,
    getters: HashMap<DeviceType, GetterConfig>,
    setters: HashMap<(Action, DeviceType), String>,
    method: HttpMethod,
    content_type: Option<String>,
    body: Option<String>,
    credentials: Option<Credentials>,
    max_attempts: u32,
    poll_interval_timeout: Duration,
    skip_event_if_same_value: bool,
    update_on_action: bool,
    request_timeout: Duration,
    sensor_binary_icon: String,
    sensor_multilevel_icon: String,
    sensor_multilevel_scale: String,
}

impl AdapterConfig {
    /// Default consecutive-failure threshold.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    /// Default polling interval while a device is marked dead.
    pub const DEFAULT_POLL_INTERVAL_TIMEOUT: Duration = Duration::from_secs(60);
    /// Default HTTP request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration with no getters or setters.
    #[must_use]
    pub fn new(device_type: DeviceType) -> Self {
        Self {
            device_type,
            title: None,
            getters: HashMap::new(),
            setters: HashMap::new(),
            method: HttpMethod::Get,
            content_type: None,
            body: None,
            credentials: None,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            poll_interval_timeout: Self::DEFAULT_POLL_INTERVAL_TIMEOUT,
            skip_event_if_same_value: false,
            update_on_action: false,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            sensor_binary_icon: "door".to_string(),
            sensor_multilevel_icon: "temperature".to_string(),
            sensor_multilevel_scale: String::new(),
        }
    }

    /// Sets the device title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Configures the getter for a device type.
    #[must_use]
    pub fn with_getter(mut self, device_type: DeviceType, getter: GetterConfig) -> Self {
        self.getters.insert(device_type, getter);
        self
    }

    /// Configures a setter URL template; `$$` is replaced by the target value.
    #[must_use]
    pub fn with_setter(
        mut self,
        action: Action,
        device_type: DeviceType,
        url_template: impl Into<String>,
    ) -> Self {
        self.setters.insert((action, device_type), url_template.into());
        self
    }

    /// Sets the HTTP method for all requests.
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the content type sent with `POST` requests.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Sets the body template sent with `POST` requests.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets basic authentication credentials.
    ///
    /// Ignored unless both username and password are non-empty.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Credentials::new(username, password);
        self
    }

    /// Sets the consecutive-failure threshold.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the polling interval used while the device is marked dead.
    #[must_use]
    pub fn with_poll_interval_timeout(mut self, interval: Duration) -> Self {
        self.poll_interval_timeout = interval;
        self
    }

    /// Suppresses level writes when a poll returns the stored value.
    #[must_use]
    pub fn with_skip_event_if_same_value(mut self, skip: bool) -> Self {
        self.skip_event_if_same_value = skip;
        self
    }

    /// Writes the commanded value locally even when a setter URL exists.
    #[must_use]
    pub fn with_update_on_action(mut self, update: bool) -> Self {
        self.update_on_action = update;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the icon (and probe type) of binary sensors.
    #[must_use]
    pub fn with_sensor_binary_icon(mut self, icon: impl Into<String>) -> Self {
        self.sensor_binary_icon = icon.into();
        self
    }

    /// Sets the icon (and probe type) of multilevel sensors.
    #[must_use]
    pub fn with_sensor_multilevel_icon(mut self, icon: impl Into<String>) -> Self {
        self.sensor_multilevel_icon = icon.into();
        self
    }

    /// Sets the unit shown next to multilevel sensor values.
    #[must_use]
    pub fn with_sensor_multilevel_scale(mut self, scale: impl Into<String>) -> Self {
        self.sensor_multilevel_scale = scale.into();
        self
    }

    /// Returns the device type this adapter exposes.
    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        self.device_type
    }

    /// Returns the configured title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the getter for `device_type`.
    #[must_use]
    pub fn getter(&self, device_type: DeviceType) -> Option<&GetterConfig> {
        self.getters.get(&device_type)
    }

    /// Returns the setter template for (`action`, `device_type`).
    #[must_use]
    pub fn setter(&self, action: Action, device_type: DeviceType) -> Option<&str> {
        self.setters
            .get(&(action, device_type))
            .map(String::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Returns the adapter-wide HTTP method.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Returns the adapter-wide content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the adapter-wide body template.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the credentials, if set.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Returns the consecutive-failure threshold.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the degraded polling interval.
    #[must_use]
    pub fn poll_interval_timeout(&self) -> Duration {
        self.poll_interval_timeout
    }

    /// Returns whether unchanged poll results are skipped.
    #[must_use]
    pub fn skip_event_if_same_value(&self) -> bool {
        self.skip_event_if_same_value
    }

    /// Returns whether commanded values are always echoed locally.
    #[must_use]
    pub fn update_on_action(&self) -> bool {
        self.update_on_action
    }

    /// Returns the HTTP request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the binary sensor icon.
    #[must_use]
    pub fn sensor_binary_icon(&self) -> &str {
        &self.sensor_binary_icon
    }

    /// Returns the multilevel sensor icon.
    #[must_use]
    pub fn sensor_multilevel_icon(&self) -> &str {
        &self.sensor_multilevel_icon
    }

    /// Returns the multilevel sensor unit.
    #[must_use]
    pub fn sensor_multilevel_scale(&self) -> &str {
        &self.sensor_multilevel_scale
    }

    /// Checks the configuration for values the adapter cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero failure threshold,
    /// a zero interval or an empty getter URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid("maxAttempts", "must be at least 1"));
        }
        if self.poll_interval_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "pollIntervalTimeout",
                "must be greater than zero",
            ));
        }
        if self.poll_interval_timeout > MAX_INTERVAL {
            return Err(ConfigError::invalid(
                "pollIntervalTimeout",
                "must not exceed one year",
            ));
        }
        for (device_type, getter) in &self.getters {
            if getter.url.is_empty() {
                return Err(ConfigError::invalid(
                    format!("getter_{device_type}"),
                    "must not be empty",
                ));
            }
            if getter.poll_interval.is_zero() {
                return Err(ConfigError::invalid(
                    format!("getterPollInterval_{device_type}"),
                    "must be greater than zero",
                ));
            }
            if getter.poll_interval > MAX_INTERVAL {
                return Err(ConfigError::invalid(
                    format!("getterPollInterval_{device_type}"),
                    "must not exceed one year",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AdapterConfig::new(DeviceType::SensorMultilevel);
        assert_eq!(config.max_attempts(), 3);
        assert_eq!(config.method(), HttpMethod::Get);
        assert!(!config.skip_event_if_same_value());
        assert!(!config.update_on_action());
        assert!(config.getter(DeviceType::SensorMultilevel).is_none());
        assert!(config.credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn credentials_need_both_parts() {
        let config = AdapterConfig::new(DeviceType::SwitchBinary).with_credentials("admin", "");
        assert!(config.credentials().is_none());
    }

    #[test]
    fn empty_setter_counts_as_missing() {
        let config =
            AdapterConfig::new(DeviceType::SwitchBinary).with_setter(Action::On, DeviceType::SwitchBinary, "");
        assert_eq!(config.setter(Action::On, DeviceType::SwitchBinary), None);
    }

    #[test]
    fn setters_are_keyed_by_type() {
        let config = AdapterConfig::new(DeviceType::SwitchBinary).with_setter(
            Action::On,
            DeviceType::SwitchMultilevel,
            "http://x/on",
        );
        assert_eq!(config.setter(Action::On, DeviceType::SwitchBinary), None);
        assert_eq!(
            config.setter(Action::On, DeviceType::SwitchMultilevel),
            Some("http://x/on")
        );
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let config = AdapterConfig::new(DeviceType::SwitchBinary).with_max_attempts(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "maxAttempts"
        ));
    }

    #[test]
    fn validate_rejects_zero_intervals() {
        let config = AdapterConfig::new(DeviceType::SwitchBinary)
            .with_poll_interval_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = AdapterConfig::new(DeviceType::SwitchBinary).with_getter(
            DeviceType::SwitchBinary,
            GetterConfig::new("http://x").with_poll_interval(Duration::ZERO),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_oversized_intervals() {
        let config = AdapterConfig::new(DeviceType::SwitchBinary).with_getter(
            DeviceType::SwitchBinary,
            GetterConfig::new("http://x").with_poll_interval(Duration::from_secs(u64::MAX)),
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "getterPollInterval_switchBinary"
        ));

        let config = AdapterConfig::new(DeviceType::SwitchBinary)
            .with_poll_interval_timeout(MAX_INTERVAL + Duration::from_secs(1));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "pollIntervalTimeout"
        ));

        let config = AdapterConfig::new(DeviceType::SwitchBinary)
            .with_poll_interval_timeout(MAX_INTERVAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parser_errors_pass_through() {
        let parser = ResponseParser::new(|_| Err(ParseError::Custom("nope".to_string())));
        assert_eq!(
            parser.parse(&HttpResponse::ok("x")),
            Err(ParseError::Custom("nope".to_string()))
        );
    }

    #[test]
    fn parser_panics_are_caught() {
        let parser = ResponseParser::new(|_| panic!("bad parser"));
        assert_eq!(parser.parse(&HttpResponse::ok("x")), Err(ParseError::Panicked));
    }
}
