// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `httpdev` library.
//!
//! Only construction, configuration loading and plugin instantiation return
//! these errors to the caller. Runtime failures of a running adapter (failed
//! polls, failed actions, bad payloads) are reported as notifications and
//! never propagate out of the adapter.

use thiserror::Error;

use crate::registry::DeviceId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is invalid or incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error occurred during HTTP communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A response payload could not be turned into a device level.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The device registry refused an operation.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// No factory is registered under the requested module name.
    #[error("unknown module: {0}")]
    UnknownModule(String),
}

/// Errors raised while building or loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field is missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),

    /// A field holds a value outside its allowed domain.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The JSON document does not match the expected shape.
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors related to HTTP communication with the polled endpoint.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed at the transport level.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// Connection to the endpoint failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The URL could not be used for a request.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Errors related to turning a response payload into a level.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload is not one of the recognised binary tokens.
    #[error("unrecognized binary token: {0:?}")]
    UnrecognizedToken(String),

    /// The payload is not a finite number.
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),

    /// The payload is not the JSON a parser expected.
    #[error("JSON parse error: {0}")]
    Json(String),

    /// A device type that carries no level was asked to parse one.
    #[error("device type {0} has no parsable level")]
    NotParsable(String),

    /// A user supplied parser rejected the payload.
    #[error("custom parser failed: {0}")]
    Custom(String),

    /// A user supplied parser panicked.
    #[error("custom parser panicked")]
    Panicked,
}

/// Errors raised by a device registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry refused to create the device.
    #[error("device {device_id} rejected: {reason}")]
    Rejected {
        /// The identifier that was refused.
        device_id: DeviceId,
        /// Why it was refused.
        reason: String,
    },

    /// The device does not exist.
    #[error("device {0} not found")]
    NotFound(DeviceId),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::invalid("maxAttempts", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid value for maxAttempts: must be at least 1"
        );
    }

    #[test]
    fn status_error_display() {
        let err = ProtocolError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 503 - Service Unavailable");
    }

    #[test]
    fn error_from_registry_error() {
        let id = DeviceId::new("HTTP_Device_switchBinary_1");
        let err: Error = RegistryError::NotFound(id.clone()).into();
        assert!(matches!(err, Error::Registry(RegistryError::NotFound(ref d)) if *d == id));
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::UnrecognizedToken("maybe".to_string());
        assert_eq!(err.to_string(), "unrecognized binary token: \"maybe\"");
    }
}
