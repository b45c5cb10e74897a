// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! reqwest-based [`Transport`] implementation.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};

use crate::error::ProtocolError;
use crate::protocol::{HttpMethod, HttpRequest, HttpResponse, Transport};

/// HTTP transport backed by a shared [`reqwest::Client`].
///
/// The client is cheap to clone; all clones share one connection pool.
///
/// # Examples
///
/// ```no_run
/// use httpdev_lib::protocol::{HttpRequest, HttpTransport, Transport};
///
/// # async fn example() -> httpdev_lib::Result<()> {
/// let transport = HttpTransport::new()?;
/// let response = transport
///     .request(HttpRequest::new("http://192.168.1.20/state"))
///     .await?;
/// println!("{}", response.body());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, ProtocolError> {
        HttpTransportBuilder::new().build()
    }

    /// Returns a builder for a transport with custom settings.
    #[must_use]
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            let millis = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            ProtocolError::Timeout(millis)
        } else if err.is_builder() {
            ProtocolError::InvalidUrl(err.to_string())
        } else if err.is_connect() {
            ProtocolError::ConnectionFailed(err.to_string())
        } else {
            ProtocolError::Http(err)
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

impl Transport for HttpTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, ProtocolError> {
        tracing::debug!(method = %request.method(), url = %request.url(), "Sending HTTP request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method()), request.url());

        for (name, value) in request.headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_string());
        }
        if let Some(creds) = request.credentials() {
            builder = builder.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = builder.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed);
        }
        if !status.is_success() {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        tracing::debug!(status = status.as_u16(), body = %body, "Received HTTP response");

        let mut result = HttpResponse::new(status.as_u16(), body);
        if let Some(content_type) = content_type {
            result = result.with_content_type(content_type);
        }
        Ok(result)
    }
}

/// Builder for creating an [`HttpTransport`] with custom configuration.
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpTransportBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` header sent with every request.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Builds the transport.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn build(self) -> Result<HttpTransport, ProtocolError> {
        let timeout = self.timeout.unwrap_or(HttpTransport::DEFAULT_TIMEOUT);

        let mut builder = Client::builder().timeout(timeout);
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder.build().map_err(ProtocolError::Http)?;

        Ok(HttpTransport { client, timeout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn builder_with_timeout() {
        let transport = HttpTransport::builder()
            .timeout(Duration::from_secs(3))
            .user_agent("httpdev-test")
            .build()
            .unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn method_mapping() {
        assert_eq!(to_reqwest_method(HttpMethod::Get), Method::GET);
        assert_eq!(to_reqwest_method(HttpMethod::Post), Method::POST);
        assert_eq!(to_reqwest_method(HttpMethod::Put), Method::PUT);
        assert_eq!(to_reqwest_method(HttpMethod::Delete), Method::DELETE);
    }
}
