// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request construction for poll and act cycles.

use crate::config::{AdapterConfig, GetterConfig};
use crate::protocol::HttpRequest;
use crate::types::Level;

/// Token replaced by the target value in setter URLs and bodies.
pub const PLACEHOLDER: &str = "$$";

const CONTENT_TYPE: &str = "Content-Type";

/// Replaces every [`PLACEHOLDER`] in `template` with `value`.
///
/// Without a value the template is returned unchanged.
///
/// # Examples
///
/// ```
/// use httpdev_lib::adapter::substitute;
/// use httpdev_lib::types::Level;
///
/// assert_eq!(
///     substitute("http://dimmer/set?l=$$&echo=$$", Some(Level::Value(42.0))),
///     "http://dimmer/set?l=42&echo=42"
/// );
/// assert_eq!(substitute("http://relay/on", None), "http://relay/on");
/// ```
#[must_use]
pub fn substitute(template: &str, value: Option<Level>) -> String {
    match value {
        Some(value) => template.replace(PLACEHOLDER, &value.to_string()),
        None => template.to_string(),
    }
}

/// Builds the read request for `getter`.
///
/// Getter overrides take precedence over the adapter-wide settings. The
/// content type and body are only attached to methods that carry a body.
pub(crate) fn poll_request(config: &AdapterConfig, getter: &GetterConfig) -> HttpRequest {
    let method = getter.method().unwrap_or(config.method());
    let mut request = HttpRequest::new(getter.url())
        .with_method(method)
        .with_credentials(config.credentials().cloned());

    if method.carries_body() {
        if let Some(content_type) = getter.content_type().or(config.content_type()) {
            request = request.with_header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = getter.body().or(config.body()) {
            request = request.with_body(body);
        }
    }
    request
}

/// Builds the write request for a resolved setter `url`.
pub(crate) fn act_request(config: &AdapterConfig, url: String, value: Option<Level>) -> HttpRequest {
    let method = config.method();
    let mut request = HttpRequest::new(url)
        .with_method(method)
        .with_credentials(config.credentials().cloned());

    if method.carries_body() {
        if let Some(content_type) = config.content_type() {
            request = request.with_header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = config.body() {
            request = request.with_body(substitute(body, value));
        }
    }
    request
}
