// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types.
//!
//! Configurations are built either with the `with_*` builder methods or
//! loaded from the host's flat JSON module configuration
//! ([`AdapterConfig::from_module_json`], [`RefresherConfig::from_module_json`]).
//! Both are immutable once handed to the component they configure.

mod adapter_config;
mod module_json;
mod refresher_config;

pub use adapter_config::{AdapterConfig, GetterConfig, MAX_INTERVAL, ResponseParser};
pub use refresher_config::RefresherConfig;
