// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by adapters, registries and refreshers.
//!
//! # Types
//!
//! - [`DeviceType`] - The five virtual device kinds
//! - [`Level`] - The `level` metric (`on`/`off` or a number)
//! - [`DeviceCommand`] - Commands dispatched to a device handler
//! - [`Action`] - Setter actions (`On`, `Off`, `Level`)

mod command;
mod device_type;
mod level;

pub use command::{Action, DeviceCommand};
pub use device_type::DeviceType;
pub use level::Level;
