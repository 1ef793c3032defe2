// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the controller's HTTP API.
//!
//! The controller exposes a small HTTP surface: a data-listing endpoint
//! returning the device/scene snapshot as JSON, and an action endpoint
//! accepting "set level" and "turn on/off" requests. This module owns only
//! that minimal request/response shape; everything above it works on typed
//! snapshots.

mod http;

pub use http::ControllerClient;

/// Well-known TCP port of the controller's HTTP API.
pub const CONTROLLER_PORT: u16 = 3480;
