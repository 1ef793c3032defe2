// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery of controllers and their devices/scenes.
//!
//! Two independent services feed the host's discovery inbox:
//!
//! - [`NetworkScanner`] actively probes the local subnets for controllers
//!   answering on the well-known port.
//! - [`DeviceDiscovery`] reads an online bridge's cached snapshot and
//!   emits its devices and scenes, either on demand or from a repeating
//!   background task.
//!
//! Both deduplicate against the host through
//! [`DiscoverySink::is_known`](crate::DiscoverySink::is_known): a second
//! pass never re-emits candidates the host already retains.

mod devices;
mod network;

pub use devices::DeviceDiscovery;
pub use network::{NetworkScanner, ScanOptions};
