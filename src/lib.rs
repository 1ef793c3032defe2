// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `VeraLink` - integrate Vera home-automation controllers into a host
//! automation platform.
//!
//! This library discovers Vera controllers on the local network and keeps a
//! typed "channel" view of each attached device synchronized with the
//! controller's state through periodic polling, while translating inbound
//! host commands into controller actions.
//!
//! # Architecture
//!
//! - A [`BridgeHandler`] owns one controller endpoint: it validates
//!   configuration, connects after a short settle delay, polls the
//!   controller's data listing on a fixed interval, and caches the latest
//!   immutable snapshot. Every reachability change cascades synchronously
//!   to all bound device handlers.
//! - A [`DeviceHandler`] owns one device entity: it derives the device's
//!   channel set from the category mapping table, pushes converted values
//!   for linked channels, and dispatches host commands. It never touches
//!   the network itself; it only reads the bridge's cache.
//! - [`discovery::NetworkScanner`] probes the local subnets for
//!   controllers; [`discovery::DeviceDiscovery`] emits a bridge's devices
//!   and scenes into the host's discovery inbox.
//!
//! The host platform plugs in through two traits: [`HostRegistry`]
//! (channels, values, labels, status) and [`DiscoverySink`] (discovery
//! inbox and deduplication oracle).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use veralink::{BridgeConfig, BridgeHandler, DeviceConfig, DeviceHandler, HostRegistry};
//!
//! # fn registry() -> Arc<dyn HostRegistry> { unimplemented!() }
//! #[tokio::main]
//! async fn main() {
//!     let registry: Arc<dyn HostRegistry> = registry();
//!
//!     let bridge = BridgeHandler::new(
//!         "vera-192_168_1_10",
//!         BridgeConfig::new("192.168.1.10"),
//!         registry.clone(),
//!     );
//!
//!     let device = DeviceHandler::new(
//!         "vera-192_168_1_10:device:5",
//!         DeviceConfig::new("5"),
//!         registry,
//!     );
//!
//!     bridge.bind_device(&device);
//!     bridge.initialize();
//!     device.initialize();
//! }
//! ```
//!
//! # Command Dispatch
//!
//! ```no_run
//! use veralink::{DeviceCommand, DeviceHandler, OnOff};
//!
//! # async fn example(device: DeviceHandler) {
//! // Fire-and-forget; the result shows up on the next poll.
//! device.handle_command(DeviceCommand::Switch(OnOff::On)).await;
//! device.handle_command(DeviceCommand::Percent(75)).await;
//! # }
//! ```

mod bridge;
pub mod command;
pub mod convert;
mod device;
pub mod discovery;
pub mod error;
mod host;
pub mod mapping;
pub mod protocol;
pub mod snapshot;
pub mod types;

pub use bridge::{BridgeConfig, BridgeHandler, CONNECT_DELAY, DEFAULT_POLL_INTERVAL};
pub use command::DeviceCommand;
pub use device::{DEFAULT_SYNC_INTERVAL, DeviceConfig, DeviceHandler};
pub use error::{CommandError, ConnectivityError, Error, Result, SyncError};
pub use host::{
    DiscoveredDevice, DiscoveredScene, DiscoveryCandidate, DiscoverySink, HostRegistry,
};
pub use mapping::{ChannelDescriptor, ChannelKind, ItemType};
pub use snapshot::{ControllerData, DeviceSnapshot, SceneSnapshot};
pub use types::{Category, ChannelValue, OnOff, OpenClosed, Status, StatusDetail, StatusInfo};
