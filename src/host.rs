// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traits implemented by the embedding host platform.
//!
//! The host owns the entity/channel registry, the status surface, and the
//! discovery inbox; this library drives them through the two traits below.
//! Implementations must be cheap and non-blocking: they are invoked from
//! synchronization passes and from status cascades.

use std::net::Ipv4Addr;

use crate::mapping::ChannelDescriptor;
use crate::types::{Category, ChannelValue, StatusInfo};

/// Entity/channel registry and status surface of the host platform.
pub trait HostRegistry: Send + Sync {
    /// A channel was derived for a device entity. Create-or-update by the
    /// descriptor's composite key; calling this twice with the same key
    /// must not create a duplicate.
    fn channel_created(&self, device_uid: &str, channel: &ChannelDescriptor);

    /// Returns true if the channel is currently linked (consumed) on the
    /// host side. Unlinked channels receive no value conversions.
    fn is_linked(&self, device_uid: &str, channel_key: &str) -> bool;

    /// Pushes a freshly converted value to a channel.
    fn push_value(&self, device_uid: &str, channel_key: &str, value: ChannelValue);

    /// The entity's display label or location changed.
    fn label_changed(&self, entity_uid: &str, label: &str, location: Option<&str>);

    /// The entity's status changed.
    fn status_changed(&self, entity_uid: &str, status: &StatusInfo);
}

/// A controller found by the network scanner, not yet known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryCandidate {
    /// Network address the controller answered on.
    pub address: Ipv4Addr,
    /// Stable identifier derived from the address.
    pub uid: String,
    /// Suggested display label.
    pub label: String,
}

impl DiscoveryCandidate {
    /// Builds a candidate for a responding address.
    #[must_use]
    pub fn from_address(address: Ipv4Addr) -> Self {
        Self {
            address,
            uid: address.to_string().replace('.', "_"),
            label: format!("Vera controller {address}"),
        }
    }
}

/// A device found in a bridge's cached snapshot, not yet known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Uid of the owning bridge.
    pub bridge_uid: String,
    /// Stable identifier for the device entity.
    pub uid: String,
    /// Controller-assigned device id.
    pub id: String,
    /// Suggested display label.
    pub label: String,
    /// Device category.
    pub category: Category,
    /// Category refinement.
    pub subcategory: u8,
}

/// A scene found in a bridge's cached snapshot, not yet known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredScene {
    /// Uid of the owning bridge.
    pub bridge_uid: String,
    /// Stable identifier for the scene entity.
    pub uid: String,
    /// Controller-assigned scene id.
    pub id: String,
    /// Suggested display label.
    pub label: String,
}

/// Discovery inbox and deduplication oracle of the host platform.
///
/// `is_known` answers whether an equivalent discovery result or registered
/// entity already exists; candidates are forwarded at most once and never
/// retained by this library.
pub trait DiscoverySink: Send + Sync {
    /// Returns true if an entity or pending discovery result with this uid
    /// already exists on the host side.
    fn is_known(&self, uid: &str) -> bool;

    /// A new controller candidate was found on the network.
    fn controller_found(&self, candidate: DiscoveryCandidate);

    /// A new device was found in a bridge's snapshot.
    fn device_found(&self, device: DiscoveredDevice);

    /// A new scene was found in a bridge's snapshot.
    fn scene_found(&self, scene: DiscoveredScene);
}

#[cfg(test)]
pub(crate) mod tests_support {
    //! Recording doubles for the host traits, shared across unit tests.

    use std::collections::HashSet;

    use parking_lot::Mutex;

    use super::{
        DiscoveredDevice, DiscoveredScene, DiscoveryCandidate, DiscoverySink, HostRegistry,
    };
    use crate::mapping::ChannelDescriptor;
    use crate::types::{ChannelValue, StatusInfo};

    /// Records every registry call; channels default to linked.
    #[derive(Default)]
    pub(crate) struct RecordingRegistry {
        pub channels: Mutex<Vec<(String, ChannelDescriptor)>>,
        pub values: Mutex<Vec<(String, String, ChannelValue)>>,
        pub labels: Mutex<Vec<(String, String, Option<String>)>>,
        pub statuses: Mutex<Vec<(String, StatusInfo)>>,
        pub unlinked: Mutex<HashSet<String>>,
    }

    impl RecordingRegistry {
        pub fn mark_unlinked(&self, channel_key: &str) {
            self.unlinked.lock().insert(channel_key.to_string());
        }

        pub fn statuses_for(&self, entity_uid: &str) -> Vec<StatusInfo> {
            self.statuses
                .lock()
                .iter()
                .filter(|(uid, _)| uid == entity_uid)
                .map(|(_, status)| status.clone())
                .collect()
        }

        pub fn channel_keys(&self, device_uid: &str) -> Vec<String> {
            self.channels
                .lock()
                .iter()
                .filter(|(uid, _)| uid == device_uid)
                .map(|(_, channel)| channel.composite_key())
                .collect()
        }

        pub fn values_for(&self, channel_key: &str) -> Vec<ChannelValue> {
            self.values
                .lock()
                .iter()
                .filter(|(_, key, _)| key == channel_key)
                .map(|(_, _, value)| value.clone())
                .collect()
        }
    }

    impl HostRegistry for RecordingRegistry {
        fn channel_created(&self, device_uid: &str, channel: &ChannelDescriptor) {
            self.channels
                .lock()
                .push((device_uid.to_string(), channel.clone()));
        }

        fn is_linked(&self, _device_uid: &str, channel_key: &str) -> bool {
            !self.unlinked.lock().contains(channel_key)
        }

        fn push_value(&self, device_uid: &str, channel_key: &str, value: ChannelValue) {
            self.values.lock().push((
                device_uid.to_string(),
                channel_key.to_string(),
                value,
            ));
        }

        fn label_changed(&self, entity_uid: &str, label: &str, location: Option<&str>) {
            self.labels.lock().push((
                entity_uid.to_string(),
                label.to_string(),
                location.map(String::from),
            ));
        }

        fn status_changed(&self, entity_uid: &str, status: &StatusInfo) {
            self.statuses
                .lock()
                .push((entity_uid.to_string(), status.clone()));
        }
    }

    /// Records discovery emissions; emitted uids become known, like a host
    /// that retains its inbox.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub known: Mutex<HashSet<String>>,
        pub controllers: Mutex<Vec<DiscoveryCandidate>>,
        pub devices: Mutex<Vec<DiscoveredDevice>>,
        pub scenes: Mutex<Vec<DiscoveredScene>>,
    }

    impl RecordingSink {
        pub fn mark_known(&self, uid: &str) {
            self.known.lock().insert(uid.to_string());
        }
    }

    impl DiscoverySink for RecordingSink {
        fn is_known(&self, uid: &str) -> bool {
            self.known.lock().contains(uid)
        }

        fn controller_found(&self, candidate: DiscoveryCandidate) {
            self.known.lock().insert(candidate.uid.clone());
            self.controllers.lock().push(candidate);
        }

        fn device_found(&self, device: DiscoveredDevice) {
            self.known.lock().insert(device.uid.clone());
            self.devices.lock().push(device);
        }

        fn scene_found(&self, scene: DiscoveredScene) {
            self.known.lock().insert(scene.uid.clone());
            self.scenes.lock().push(scene);
        }
    }
}
