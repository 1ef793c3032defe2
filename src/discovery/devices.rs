// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device and scene discovery from a bridge's cached snapshot.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::bridge::BridgeHandler;
use crate::host::{DiscoveredDevice, DiscoveredScene, DiscoverySink};

/// Delay before the first background scan.
const BACKGROUND_INITIAL_DELAY: Duration = Duration::from_secs(15);

/// Interval between background scans.
const BACKGROUND_INTERVAL: Duration = Duration::from_secs(240);

/// Stable uid for a device entity under its bridge.
fn device_uid(bridge_uid: &str, device_id: &str) -> String {
    format!("{bridge_uid}:device:{device_id}")
}

/// Stable uid for a scene entity under its bridge.
fn scene_uid(bridge_uid: &str, scene_id: &str) -> String {
    format!("{bridge_uid}:scene:{scene_id}")
}

/// Emits a bridge's devices and scenes into the host's discovery inbox.
///
/// Reads only the bridge's cached snapshot, never the network. Supports a
/// one-shot foreground [`scan`](Self::scan) and a separately cancellable
/// repeating background task; both share the same dedup discipline.
pub struct DeviceDiscovery {
    bridge: BridgeHandler,
    sink: Arc<dyn DiscoverySink>,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceDiscovery {
    /// Creates a discovery service for one bridge.
    #[must_use]
    pub fn new(bridge: BridgeHandler, sink: Arc<dyn DiscoverySink>) -> Self {
        Self {
            bridge,
            sink,
            background: Mutex::new(None),
        }
    }

    /// Runs one foreground scan over the bridge's cached snapshot.
    pub fn scan(&self) {
        scan_bridge(&self.bridge, &self.sink);
    }

    /// Starts the repeating background scan, if not already running.
    pub fn start_background(&self) {
        let mut background = self.background.lock();
        if background.as_ref().is_some_and(|task| !task.is_finished()) {
            tracing::debug!(bridge = %self.bridge.uid(), "Background scan already active");
            return;
        }

        tracing::debug!(bridge = %self.bridge.uid(), "Starting background scan");
        let bridge = self.bridge.clone();
        let sink = Arc::clone(&self.sink);
        *background = Some(tokio::spawn(async move {
            tokio::time::sleep(BACKGROUND_INITIAL_DELAY).await;
            loop {
                scan_bridge(&bridge, &sink);
                tokio::time::sleep(BACKGROUND_INTERVAL).await;
            }
        }));
    }

    /// Stops the background scan, if running.
    pub fn stop_background(&self) {
        if let Some(task) = self.background.lock().take() {
            tracing::debug!(bridge = %self.bridge.uid(), "Stopping background scan");
            task.abort();
        }
    }
}

impl Drop for DeviceDiscovery {
    fn drop(&mut self) {
        self.stop_background();
    }
}

/// Emits every unknown device and scene in the bridge's cached snapshot.
fn scan_bridge(bridge: &BridgeHandler, sink: &Arc<dyn DiscoverySink>) {
    tracing::debug!(bridge = %bridge.uid(), "Scanning bridge for devices and scenes");

    if !bridge.status().is_online() {
        tracing::debug!(bridge = %bridge.uid(), "Bridge handler not found or not ONLINE");
        return;
    }
    let Some(data) = bridge.data() else {
        return;
    };

    let bridge_uid = bridge.uid();
    for device in &data.devices {
        // Controller-internal records represent the hub, not a device.
        if device.category.is_controller_internal() {
            continue;
        }
        let uid = device_uid(bridge_uid, &device.id);
        if sink.is_known(&uid) {
            continue;
        }
        tracing::debug!(id = %device.id, name = %device.name, "Device found");
        sink.device_found(DiscoveredDevice {
            bridge_uid: bridge_uid.to_string(),
            uid,
            id: device.id.clone(),
            label: device.name.clone(),
            category: device.category,
            subcategory: device.subcategory,
        });
    }

    for scene in &data.scenes {
        let uid = scene_uid(bridge_uid, &scene.id);
        if sink.is_known(&uid) {
            continue;
        }
        tracing::debug!(id = %scene.id, name = %scene.name, "Scene found");
        sink.scene_found(DiscoveredScene {
            bridge_uid: bridge_uid.to_string(),
            uid,
            id: scene.id.clone(),
            label: scene.name.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeConfig;
    use crate::host::HostRegistry;
    use crate::host::tests_support::{RecordingRegistry, RecordingSink};
    use crate::snapshot::ControllerData;
    use crate::types::StatusInfo;

    fn online_bridge_with_data(json: serde_json::Value) -> BridgeHandler {
        let registry = Arc::new(RecordingRegistry::default());
        let bridge = BridgeHandler::new(
            "bridge-1",
            BridgeConfig::new("192.168.1.10"),
            registry as Arc<dyn HostRegistry>,
        );
        bridge.set_status(StatusInfo::online());
        let data: ControllerData = serde_json::from_value(json).unwrap();
        bridge.apply_data(Arc::new(data));
        bridge
    }

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "devices": [
                { "id": "1", "name": "Hub", "category": 0, "subcategory": 0 },
                { "id": "2", "name": "Z-Wave", "category": 1, "subcategory": 0 },
                { "id": "5", "name": "Hall Switch", "category": 3, "subcategory": 1 },
                { "id": "9", "name": "Basement Flood", "category": 4, "subcategory": 2 }
            ],
            "scenes": [
                { "id": "3", "name": "Good Night" }
            ]
        })
    }

    #[tokio::test]
    async fn scan_emits_devices_and_scenes_skipping_controller_records() {
        let bridge = online_bridge_with_data(sample());
        let sink = Arc::new(RecordingSink::default());
        let discovery = DeviceDiscovery::new(bridge, sink.clone() as Arc<dyn DiscoverySink>);

        discovery.scan();

        let devices = sink.devices.lock().clone();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "5");
        assert_eq!(devices[0].uid, "bridge-1:device:5");
        assert_eq!(devices[1].id, "9");

        let scenes = sink.scenes.lock().clone();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].uid, "bridge-1:scene:3");
    }

    #[tokio::test]
    async fn second_scan_emits_nothing_new() {
        let bridge = online_bridge_with_data(sample());
        let sink = Arc::new(RecordingSink::default());
        let discovery = DeviceDiscovery::new(bridge, sink.clone() as Arc<dyn DiscoverySink>);

        discovery.scan();
        discovery.scan();

        assert_eq!(sink.devices.lock().len(), 2);
        assert_eq!(sink.scenes.lock().len(), 1);
    }

    #[tokio::test]
    async fn known_entities_are_not_re_emitted() {
        let bridge = online_bridge_with_data(sample());
        let sink = Arc::new(RecordingSink::default());
        sink.mark_known("bridge-1:device:5");
        let discovery = DeviceDiscovery::new(bridge, sink.clone() as Arc<dyn DiscoverySink>);

        discovery.scan();

        let devices = sink.devices.lock().clone();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "9");
    }

    #[tokio::test]
    async fn offline_bridge_yields_no_emissions() {
        let registry = Arc::new(RecordingRegistry::default());
        let bridge = BridgeHandler::new(
            "bridge-1",
            BridgeConfig::new("192.168.1.10"),
            registry as Arc<dyn HostRegistry>,
        );
        let sink = Arc::new(RecordingSink::default());
        let discovery = DeviceDiscovery::new(bridge, sink.clone() as Arc<dyn DiscoverySink>);

        discovery.scan();

        assert!(sink.devices.lock().is_empty());
        assert!(sink.scenes.lock().is_empty());
    }

    #[tokio::test]
    async fn background_scan_starts_and_stops() {
        let bridge = online_bridge_with_data(sample());
        let sink = Arc::new(RecordingSink::default());
        let discovery = DeviceDiscovery::new(bridge, sink as Arc<dyn DiscoverySink>);

        discovery.start_background();
        assert!(discovery.background.lock().is_some());

        // A second start is a no-op while the task is live.
        discovery.start_background();

        discovery.stop_background();
        assert!(discovery.background.lock().is_none());
    }
}
