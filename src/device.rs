// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device handler: per-device synchronization and command dispatch.
//!
//! A [`DeviceHandler`] owns one device entity on the host side. It never
//! issues its own network calls: synchronization reads the owning bridge's
//! cached snapshot, reconciles the channel set through the mapping table,
//! and pushes converted values for linked channels. Inbound commands are
//! translated into controller actions, fire-and-forget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::bridge::{BridgeHandler, BridgeRef, CONNECT_DELAY};
use crate::command::DeviceCommand;
use crate::convert;
use crate::error::SyncError;
use crate::host::HostRegistry;
use crate::mapping::{self, ChannelDescriptor};
use crate::snapshot::{ControllerData, DeviceSnapshot};
use crate::types::{OnOff, OpenClosed, Status, StatusDetail, StatusInfo};

/// Default interval between synchronization passes of one device.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for one device entity.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Controller-assigned device id; required.
    pub device_id: Option<String>,
    /// Interval between synchronization passes.
    pub sync_interval: Duration,
}

impl DeviceConfig {
    /// Creates a configuration for the device with the given controller id.
    #[must_use]
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }

    /// Sets the synchronization interval.
    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

/// Handler for one device entity.
///
/// Cheaply cloneable; all clones share the same state. Bind it to its
/// owning bridge with [`BridgeHandler::bind_device`] before
/// [`initialize`](Self::initialize).
#[derive(Clone)]
pub struct DeviceHandler {
    inner: Arc<DeviceInner>,
}

struct DeviceInner {
    uid: String,
    config: Mutex<DeviceConfig>,
    registry: Arc<dyn HostRegistry>,
    bridge: RwLock<BridgeRef>,
    status: RwLock<StatusInfo>,
    channels: Mutex<Vec<ChannelDescriptor>>,
    label: Mutex<Option<(String, Option<String>)>>,
    /// Serializes channel-set mutation so a poll-driven pass and a
    /// host-driven refresh cannot race into duplicate creation.
    sync_lock: Mutex<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    disposed: AtomicBool,
}

impl DeviceHandler {
    /// Creates a device handler. Nothing is scheduled until
    /// [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(
        uid: impl Into<String>,
        config: DeviceConfig,
        registry: Arc<dyn HostRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(DeviceInner {
                uid: uid.into(),
                config: Mutex::new(config),
                registry,
                bridge: RwLock::new(BridgeRef::default()),
                status: RwLock::new(StatusInfo::default()),
                channels: Mutex::new(Vec::new()),
                label: Mutex::new(None),
                sync_lock: Mutex::new(()),
                tasks: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the device entity uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.inner.uid
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> StatusInfo {
        self.inner.status.read().clone()
    }

    /// Returns the channels created for this device so far.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelDescriptor> {
        self.inner.channels.lock().clone()
    }

    /// Resolves the owning bridge, if still alive.
    #[must_use]
    pub fn bridge(&self) -> Option<BridgeHandler> {
        self.inner.bridge.read().upgrade()
    }

    pub(crate) fn attach_bridge(&self, bridge: BridgeRef) {
        *self.inner.bridge.write() = bridge;
    }

    /// Validates configuration and schedules the initializer and the
    /// repeating synchronization task.
    ///
    /// A missing `device_id` moves the handler straight to
    /// `OFFLINE (ConfigurationError)` and schedules nothing.
    pub fn initialize(&self) {
        tracing::debug!(uid = %self.inner.uid, "Initializing device handler");

        let (device_id, sync_interval) = {
            let config = self.inner.config.lock();
            (config.device_id.clone(), config.sync_interval)
        };

        if device_id.filter(|id| !id.is_empty()).is_none() {
            self.set_status(StatusInfo::offline(
                StatusDetail::ConfigurationError,
                "Couldn't create device, deviceId is missing.",
            ));
            return;
        }

        self.set_status(StatusInfo::unknown(
            StatusDetail::ConfigurationPending,
            "Checking configuration and bridge...",
        ));

        let handler = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(CONNECT_DELAY).await;
            handler.run_initializer();

            let mut ticker = tokio::time::interval(sync_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                handler.run_sync_pass();
            }
        });
        self.inner.tasks.lock().push(task);
    }

    /// Initializer: mirror the bridge status and build the channel set.
    fn run_initializer(&self) {
        match self.bridge() {
            Some(bridge) if bridge.status().is_online() => {
                tracing::debug!(
                    uid = %self.inner.uid,
                    status = %bridge.status(),
                    "Adopting bridge status"
                );
                if let Err(e) = self.synchronize() {
                    tracing::debug!(uid = %self.inner.uid, error = %e, "Initial sync incomplete");
                }
            }
            _ => {
                self.set_status(StatusInfo::offline(
                    StatusDetail::HandlerInitializingError,
                    "Controller is not online",
                ));
            }
        }
    }

    /// One scheduled pass of the repeating sync task.
    fn run_sync_pass(&self) {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return;
        }
        match self.bridge() {
            Some(bridge) if bridge.status().is_online() => {
                if let Err(e) = self.synchronize() {
                    tracing::debug!(uid = %self.inner.uid, error = %e, "Sync pass incomplete");
                }
            }
            _ => {
                tracing::debug!(uid = %self.inner.uid, "Bridge handler not found or not ONLINE");
            }
        }
    }

    /// Synchronizes the device against the bridge's cached snapshot.
    ///
    /// Looks up this device in the latest snapshot; if absent, sets status
    /// `UNKNOWN` with a descriptive detail and touches no channels. If
    /// present: updates label/location, creates any channel the mapping
    /// table expects that does not yet exist (by composite key), and pushes
    /// converted values to every linked channel. Unlinked channels are
    /// skipped entirely. Already-created channels are never removed. After
    /// a successful pass the device status mirrors the bridge status.
    ///
    /// # Errors
    ///
    /// Returns error if no bridge is bound or the device is absent from
    /// the latest snapshot; the failure is local to this device.
    pub fn synchronize(&self) -> Result<(), SyncError> {
        let Some(device_id) = self.inner.config.lock().device_id.clone() else {
            return Ok(()); // configuration error already reported
        };

        let Some(bridge) = self.bridge() else {
            self.set_status(StatusInfo::unknown(
                StatusDetail::HandlerInitializingError,
                "No bridge is bound to this device.",
            ));
            return Err(SyncError::BridgeMissing { id: device_id });
        };

        let Some(data) = bridge.data() else {
            self.set_status(StatusInfo::unknown(
                StatusDetail::None,
                format!("No controller data cached yet for device {device_id}"),
            ));
            return Err(SyncError::DeviceMissing { id: device_id });
        };

        let _guard = self.inner.sync_lock.lock();

        let Some(device) = data.device(&device_id) else {
            tracing::debug!(uid = %self.inner.uid, id = %device_id, "Device disconnected");
            self.set_status(StatusInfo::unknown(
                StatusDetail::None,
                format!("Device {device_id} not found in latest controller data"),
            ));
            return Err(SyncError::DeviceMissing { id: device_id });
        };

        self.update_label(device, &data);
        self.reconcile_channels(device, bridge.tag_channels());
        self.refresh_channels(device);

        self.set_status(bridge.status());
        Ok(())
    }

    /// Updates the host-side label/location if changed from current.
    fn update_label(&self, device: &DeviceSnapshot, data: &ControllerData) {
        let location = device
            .room
            .as_deref()
            .and_then(|room_id| data.room_name(room_id))
            .map(String::from);

        let mut label = self.inner.label.lock();
        let current = (device.name.clone(), location);
        if label.as_ref() != Some(&current) {
            tracing::debug!(
                uid = %self.inner.uid,
                label = %current.0,
                location = ?current.1,
                "Updating device label and location"
            );
            self.inner
                .registry
                .label_changed(&self.inner.uid, &current.0, current.1.as_deref());
            *label = Some(current);
        }
    }

    /// Creates every expected channel that does not already exist.
    fn reconcile_channels(&self, device: &DeviceSnapshot, tag_channels: bool) {
        let expected = mapping::channels_for(device, tag_channels);
        let mut channels = self.inner.channels.lock();
        for descriptor in expected {
            let key = descriptor.composite_key();
            if channels
                .iter()
                .any(|existing| existing.composite_key() == key)
            {
                continue;
            }
            tracing::debug!(uid = %self.inner.uid, channel = %key, "Adding channel");
            self.inner
                .registry
                .channel_created(&self.inner.uid, &descriptor);
            channels.push(descriptor);
        }
    }

    /// Converts and pushes values for every linked channel.
    fn refresh_channels(&self, device: &DeviceSnapshot) {
        let channels = self.inner.channels.lock().clone();
        for channel in channels {
            let key = channel.composite_key();
            if !self.inner.registry.is_linked(&self.inner.uid, &key) {
                tracing::debug!(uid = %self.inner.uid, channel = %key, "Channel not linked, skipping");
                continue;
            }
            match convert::value_for(channel.kind, device) {
                Some(value) => {
                    self.inner.registry.push_value(&self.inner.uid, &key, value);
                }
                None => {
                    tracing::debug!(
                        uid = %self.inner.uid,
                        channel = %key,
                        "No convertible value in snapshot"
                    );
                }
            }
        }
    }

    /// Reacts to a bridge status change (invoked synchronously by the
    /// bridge's cascade).
    pub(crate) fn bridge_status_changed(&self, info: &StatusInfo) {
        tracing::debug!(uid = %self.inner.uid, status = %info, "Bridge status changed");
        match info.status {
            Status::Offline => {
                self.set_status(StatusInfo::offline(
                    StatusDetail::BridgeOffline,
                    "Bridge status is offline.",
                ));
            }
            Status::Online => {
                let handler = self.clone();
                tokio::spawn(async move {
                    handler.run_initializer();
                });
            }
            Status::Unknown => {
                self.set_status(info.clone());
            }
        }
    }

    /// Translates an inbound command into a controller action.
    ///
    /// Preconditions: the bridge must be online and the device must exist
    /// in the cached snapshot; otherwise the dispatch is a logged no-op.
    /// Actions are fire-and-forget: failures are logged, never escalated,
    /// and success is only observable on the next poll.
    pub async fn handle_command(&self, command: DeviceCommand) {
        tracing::debug!(uid = %self.inner.uid, command = %command, "Handling command");

        let Some(device_id) = self.inner.config.lock().device_id.clone() else {
            tracing::debug!(uid = %self.inner.uid, "No deviceId configured, dropping command");
            return;
        };

        let Some(bridge) = self.bridge().filter(|b| b.status().is_online()) else {
            tracing::debug!(uid = %self.inner.uid, "Bridge handler not found or not ONLINE");
            return;
        };

        if bridge
            .data()
            .is_none_or(|data| data.device(&device_id).is_none())
        {
            tracing::warn!(uid = %self.inner.uid, id = %device_id, "Device not loaded");
            return;
        }

        if matches!(command, DeviceCommand::Refresh) {
            if let Err(e) = self.synchronize() {
                tracing::debug!(uid = %self.inner.uid, error = %e, "Refresh incomplete");
            }
            return;
        }

        let Some(client) = bridge.client() else {
            tracing::debug!(uid = %self.inner.uid, "Controller client not available");
            return;
        };

        let result = match command {
            DeviceCommand::Percent(value) => {
                client.set_level(&device_id, &value.min(100).to_string()).await
            }
            DeviceCommand::Level(value) => client.set_level(&device_id, &value.to_string()).await,
            DeviceCommand::Switch(OnOff::On) => client.switch(&device_id, true).await,
            DeviceCommand::Switch(OnOff::Off) => client.switch(&device_id, false).await,
            // Inverted by domain convention: CLOSED turns on, OPEN turns off.
            DeviceCommand::Contact(OpenClosed::Closed) => client.switch(&device_id, true).await,
            DeviceCommand::Contact(OpenClosed::Open) => client.switch(&device_id, false).await,
            DeviceCommand::Refresh => return, // handled above
        };

        if let Err(e) = result {
            tracing::warn!(
                uid = %self.inner.uid,
                id = %device_id,
                command = %command,
                error = %e,
                "Controller action failed"
            );
        }
    }

    /// Stores a status change and reports it to the host.
    fn set_status(&self, info: StatusInfo) {
        {
            let mut status = self.inner.status.write();
            if *status == info {
                return;
            }
            *status = info.clone();
        }
        tracing::debug!(uid = %self.inner.uid, status = %info, "Device status changed");
        self.inner.registry.status_changed(&self.inner.uid, &info);
    }

    /// Disposes the handler: cancels scheduled work and releases the
    /// identifying configuration.
    pub fn dispose(&self) {
        tracing::debug!(uid = %self.inner.uid, "Disposing device handler");
        self.inner.disposed.store(true, Ordering::SeqCst);
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
        self.inner.config.lock().device_id = None;
    }
}

impl std::fmt::Debug for DeviceHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandler")
            .field("uid", &self.inner.uid)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
