// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge handler: connectivity lifecycle for one controller endpoint.
//!
//! A [`BridgeHandler`] owns the connection to one controller, polls its
//! data listing on a fixed interval, caches the latest snapshot, and
//! cascades every reachability change synchronously to all bound device
//! handlers before the state change completes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::device::DeviceHandler;
use crate::error::{Error, Result};
use crate::host::HostRegistry;
use crate::protocol::{CONTROLLER_PORT, ControllerClient};
use crate::snapshot::{ControllerData, DataCache};
use crate::types::{StatusDetail, StatusInfo};

/// Delay before the first connect attempt, letting the surrounding
/// environment settle after handler creation.
pub const CONNECT_DELAY: Duration = Duration::from_secs(2);

/// Default interval between controller polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for one controller endpoint.
///
/// # Examples
///
/// ```
/// use veralink::BridgeConfig;
/// use std::time::Duration;
///
/// let config = BridgeConfig::new("192.168.1.10")
///     .with_port(3480)
///     .with_poll_interval(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Controller address; required for the bridge to come online.
    pub ip_address: Option<String>,
    /// Controller port.
    pub port: u16,
    /// Interval between polls of the controller data listing.
    pub poll_interval: Duration,
    /// Attach semantic tags to derived channels.
    pub tag_channels: bool,
}

impl BridgeConfig {
    /// Creates a configuration for the controller at `ip_address`.
    #[must_use]
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            ..Self::default()
        }
    }

    /// Sets a custom controller port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Enables semantic tags on derived channels.
    #[must_use]
    pub fn with_tagged_channels(mut self) -> Self {
        self.tag_channels = true;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ip_address: None,
            port: CONTROLLER_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tag_channels: false,
        }
    }
}

/// Handler for one controller endpoint.
///
/// Cheaply cloneable; all clones share the same state. Lifecycle:
/// [`initialize`](Self::initialize) validates configuration and schedules a
/// delayed connect; once online, a repeating poll task refreshes the
/// snapshot cache until [`dispose`](Self::dispose).
#[derive(Clone)]
pub struct BridgeHandler {
    inner: Arc<BridgeInner>,
}

pub(crate) struct BridgeInner {
    uid: String,
    config: Mutex<BridgeConfig>,
    registry: Arc<dyn HostRegistry>,
    client: RwLock<Option<ControllerClient>>,
    status: RwLock<StatusInfo>,
    cache: DataCache,
    last_poll: RwLock<Option<DateTime<Utc>>>,
    devices: RwLock<Vec<DeviceHandler>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    disposed: AtomicBool,
}

/// Weak capability reference to a bridge, held by device handlers.
#[derive(Clone, Default)]
pub(crate) struct BridgeRef(Weak<BridgeInner>);

impl BridgeRef {
    pub fn upgrade(&self) -> Option<BridgeHandler> {
        self.0.upgrade().map(|inner| BridgeHandler { inner })
    }
}

impl BridgeHandler {
    /// Creates a bridge handler. Nothing is scheduled until
    /// [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(uid: impl Into<String>, config: BridgeConfig, registry: Arc<dyn HostRegistry>) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                uid: uid.into(),
                config: Mutex::new(config),
                registry,
                client: RwLock::new(None),
                status: RwLock::new(StatusInfo::default()),
                cache: DataCache::default(),
                last_poll: RwLock::new(None),
                devices: RwLock::new(Vec::new()),
                tasks: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the bridge uid.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.inner.uid
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> StatusInfo {
        self.inner.status.read().clone()
    }

    /// Returns the timestamp of the last successful poll.
    #[must_use]
    pub fn last_poll(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_poll.read()
    }

    /// Returns the latest cached snapshot, if any poll has succeeded.
    #[must_use]
    pub fn data(&self) -> Option<Arc<ControllerData>> {
        self.inner.cache.load()
    }

    /// Returns whether derived channels carry semantic tags.
    #[must_use]
    pub fn tag_channels(&self) -> bool {
        self.inner.config.lock().tag_channels
    }

    pub(crate) fn client(&self) -> Option<ControllerClient> {
        self.inner.client.read().clone()
    }

    pub(crate) fn downgrade(&self) -> BridgeRef {
        BridgeRef(Arc::downgrade(&self.inner))
    }

    /// Validates configuration and schedules the connect/poll lifecycle.
    ///
    /// A missing controller address moves the bridge straight to
    /// `OFFLINE (ConfigurationError)` and schedules nothing. Otherwise the
    /// first connect attempt runs after [`CONNECT_DELAY`] and polling
    /// continues on the configured interval until disposal.
    pub fn initialize(&self) {
        tracing::debug!(uid = %self.inner.uid, "Initializing bridge handler");

        let (ip_address, port, poll_interval) = {
            let config = self.inner.config.lock();
            (
                config.ip_address.clone(),
                config.port,
                config.poll_interval,
            )
        };

        let Some(ip_address) = ip_address.filter(|ip| !ip.is_empty()) else {
            self.set_status(StatusInfo::offline(
                StatusDetail::ConfigurationError,
                "Couldn't create controller client, ipAddress is missing.",
            ));
            return;
        };

        let client = match ControllerClient::new(&ip_address, port) {
            Ok(client) => client,
            Err(e) => {
                self.set_status(StatusInfo::offline(
                    StatusDetail::HandlerInitializingError,
                    format!("Couldn't create controller client: {e}"),
                ));
                return;
            }
        };
        *self.inner.client.write() = Some(client);

        self.set_status(StatusInfo::unknown(
            StatusDetail::ConfigurationPending,
            "Checking configuration and connectivity...",
        ));

        let handler = self.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(CONNECT_DELAY).await;
            handler.connect().await;

            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await; // first tick completes immediately
            loop {
                ticker.tick().await;
                handler.poll().await;
            }
        });
        self.inner.tasks.lock().push(task);
    }

    /// First connect attempt after the settle delay.
    async fn connect(&self) {
        match self.poll_data().await {
            Ok(()) => {
                tracing::info!(uid = %self.inner.uid, "Connected to controller");
                self.set_status(StatusInfo::online());
            }
            Err(e) => {
                tracing::warn!(uid = %self.inner.uid, error = %e, "Connect attempt failed");
                self.set_status(StatusInfo::offline(
                    StatusDetail::HandlerInitializingError,
                    format!("Cannot connect to controller: {e}"),
                ));
            }
        }
    }

    /// One poll cycle: fetch the data listing and swap the cache.
    ///
    /// Success (re)establishes `ONLINE`; failure downgrades to
    /// `OFFLINE (CommunicationError)`. The next scheduled interval is the
    /// sole retry mechanism.
    pub async fn poll(&self) {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return;
        }

        match self.poll_data().await {
            Ok(()) => self.set_status(StatusInfo::online()),
            Err(e) => {
                tracing::warn!(uid = %self.inner.uid, error = %e, "Controller poll failed");
                self.set_status(StatusInfo::offline(
                    StatusDetail::CommunicationError,
                    format!("Controller poll failed: {e}"),
                ));
            }
        }
    }

    async fn poll_data(&self) -> Result<()> {
        let client = self.client().ok_or_else(|| {
            Error::Configuration("controller client is not initialized".to_string())
        })?;
        let data = client.fetch_data().await.map_err(Error::Connectivity)?;
        self.apply_data(Arc::new(data));
        Ok(())
    }

    /// Replaces the cached snapshot and stamps the poll time.
    pub(crate) fn apply_data(&self, data: Arc<ControllerData>) {
        self.inner.cache.replace(data);
        *self.inner.last_poll.write() = Some(Utc::now());
    }

    /// Binds a device handler to this bridge.
    ///
    /// The device receives every subsequent status change synchronously.
    pub fn bind_device(&self, device: &DeviceHandler) {
        device.attach_bridge(self.downgrade());
        self.inner.devices.write().push(device.clone());
        tracing::debug!(
            uid = %self.inner.uid,
            device = %device.uid(),
            "Device handler bound to bridge"
        );
    }

    /// Unbinds a device handler by its uid.
    pub fn unbind_device(&self, device_uid: &str) {
        self.inner
            .devices
            .write()
            .retain(|device| device.uid() != device_uid);
    }

    /// Stores a status change, reports it to the host, and cascades it to
    /// every bound device handler before returning.
    pub(crate) fn set_status(&self, info: StatusInfo) {
        {
            let mut status = self.inner.status.write();
            if *status == info {
                return;
            }
            *status = info.clone();
        }

        tracing::debug!(uid = %self.inner.uid, status = %info, "Bridge status changed");
        self.inner.registry.status_changed(&self.inner.uid, &info);

        let devices = self.inner.devices.read().clone();
        for device in devices {
            device.bridge_status_changed(&info);
        }
    }

    /// Disposes the bridge: cancels scheduled polls, cascades an immediate
    /// `OFFLINE`, and releases the endpoint's identifying configuration.
    ///
    /// In-flight controller calls are not aborted; they time out naturally.
    pub fn dispose(&self) {
        tracing::debug!(uid = %self.inner.uid, "Disposing bridge handler");
        self.inner.disposed.store(true, Ordering::SeqCst);

        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }

        self.set_status(StatusInfo::offline(
            StatusDetail::None,
            "Bridge handler disposed.",
        ));

        self.inner.config.lock().ip_address = None;
        *self.inner.client.write() = None;
        self.inner.cache.clear();
    }

    /// Returns true if the handler was disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for BridgeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandler")
            .field("uid", &self.inner.uid)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
