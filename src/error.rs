// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `veralink` library.
//!
//! The taxonomy mirrors how failures propagate: configuration problems are
//! fatal until reconfigured, connectivity problems downgrade status and are
//! retried on the next scheduled interval, synchronization problems stay
//! local to one device, and command problems are logged and dropped.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration value is missing or invalid.
    ///
    /// Fatal until the handler is reconfigured; nothing is scheduled.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The controller was unreachable or a poll request failed.
    #[error("connectivity error: {0}")]
    Connectivity(#[from] ConnectivityError),

    /// A single device failed to synchronize while the bridge was reachable.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// An inbound command could not be translated into a controller action.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

/// Errors talking to the controller over the network.
///
/// Always recoverable: the bridge downgrades its status and the next
/// scheduled poll is the sole retry mechanism.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// The HTTP request itself failed (connect, timeout, I/O).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The controller answered with a non-200 status.
    #[error("unexpected response status: {0}")]
    UnexpectedStatus(u16),

    /// The controller answered 200 but the body was not valid data.
    #[error("malformed controller response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Errors local to one device's synchronization pass.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The device id was not present in the latest cached snapshot.
    #[error("device {id} not found in latest controller data")]
    DeviceMissing {
        /// Controller-assigned device id.
        id: String,
    },

    /// No bridge is bound to the device handler.
    #[error("no bridge bound to device {id}")]
    BridgeMissing {
        /// Controller-assigned device id.
        id: String,
    },

    /// A raw attribute could not be converted for a channel.
    #[error("cannot convert value for channel {channel}: {message}")]
    ConversionFailed {
        /// Composite channel key.
        channel: String,
        /// Description of the conversion failure.
        message: String,
    },
}

/// Errors translating an inbound command.
///
/// Commands are fire-and-forget: these are logged by the dispatcher and
/// never escalated to entity status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The owning bridge is not online.
    #[error("bridge is not online")]
    BridgeOffline,

    /// The device is not present in the cached snapshot.
    #[error("device {id} not loaded")]
    DeviceUnknown {
        /// Controller-assigned device id.
        id: String,
    },

    /// No controller action is defined for this command/category pair.
    #[error("unsupported command {command} for device {id}")]
    Unsupported {
        /// Controller-assigned device id.
        id: String,
        /// Display form of the rejected command.
        command: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
