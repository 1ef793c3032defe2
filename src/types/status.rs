// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectivity status for bridges and devices.

use std::fmt;

/// Tri-state reachability of a bridge or device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The entity is reachable and operational.
    Online,
    /// The entity is known to be unreachable.
    Offline,
    /// Reachability has not been established, or the entity vanished from
    /// the latest snapshot.
    Unknown,
}

impl Status {
    /// Returns true if the entity is online.
    #[must_use]
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::Offline => write!(f, "OFFLINE"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Machine-readable detail accompanying a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusDetail {
    /// No further detail.
    #[default]
    None,
    /// Configuration is being checked before the first connect attempt.
    ConfigurationPending,
    /// A required configuration value is missing.
    ConfigurationError,
    /// The first connect or initialization attempt failed.
    HandlerInitializingError,
    /// The owning bridge reported itself offline.
    BridgeOffline,
    /// A poll request failed after the entity had been online.
    CommunicationError,
}

/// Status plus detail code and free-text description.
///
/// This is the unit pushed to the host's status-reporting surface and
/// cascaded from a bridge to its bound devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusInfo {
    /// Reachability state.
    pub status: Status,
    /// Detail code.
    pub detail: StatusDetail,
    /// Human-readable description, if any.
    pub description: Option<String>,
}

impl StatusInfo {
    /// An `ONLINE` status with no detail.
    #[must_use]
    pub fn online() -> Self {
        Self {
            status: Status::Online,
            detail: StatusDetail::None,
            description: None,
        }
    }

    /// An `OFFLINE` status with a detail code and description.
    #[must_use]
    pub fn offline(detail: StatusDetail, description: impl Into<String>) -> Self {
        Self {
            status: Status::Offline,
            detail,
            description: Some(description.into()),
        }
    }

    /// An `UNKNOWN` status with a detail code and description.
    #[must_use]
    pub fn unknown(detail: StatusDetail, description: impl Into<String>) -> Self {
        Self {
            status: Status::Unknown,
            detail,
            description: Some(description.into()),
        }
    }

    /// Returns true if the status is `ONLINE`.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }
}

impl Default for StatusInfo {
    /// The initial state of every handler before initialization.
    fn default() -> Self {
        Self {
            status: Status::Unknown,
            detail: StatusDetail::None,
            description: None,
        }
    }
}

impl fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "{} ({:?}): {desc}", self.status, self.detail),
            None => write!(f, "{} ({:?})", self.status, self.detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unknown() {
        let info = StatusInfo::default();
        assert_eq!(info.status, Status::Unknown);
        assert_eq!(info.detail, StatusDetail::None);
        assert!(info.description.is_none());
    }

    #[test]
    fn online_is_online() {
        assert!(StatusInfo::online().is_online());
        assert!(!StatusInfo::offline(StatusDetail::BridgeOffline, "down").is_online());
    }

    #[test]
    fn display_includes_description() {
        let info = StatusInfo::offline(StatusDetail::ConfigurationError, "ipAddress required");
        assert_eq!(
            info.to_string(),
            "OFFLINE (ConfigurationError): ipAddress required"
        );
    }
}
