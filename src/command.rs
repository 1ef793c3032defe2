// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound commands from the host platform.
//!
//! A [`DeviceCommand`] arrives from the host for a specific device and is
//! translated into a controller action by
//! [`DeviceHandler::handle_command`](crate::DeviceHandler::handle_command).
//! Commands are fire-and-forget: no acknowledgement is awaited, and success
//! is only observable indirectly on the next poll.

use std::fmt;

use crate::types::{OnOff, OpenClosed};

/// A typed command for a device, as issued by the host platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    /// Resynchronize immediately, bypassing the normal poll interval.
    Refresh,
    /// Set a percentage level, 0-100.
    Percent(u8),
    /// Set a numeric level.
    Level(f64),
    /// Turn the device on or off.
    Switch(OnOff),
    /// Open/close a contact-style actuator.
    ///
    /// By domain convention this is inverted: CLOSED turns the device on,
    /// OPEN turns it off.
    Contact(OpenClosed),
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refresh => write!(f, "REFRESH"),
            Self::Percent(value) => write!(f, "PERCENT {value}"),
            Self::Level(value) => write!(f, "LEVEL {value}"),
            Self::Switch(state) => write!(f, "{state}"),
            Self::Contact(state) => write!(f, "{state}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(DeviceCommand::Refresh.to_string(), "REFRESH");
        assert_eq!(DeviceCommand::Percent(40).to_string(), "PERCENT 40");
        assert_eq!(DeviceCommand::Switch(OnOff::On).to_string(), "ON");
        assert_eq!(
            DeviceCommand::Contact(OpenClosed::Closed).to_string(),
            "CLOSED"
        );
    }
}
