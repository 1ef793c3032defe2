// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed channel values pushed to the host platform.

use std::fmt;

/// Binary on/off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnOff {
    /// Powered / active / tripped.
    On,
    /// Unpowered / inactive / idle.
    Off,
}

impl OnOff {
    /// Maps the controller's "0"/"1" convention.
    #[must_use]
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(Self::On),
            "0" => Some(Self::Off),
            _ => None,
        }
    }
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

/// Contact state of a door/window sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenClosed {
    /// The contact is open (sensor tripped).
    Open,
    /// The contact is closed.
    Closed,
}

impl fmt::Display for OpenClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// A typed value for one channel, produced by the per-kind converters.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValue {
    /// Binary switch state.
    OnOff(OnOff),
    /// Contact state.
    Contact(OpenClosed),
    /// Percentage in 0-100 (dimmer level, shutter position).
    Percent(u8),
    /// Dimensionless or unit-bearing number (temperature, watts, battery).
    Decimal(f64),
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOff(v) => write!(f, "{v}"),
            Self::Contact(v) => write!(f, "{v}"),
            Self::Percent(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_off_from_raw() {
        assert_eq!(OnOff::from_raw("1"), Some(OnOff::On));
        assert_eq!(OnOff::from_raw("0"), Some(OnOff::Off));
        assert_eq!(OnOff::from_raw(" 1 "), Some(OnOff::On));
        assert_eq!(OnOff::from_raw("2"), None);
        assert_eq!(OnOff::from_raw(""), None);
    }

    #[test]
    fn display_forms() {
        assert_eq!(ChannelValue::OnOff(OnOff::On).to_string(), "ON");
        assert_eq!(ChannelValue::Contact(OpenClosed::Open).to_string(), "OPEN");
        assert_eq!(ChannelValue::Percent(75).to_string(), "75");
        assert_eq!(ChannelValue::Decimal(21.5).to_string(), "21.5");
    }
}
