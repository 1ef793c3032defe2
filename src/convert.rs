// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-kind conversion of raw snapshot attributes into typed channel values.
//!
//! Each channel kind reads exactly one raw attribute of the device
//! snapshot. A missing or unparseable attribute converts to `None`; the
//! synchronizer skips the push and the failure never leaves that device.

use crate::mapping::ChannelKind;
use crate::snapshot::DeviceSnapshot;
use crate::types::{ChannelValue, OnOff, OpenClosed};

fn on_off(raw: Option<&str>) -> Option<ChannelValue> {
    raw.and_then(OnOff::from_raw).map(ChannelValue::OnOff)
}

fn percent(raw: Option<&str>) -> Option<ChannelValue> {
    let level: f64 = raw?.trim().parse().ok()?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(ChannelValue::Percent(level.clamp(0.0, 100.0).round() as u8))
}

fn decimal(raw: Option<&str>) -> Option<ChannelValue> {
    raw?.trim().parse().ok().map(ChannelValue::Decimal)
}

/// Converts the snapshot attribute relevant to `kind` into a typed value.
///
/// Returns `None` when the attribute is absent or unparseable.
#[must_use]
pub fn value_for(kind: ChannelKind, device: &DeviceSnapshot) -> Option<ChannelValue> {
    match kind {
        ChannelKind::SwitchBinary => on_off(device.status.as_deref()),
        ChannelKind::Doorlock => on_off(device.locked.as_deref()),
        ChannelKind::SensorFlood
        | ChannelKind::SensorMotion
        | ChannelKind::SensorSmoke
        | ChannelKind::SensorCo
        | ChannelKind::SensorBinary => on_off(device.tripped.as_deref()),
        ChannelKind::SensorDoorWindow => {
            match OnOff::from_raw(device.tripped.as_deref()?)? {
                OnOff::On => Some(ChannelValue::Contact(OpenClosed::Open)),
                OnOff::Off => Some(ChannelValue::Contact(OpenClosed::Closed)),
            }
        }
        ChannelKind::SwitchMultilevel
        | ChannelKind::SwitchColor
        | ChannelKind::SwitchRollershutter => percent(device.level.as_deref()),
        ChannelKind::SensorTemperature => decimal(device.temperature.as_deref()),
        ChannelKind::SensorHumidity => decimal(device.humidity.as_deref()),
        ChannelKind::SensorLuminosity | ChannelKind::SensorUltraviolet => {
            decimal(device.light.as_deref())
        }
        ChannelKind::SensorEnergy | ChannelKind::SensorMeterW => {
            decimal(device.watts.as_deref())
        }
        ChannelKind::SensorMeterKwh => decimal(device.kwh.as_deref()),
        ChannelKind::Battery => decimal(device.battery_level.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(json: serde_json::Value) -> DeviceSnapshot {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn switch_status_converts_to_on_off() {
        let d = device(serde_json::json!({"id": "5", "category": 3, "status": "1"}));
        assert_eq!(
            value_for(ChannelKind::SwitchBinary, &d),
            Some(ChannelValue::OnOff(OnOff::On))
        );
    }

    #[test]
    fn door_window_tripped_is_open() {
        let d = device(serde_json::json!({"id": "8", "category": 4, "tripped": "1"}));
        assert_eq!(
            value_for(ChannelKind::SensorDoorWindow, &d),
            Some(ChannelValue::Contact(OpenClosed::Open))
        );

        let d = device(serde_json::json!({"id": "8", "category": 4, "tripped": "0"}));
        assert_eq!(
            value_for(ChannelKind::SensorDoorWindow, &d),
            Some(ChannelValue::Contact(OpenClosed::Closed))
        );
    }

    #[test]
    fn security_sensors_read_tripped() {
        let d = device(serde_json::json!({"id": "9", "category": 4, "tripped": "1"}));
        for kind in [
            ChannelKind::SensorFlood,
            ChannelKind::SensorMotion,
            ChannelKind::SensorSmoke,
            ChannelKind::SensorCo,
            ChannelKind::SensorBinary,
        ] {
            assert_eq!(value_for(kind, &d), Some(ChannelValue::OnOff(OnOff::On)));
        }
    }

    #[test]
    fn level_converts_to_clamped_percent() {
        let d = device(serde_json::json!({"id": "2", "category": 2, "level": "75"}));
        assert_eq!(
            value_for(ChannelKind::SwitchMultilevel, &d),
            Some(ChannelValue::Percent(75))
        );

        let d = device(serde_json::json!({"id": "2", "category": 2, "level": "140"}));
        assert_eq!(
            value_for(ChannelKind::SwitchMultilevel, &d),
            Some(ChannelValue::Percent(100))
        );
    }

    #[test]
    fn numeric_sensors_convert_to_decimal() {
        let d = device(serde_json::json!({
            "id": "3",
            "category": 17,
            "temperature": "21.5",
            "humidity": 40,
            "light": "88",
            "watts": "12.5",
            "kwh": "104.2",
            "batterylevel": "80"
        }));
        assert_eq!(
            value_for(ChannelKind::SensorTemperature, &d),
            Some(ChannelValue::Decimal(21.5))
        );
        assert_eq!(
            value_for(ChannelKind::SensorHumidity, &d),
            Some(ChannelValue::Decimal(40.0))
        );
        assert_eq!(
            value_for(ChannelKind::SensorLuminosity, &d),
            Some(ChannelValue::Decimal(88.0))
        );
        assert_eq!(
            value_for(ChannelKind::SensorMeterW, &d),
            Some(ChannelValue::Decimal(12.5))
        );
        assert_eq!(
            value_for(ChannelKind::SensorMeterKwh, &d),
            Some(ChannelValue::Decimal(104.2))
        );
        assert_eq!(
            value_for(ChannelKind::Battery, &d),
            Some(ChannelValue::Decimal(80.0))
        );
    }

    #[test]
    fn missing_attribute_converts_to_none() {
        let d = device(serde_json::json!({"id": "5", "category": 3}));
        assert_eq!(value_for(ChannelKind::SwitchBinary, &d), None);
        assert_eq!(value_for(ChannelKind::Battery, &d), None);
    }

    #[test]
    fn garbage_attribute_converts_to_none() {
        let d = device(serde_json::json!({
            "id": "5", "category": 3, "status": "maybe", "level": "high"
        }));
        assert_eq!(value_for(ChannelKind::SwitchBinary, &d), None);
        assert_eq!(value_for(ChannelKind::SwitchMultilevel, &d), None);
    }
}
