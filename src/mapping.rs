// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Category-to-channel mapping.
//!
//! The mapping from a device's (category, subcategory, attribute presence)
//! to its channel set is a declarative rule table, not control flow: adding
//! a category is a data change. Three rule classes exist:
//!
//! 1. category-only rules (one fixed channel per category);
//! 2. category+subcategory rules (dimmable lights, security sensors);
//! 3. attribute-presence rules (battery / power / energy), evaluated
//!    independently of the category outcome.
//!
//! Unknown categories produce an empty list and a warning; mapped
//! categories with an unmapped subcategory produce an empty list silently
//! (debug-logged). `Controller`/`Interface` devices represent the hub
//! itself and never map to channels.

use crate::snapshot::DeviceSnapshot;
use crate::types::Category;

/// Channel kind identifiers.
///
/// Each kind selects a value converter (see [`crate::convert`]) and, with
/// the owning device id, forms the channel's composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// Binary switch.
    SwitchBinary,
    /// Multilevel (dimmer) switch.
    SwitchMultilevel,
    /// Color-capable light.
    SwitchColor,
    /// Roller shutter / window covering.
    SwitchRollershutter,
    /// Door lock.
    Doorlock,
    /// Door/window contact sensor.
    SensorDoorWindow,
    /// Flood sensor.
    SensorFlood,
    /// Motion sensor.
    SensorMotion,
    /// Smoke sensor.
    SensorSmoke,
    /// Carbon-monoxide sensor.
    SensorCo,
    /// Generic binary sensor.
    SensorBinary,
    /// Relative humidity sensor.
    SensorHumidity,
    /// Temperature sensor.
    SensorTemperature,
    /// Luminosity sensor.
    SensorLuminosity,
    /// Ultraviolet sensor.
    SensorUltraviolet,
    /// Power meter main reading.
    SensorEnergy,
    /// Battery level.
    Battery,
    /// Cumulative energy (kWh) meter.
    SensorMeterKwh,
    /// Instantaneous power (W) meter.
    SensorMeterW,
}

impl ChannelKind {
    /// Stable identifier used in composite channel keys.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::SwitchBinary => "switchBinary",
            Self::SwitchMultilevel => "switchMultilevel",
            Self::SwitchColor => "switchColor",
            Self::SwitchRollershutter => "switchRollershutter",
            Self::Doorlock => "doorlock",
            Self::SensorDoorWindow => "sensorDoorWindow",
            Self::SensorFlood => "sensorFlood",
            Self::SensorMotion => "sensorMotion",
            Self::SensorSmoke => "sensorSmoke",
            Self::SensorCo => "sensorCo",
            Self::SensorBinary => "sensorBinary",
            Self::SensorHumidity => "sensorHumidity",
            Self::SensorTemperature => "sensorTemperature",
            Self::SensorLuminosity => "sensorLuminosity",
            Self::SensorUltraviolet => "sensorUltraviolet",
            Self::SensorEnergy => "sensorEnergy",
            Self::Battery => "battery",
            Self::SensorMeterKwh => "sensorMeterKwh",
            Self::SensorMeterW => "sensorMeterW",
        }
    }
}

/// Value type accepted by a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// On/off.
    Switch,
    /// Percentage with on/off semantics.
    Dimmer,
    /// Color.
    Color,
    /// Open/closed contact.
    Contact,
    /// Up/down/percentage shutter.
    Rollershutter,
    /// Plain number.
    Number,
}

impl ItemType {
    /// Host-facing name of the value type.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Switch => "Switch",
            Self::Dimmer => "Dimmer",
            Self::Color => "Color",
            Self::Contact => "Contact",
            Self::Rollershutter => "Rollershutter",
            Self::Number => "Number",
        }
    }
}

/// A channel to be created on a device entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Channel kind.
    pub kind: ChannelKind,
    /// Accepted value type.
    pub item_type: ItemType,
    /// Optional semantic tag (attached only when the bridge opts in).
    pub tag: Option<&'static str>,
    /// Owning device id, carried in the channel's property set.
    pub device_id: String,
}

impl ChannelDescriptor {
    /// Deterministic composite key: kind + device id.
    ///
    /// Used to detect "already exists" and prevent duplicate creation.
    #[must_use]
    pub fn composite_key(&self) -> String {
        format!("{}-{}", self.kind.id(), self.device_id)
    }
}

/// One row of the category mapping table.
struct CategoryRule {
    category: Category,
    /// `None` matches any subcategory.
    subcategory: Option<u8>,
    kind: ChannelKind,
    item_type: ItemType,
    tag: Option<&'static str>,
}

const fn rule(
    category: Category,
    subcategory: Option<u8>,
    kind: ChannelKind,
    item_type: ItemType,
    tag: Option<&'static str>,
) -> CategoryRule {
    CategoryRule {
        category,
        subcategory,
        kind,
        item_type,
        tag,
    }
}

/// The category mapping table. First matching row wins; rows with an exact
/// subcategory are listed before (and therefore shadow) any catch-all row
/// for the same category.
const CATEGORY_RULES: &[CategoryRule] = &[
    // Dimmable lights: subcategories 1-3 are plain dimmers, 4 is color.
    rule(Category::DimmableLight, Some(1), ChannelKind::SwitchMultilevel, ItemType::Dimmer, Some("Lighting")),
    rule(Category::DimmableLight, Some(2), ChannelKind::SwitchMultilevel, ItemType::Dimmer, Some("Lighting")),
    rule(Category::DimmableLight, Some(3), ChannelKind::SwitchMultilevel, ItemType::Dimmer, Some("Lighting")),
    rule(Category::DimmableLight, Some(4), ChannelKind::SwitchColor, ItemType::Color, Some("Lighting")),
    // Security sensors: the subcategory selects the concrete sensor kind.
    rule(Category::SecuritySensor, Some(1), ChannelKind::SensorDoorWindow, ItemType::Contact, None),
    rule(Category::SecuritySensor, Some(2), ChannelKind::SensorFlood, ItemType::Switch, None),
    rule(Category::SecuritySensor, Some(3), ChannelKind::SensorMotion, ItemType::Switch, None),
    rule(Category::SecuritySensor, Some(4), ChannelKind::SensorSmoke, ItemType::Switch, None),
    rule(Category::SecuritySensor, Some(5), ChannelKind::SensorCo, ItemType::Switch, None),
    rule(Category::SecuritySensor, Some(6), ChannelKind::SensorBinary, ItemType::Switch, None),
    // Category-only rules.
    rule(Category::Switch, None, ChannelKind::SwitchBinary, ItemType::Switch, Some("Switchable")),
    rule(Category::DoorLock, None, ChannelKind::Doorlock, ItemType::Switch, Some("Switchable")),
    rule(Category::WindowCovering, None, ChannelKind::SwitchRollershutter, ItemType::Rollershutter, None),
    rule(Category::GenericSensor, None, ChannelKind::SensorBinary, ItemType::Switch, None),
    rule(Category::SceneController, None, ChannelKind::SwitchBinary, ItemType::Switch, None),
    rule(Category::HumiditySensor, None, ChannelKind::SensorHumidity, ItemType::Number, Some("CurrentHumidity")),
    rule(Category::TemperatureSensor, None, ChannelKind::SensorTemperature, ItemType::Number, Some("CurrentTemperature")),
    rule(Category::LightSensor, None, ChannelKind::SensorLuminosity, ItemType::Number, None),
    rule(Category::PowerMeter, None, ChannelKind::SensorEnergy, ItemType::Number, None),
    rule(Category::UvSensor, None, ChannelKind::SensorUltraviolet, ItemType::Number, None),
];

/// One row of the attribute-presence table.
struct AttributeRule {
    present: fn(&DeviceSnapshot) -> bool,
    kind: ChannelKind,
}

/// Attribute channels, appended in this order after any category channel.
const ATTRIBUTE_RULES: &[AttributeRule] = &[
    AttributeRule {
        present: DeviceSnapshot::has_battery,
        kind: ChannelKind::Battery,
    },
    AttributeRule {
        present: DeviceSnapshot::has_energy,
        kind: ChannelKind::SensorMeterKwh,
    },
    AttributeRule {
        present: DeviceSnapshot::has_power,
        kind: ChannelKind::SensorMeterW,
    },
];

/// Computes the expected channel set for a device snapshot.
///
/// Deterministic and ordered: the category channel (if any) first, then
/// battery, cumulative energy, and instantaneous power channels for the
/// attributes the snapshot carries. When `tag_channels` is false, semantic
/// tags are stripped from the produced descriptors.
#[must_use]
pub fn channels_for(device: &DeviceSnapshot, tag_channels: bool) -> Vec<ChannelDescriptor> {
    if device.category.is_controller_internal() {
        return Vec::new();
    }

    let mut channels = Vec::new();

    let category_rule = CATEGORY_RULES.iter().find(|rule| {
        rule.category == device.category
            && rule.subcategory.is_none_or(|sub| sub == device.subcategory)
    });

    match category_rule {
        Some(rule) => channels.push(ChannelDescriptor {
            kind: rule.kind,
            item_type: rule.item_type,
            tag: if tag_channels { rule.tag } else { None },
            device_id: device.id.clone(),
        }),
        None if device.category == Category::Unknown => {
            tracing::warn!(id = %device.id, "unknown device category, no channels mapped");
        }
        None => {
            tracing::debug!(
                id = %device.id,
                category = ?device.category,
                subcategory = device.subcategory,
                "no channel mapping for device"
            );
        }
    }

    for rule in ATTRIBUTE_RULES {
        if (rule.present)(device) {
            channels.push(ChannelDescriptor {
                kind: rule.kind,
                item_type: ItemType::Number,
                tag: None,
                device_id: device.id.clone(),
            });
        }
    }

    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(category: u32, subcategory: u8) -> DeviceSnapshot {
        serde_json::from_value(serde_json::json!({
            "id": "5",
            "name": "Test",
            "category": category,
            "subcategory": subcategory
        }))
        .unwrap()
    }

    #[test]
    fn switch_maps_to_single_binary_channel() {
        let channels = channels_for(&snapshot(3, 1), true);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].kind, ChannelKind::SwitchBinary);
        assert_eq!(channels[0].item_type, ItemType::Switch);
        assert_eq!(channels[0].tag, Some("Switchable"));
        assert_eq!(channels[0].composite_key(), "switchBinary-5");
    }

    #[test]
    fn switch_with_battery_adds_battery_channel() {
        let mut device = snapshot(3, 1);
        device.battery_level = Some("80".to_string());
        let channels = channels_for(&device, false);
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].kind, ChannelKind::SwitchBinary);
        assert_eq!(channels[1].kind, ChannelKind::Battery);
        assert_eq!(channels[1].item_type, ItemType::Number);
        assert_eq!(channels[1].tag, None);
    }

    #[test]
    fn flood_sensor_maps_to_flood_kind() {
        // Subcategory 2 is flood, never the adjacent motion kind.
        let channels = channels_for(&snapshot(4, 2), true);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].kind, ChannelKind::SensorFlood);
        assert_ne!(channels[0].kind, ChannelKind::SensorMotion);
    }

    #[test]
    fn security_subcategories_are_distinct() {
        let expected = [
            (1, ChannelKind::SensorDoorWindow, ItemType::Contact),
            (2, ChannelKind::SensorFlood, ItemType::Switch),
            (3, ChannelKind::SensorMotion, ItemType::Switch),
            (4, ChannelKind::SensorSmoke, ItemType::Switch),
            (5, ChannelKind::SensorCo, ItemType::Switch),
            (6, ChannelKind::SensorBinary, ItemType::Switch),
        ];
        for (subcategory, kind, item_type) in expected {
            let channels = channels_for(&snapshot(4, subcategory), true);
            assert_eq!(channels.len(), 1, "subcategory {subcategory}");
            assert_eq!(channels[0].kind, kind);
            assert_eq!(channels[0].item_type, item_type);
        }
    }

    #[test]
    fn dimmable_light_levels_and_color() {
        for subcategory in 1..=3 {
            let channels = channels_for(&snapshot(2, subcategory), true);
            assert_eq!(channels[0].kind, ChannelKind::SwitchMultilevel);
            assert_eq!(channels[0].item_type, ItemType::Dimmer);
            assert_eq!(channels[0].tag, Some("Lighting"));
        }
        let channels = channels_for(&snapshot(2, 4), true);
        assert_eq!(channels[0].kind, ChannelKind::SwitchColor);
        assert_eq!(channels[0].item_type, ItemType::Color);
    }

    #[test]
    fn unmapped_subcategory_yields_no_category_channel() {
        assert!(channels_for(&snapshot(2, 9), true).is_empty());
        assert!(channels_for(&snapshot(4, 9), true).is_empty());
    }

    #[test]
    fn controller_and_interface_map_to_nothing() {
        let mut device = snapshot(0, 0);
        device.battery_level = Some("50".to_string());
        assert!(channels_for(&device, true).is_empty());
        assert!(channels_for(&snapshot(1, 0), true).is_empty());
    }

    #[test]
    fn unknown_category_yields_empty_list() {
        assert!(channels_for(&snapshot(99, 0), true).is_empty());
    }

    #[test]
    fn attribute_rules_apply_without_category_channel() {
        // HVAC has no category mapping, but the battery attribute still
        // produces its channel.
        let mut device = snapshot(5, 0);
        device.battery_level = Some("65".to_string());
        let channels = channels_for(&device, true);
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].kind, ChannelKind::Battery);
    }

    #[test]
    fn meter_attributes_keep_original_order() {
        let mut device = snapshot(3, 1);
        device.battery_level = Some("90".to_string());
        device.watts = Some("12.5".to_string());
        device.kwh = Some("100.2".to_string());
        let kinds: Vec<ChannelKind> = channels_for(&device, true)
            .iter()
            .map(|c| c.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ChannelKind::SwitchBinary,
                ChannelKind::Battery,
                ChannelKind::SensorMeterKwh,
                ChannelKind::SensorMeterW,
            ]
        );
    }

    #[test]
    fn mapping_is_deterministic() {
        let device = snapshot(17, 0);
        assert_eq!(channels_for(&device, true), channels_for(&device, true));
    }

    #[test]
    fn untagged_mapping_strips_tags() {
        let channels = channels_for(&snapshot(3, 1), false);
        assert_eq!(channels[0].tag, None);
    }
}
