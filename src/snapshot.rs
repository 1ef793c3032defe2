// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Immutable per-poll snapshots of controller data.
//!
//! One poll cycle fetches the controller's full device/scene listing and
//! parses it into a [`ControllerData`]. The parsed snapshot is immutable;
//! the bridge replaces its cached `Arc<ControllerData>` atomically, so
//! concurrent readers always see either the previous or the fully-replaced
//! snapshot, never a partially updated one.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer};

use crate::types::Category;

/// Accepts a JSON string or number and stores it as a string.
///
/// The controller emits numeric fields inconsistently (`"level": 75` on one
/// firmware, `"level": "75"` on another); raw attribute values are kept as
/// the string form either way and parsed by the converters.
fn de_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
    }

    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|scalar| match scalar {
        Scalar::Text(text) => text,
        Scalar::Int(number) => number.to_string(),
        Scalar::Float(number) => number.to_string(),
    }))
}

fn de_required_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    de_scalar(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}

/// One device record from the controller's data listing.
///
/// Raw attribute values are kept exactly as the controller sent them;
/// typed conversion happens per channel kind in [`crate::convert`].
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSnapshot {
    /// Controller-assigned device id, unique within one controller.
    #[serde(deserialize_with = "de_required_scalar")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Room id, resolvable through [`ControllerData::room_name`].
    #[serde(default, deserialize_with = "de_scalar")]
    pub room: Option<String>,
    /// Device category.
    #[serde(default = "unknown_category")]
    pub category: Category,
    /// Category refinement; 0 when the controller reports none.
    #[serde(default)]
    pub subcategory: u8,
    /// Raw switch status ("0"/"1").
    #[serde(default, deserialize_with = "de_scalar")]
    pub status: Option<String>,
    /// Raw dim/shutter level (0-100).
    #[serde(default, deserialize_with = "de_scalar")]
    pub level: Option<String>,
    /// Raw battery level percentage.
    #[serde(default, rename = "batterylevel", deserialize_with = "de_scalar")]
    pub battery_level: Option<String>,
    /// Instantaneous power draw in watts.
    #[serde(default, deserialize_with = "de_scalar")]
    pub watts: Option<String>,
    /// Cumulative energy in kWh.
    #[serde(default, deserialize_with = "de_scalar")]
    pub kwh: Option<String>,
    /// Raw temperature reading.
    #[serde(default, deserialize_with = "de_scalar")]
    pub temperature: Option<String>,
    /// Raw relative humidity reading.
    #[serde(default, deserialize_with = "de_scalar")]
    pub humidity: Option<String>,
    /// Raw luminosity/ultraviolet reading.
    #[serde(default, deserialize_with = "de_scalar")]
    pub light: Option<String>,
    /// Raw tripped flag of a security sensor ("0"/"1").
    #[serde(default, deserialize_with = "de_scalar")]
    pub tripped: Option<String>,
    /// Raw locked flag of a door lock ("0"/"1").
    #[serde(default, deserialize_with = "de_scalar")]
    pub locked: Option<String>,
}

fn unknown_category() -> Category {
    Category::Unknown
}

impl DeviceSnapshot {
    /// Returns true if the device reports a battery level.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.battery_level.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Returns true if the device reports instantaneous power.
    #[must_use]
    pub fn has_power(&self) -> bool {
        self.watts.is_some()
    }

    /// Returns true if the device reports cumulative energy.
    #[must_use]
    pub fn has_energy(&self) -> bool {
        self.kwh.is_some()
    }
}

/// One scene record from the controller's data listing.
///
/// Scenes carry no channels; they are exposed only as discoverable
/// entities.
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSnapshot {
    /// Controller-assigned scene id.
    #[serde(deserialize_with = "de_required_scalar")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// One room record, used to resolve a device's room id to a name.
#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    /// Controller-assigned room id.
    #[serde(deserialize_with = "de_required_scalar")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// The immutable result of one poll cycle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerData {
    /// All devices the controller reported.
    #[serde(default)]
    pub devices: Vec<DeviceSnapshot>,
    /// All scenes the controller reported.
    #[serde(default)]
    pub scenes: Vec<SceneSnapshot>,
    /// Room table for resolving device locations.
    #[serde(default)]
    pub rooms: Vec<Room>,
}

impl ControllerData {
    /// Looks up a device by its controller-assigned id.
    #[must_use]
    pub fn device(&self, id: &str) -> Option<&DeviceSnapshot> {
        self.devices.iter().find(|device| device.id == id)
    }

    /// Resolves a room id to its display name.
    #[must_use]
    pub fn room_name(&self, room_id: &str) -> Option<&str> {
        self.rooms
            .iter()
            .find(|room| room.id == room_id)
            .map(|room| room.name.as_str())
    }
}

/// Atomic-swap cache for the latest [`ControllerData`].
///
/// One writer (the bridge poll task) replaces the snapshot; many readers
/// (device synchronizers) clone the `Arc` out. The lock is only held for
/// the pointer swap.
#[derive(Debug, Default)]
pub(crate) struct DataCache {
    current: RwLock<Option<Arc<ControllerData>>>,
}

impl DataCache {
    /// Replaces the cached snapshot.
    pub fn replace(&self, data: Arc<ControllerData>) {
        *self.current.write() = Some(data);
    }

    /// Returns the latest snapshot, if any poll has completed.
    pub fn load(&self) -> Option<Arc<ControllerData>> {
        self.current.read().clone()
    }

    /// Drops the cached snapshot.
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}
