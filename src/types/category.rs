// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller device categories.
//!
//! The controller reports each device with a numeric category and
//! subcategory code. The category selects the channel mapping rules; the
//! subcategory refines them for a handful of categories (dimmable lights,
//! security sensors).

use serde::Deserialize;

/// Device category as reported by the controller.
///
/// Decoded from the numeric `category` field of a device record. Codes
/// outside the known range decode to [`Category::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// The controller itself.
    Controller,
    /// A protocol interface attached to the controller (Z-Wave, Insteon).
    Interface,
    /// Dimmable light; subcategories 1-3 are plain dimmers, 4 is color.
    DimmableLight,
    /// Binary switch or outlet.
    Switch,
    /// Security sensor; subcategory selects the concrete sensor type.
    SecuritySensor,
    /// Heating/ventilation/air-conditioning unit.
    Hvac,
    /// Camera.
    Camera,
    /// Door lock.
    DoorLock,
    /// Window covering / roller shutter.
    WindowCovering,
    /// Remote control.
    RemoteControl,
    /// Infrared transmitter.
    IrTransmitter,
    /// Generic input/output.
    GenericIo,
    /// Generic binary sensor.
    GenericSensor,
    /// Serial port.
    SerialPort,
    /// Scene controller (wall button panel).
    SceneController,
    /// Audio/video equipment.
    Av,
    /// Humidity sensor.
    HumiditySensor,
    /// Temperature sensor.
    TemperatureSensor,
    /// Luminosity sensor.
    LightSensor,
    /// Z-Wave interface.
    ZWaveInterface,
    /// Insteon interface.
    InsteonInterface,
    /// Power meter.
    PowerMeter,
    /// Alarm panel.
    AlarmPanel,
    /// Alarm partition.
    AlarmPartition,
    /// Siren.
    Siren,
    /// Weather station.
    Weather,
    /// Philips controller.
    PhilipsController,
    /// Generic appliance.
    Appliance,
    /// Ultraviolet sensor.
    UvSensor,
    /// Unrecognized category code.
    Unknown,
}

impl Category {
    /// Decodes the controller's numeric category code.
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Controller,
            1 => Self::Interface,
            2 => Self::DimmableLight,
            3 => Self::Switch,
            4 => Self::SecuritySensor,
            5 => Self::Hvac,
            6 => Self::Camera,
            7 => Self::DoorLock,
            8 => Self::WindowCovering,
            9 => Self::RemoteControl,
            10 => Self::IrTransmitter,
            11 => Self::GenericIo,
            12 => Self::GenericSensor,
            13 => Self::SerialPort,
            14 => Self::SceneController,
            15 => Self::Av,
            16 => Self::HumiditySensor,
            17 => Self::TemperatureSensor,
            18 => Self::LightSensor,
            19 => Self::ZWaveInterface,
            20 => Self::InsteonInterface,
            21 => Self::PowerMeter,
            22 => Self::AlarmPanel,
            23 => Self::AlarmPartition,
            24 => Self::Siren,
            25 => Self::Weather,
            26 => Self::PhilipsController,
            27 => Self::Appliance,
            28 => Self::UvSensor,
            _ => Self::Unknown,
        }
    }

    /// Returns true for categories that represent the controller itself
    /// rather than a controllable device.
    #[must_use]
    pub fn is_controller_internal(self) -> bool {
        matches!(self, Self::Controller | Self::Interface)
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = u32::deserialize(deserializer)?;
        Ok(Self::from_code(code))
    }
}
