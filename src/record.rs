// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records and discovery results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::identity::{HardwareAddress, NormalizedAddress, RegistryAddress};

/// The kinds of device the registry manages.
///
/// The string tags are the ones discovery reports and the ones written to
/// the persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Multi-outlet power strip.
    #[serde(rename = "SmartStrip")]
    Strip,
    /// Single-outlet plug.
    #[serde(rename = "SmartPlug")]
    Plug,
    /// Dimmable or colour bulb.
    #[serde(rename = "SmartBulb")]
    Bulb,
}

impl DeviceType {
    /// Returns the type tag used by discovery and persistence.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Strip => "SmartStrip",
            Self::Plug => "SmartPlug",
            Self::Bulb => "SmartBulb",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "SmartStrip" => Ok(Self::Strip),
            "SmartPlug" => Ok(Self::Plug),
            "SmartBulb" => Ok(Self::Bulb),
            other => Err(Error::UnsupportedDeviceType(other.to_string())),
        }
    }
}

/// Everything the registry knows about one physical device.
///
/// Serializes to the persisted record format
/// `{type, name, host, mac, model, address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Device kind.
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Display name.
    pub name: String,
    /// Current network address or hostname.
    pub host: String,
    /// Hardware address as reported by the device.
    pub mac: HardwareAddress,
    /// Manufacturer model string.
    pub model: String,
    /// Stable registry address, derived from `mac`.
    pub address: RegistryAddress,
}

impl DeviceRecord {
    /// Creates a record, deriving the registry address from `mac`.
    #[must_use]
    pub fn new(
        device_type: DeviceType,
        name: impl Into<String>,
        host: impl Into<String>,
        mac: HardwareAddress,
        model: impl Into<String>,
    ) -> Self {
        let address = mac.registry_address();
        Self {
            device_type,
            name: name.into(),
            host: host.into(),
            mac,
            model: model.into(),
            address,
        }
    }

    /// Builds the record for a discovery result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDeviceType`] if the reported type tag is
    /// not one we manage.
    pub fn from_discovered(device: &DiscoveredDevice) -> Result<Self, Error> {
        let device_type: DeviceType = device.device_type.parse()?;
        let name = device_name(device_type, &device.mac, device.alias.as_deref());
        Ok(Self::new(
            device_type,
            name,
            device.host.clone(),
            device.mac.clone(),
            device.model.clone(),
        ))
    }

    /// Returns the store and registry key for this record.
    #[must_use]
    pub fn key(&self) -> NormalizedAddress {
        self.mac.normalized()
    }
}

/// Picks the display name for a device.
///
/// Strips expose no alias, so their name is always built from the hardware
/// address. Other kinds use their alias and only fall back to the same
/// template when the alias is missing or blank.
#[must_use]
pub fn device_name(device_type: DeviceType, mac: &HardwareAddress, alias: Option<&str>) -> String {
    match (device_type, alias.map(str::trim)) {
        (DeviceType::Plug | DeviceType::Bulb, Some(alias)) if !alias.is_empty() => {
            alias.to_string()
        }
        _ => format!("{} {mac}", device_type.tag()),
    }
}

/// One device as reported by a single discovery pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Raw type tag (may name a type we do not manage).
    #[serde(rename = "type")]
    pub device_type: String,
    /// Hardware address.
    pub mac: HardwareAddress,
    /// Network address the device answered from.
    pub host: String,
    /// Manufacturer model string.
    pub model: String,
    /// Device-reported display name; strips have none.
    pub alias: Option<String>,
}

impl DiscoveredDevice {
    /// Creates a discovery result without an alias.
    #[must_use]
    pub fn new(
        device_type: impl Into<String>,
        mac: impl Into<HardwareAddress>,
        host: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            device_type: device_type.into(),
            mac: mac.into(),
            host: host.into(),
            model: model.into(),
            alias: None,
        }
    }

    /// Sets the device-reported alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns the registry key for this result.
    #[must_use]
    pub fn key(&self) -> NormalizedAddress {
        self.mac.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags_parse() {
        assert_eq!("SmartStrip".parse::<DeviceType>().unwrap(), DeviceType::Strip);
        assert_eq!("SmartPlug".parse::<DeviceType>().unwrap(), DeviceType::Plug);
        assert_eq!("SmartBulb".parse::<DeviceType>().unwrap(), DeviceType::Bulb);
    }

    #[test]
    fn unknown_type_tag_is_unsupported() {
        let err = "SmartDimmer".parse::<DeviceType>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedDeviceType(tag) if tag == "SmartDimmer"));
    }

    #[test]
    fn strip_name_is_derived_from_mac() {
        let device = DiscoveredDevice::new("SmartStrip", "50:C7:BF:0A:0B:0C", "10.0.0.5", "HS300");
        let record = DeviceRecord::from_discovered(&device).unwrap();
        assert_eq!(record.name, "SmartStrip 50:C7:BF:0A:0B:0C");
    }

    #[test]
    fn strip_ignores_alias() {
        let device = DiscoveredDevice::new("SmartStrip", "50:C7:BF:0A:0B:0C", "10.0.0.5", "HS300")
            .with_alias("TP-LINK_Power Strip_0B0C");
        let record = DeviceRecord::from_discovered(&device).unwrap();
        assert_eq!(record.name, "SmartStrip 50:C7:BF:0A:0B:0C");
    }

    #[test]
    fn plug_uses_alias() {
        let device = DiscoveredDevice::new("SmartPlug", "B0:BE:76:12:34:56", "10.0.0.7", "HS105")
            .with_alias("Lamp");
        let record = DeviceRecord::from_discovered(&device).unwrap();
        assert_eq!(record.name, "Lamp");
        assert_eq!(record.address.as_str(), "b0be76123456");
    }

    #[test]
    fn blank_alias_falls_back_to_template() {
        let mac = HardwareAddress::new("B0:BE:76:12:34:56");
        assert_eq!(
            device_name(DeviceType::Bulb, &mac, Some("  ")),
            "SmartBulb B0:BE:76:12:34:56"
        );
    }

    #[test]
    fn record_serializes_to_persisted_format() {
        let record = DeviceRecord::new(
            DeviceType::Plug,
            "Lamp",
            "10.0.0.7",
            HardwareAddress::new("B0:BE:76:12:34:56"),
            "HS105(US)",
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "SmartPlug",
                "name": "Lamp",
                "host": "10.0.0.7",
                "mac": "B0:BE:76:12:34:56",
                "model": "HS105(US)",
                "address": "b0be76123456"
            })
        );
    }

    #[test]
    fn record_key_is_stripped_mac() {
        let record = DeviceRecord::new(
            DeviceType::Bulb,
            "Desk",
            "10.0.0.8",
            HardwareAddress::new("B0:BE:76:AA:BB:CC"),
            "LB130",
        );
        assert_eq!(record.key().as_str(), "B0BE76AABBCC");
    }
}
