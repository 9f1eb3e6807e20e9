// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Builds typed nodes from discovery results and persisted records.

use std::time::Duration;

use super::{Connector, DEFAULT_DEVICE_TIMEOUT, Node};
use crate::error::Error;
use crate::record::{DeviceRecord, DeviceType, DiscoveredDevice, device_name};

/// Where a node's description comes from.
#[derive(Debug, Clone, Copy)]
pub enum Descriptor<'a> {
    /// A live discovery result.
    Discovered(&'a DiscoveredDevice),
    /// A record loaded from the parameter store.
    Persisted(&'a DeviceRecord),
}

/// Constructs [`Node`]s wired to handles from a [`Connector`].
#[derive(Debug)]
pub struct DeviceFactory<C> {
    connector: C,
    timeout: Duration,
}

impl<C: Connector> DeviceFactory<C> {
    /// Creates a factory using `connector` to open handles.
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }

    /// Sets the bound on each handle call of the nodes built from now on.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the connector.
    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Builds the node for `descriptor`, interpreted as `type_tag`.
    ///
    /// Strips get a name derived from their hardware address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedDeviceType`] for a tag we do not manage.
    /// The caller skips that device; it is not fatal.
    pub fn build(
        &self,
        type_tag: &str,
        descriptor: Descriptor<'_>,
    ) -> Result<Node<C::Handle>, Error> {
        let device_type: DeviceType = type_tag.parse()?;

        let record = match descriptor {
            Descriptor::Discovered(device) => DeviceRecord::new(
                device_type,
                device_name(device_type, &device.mac, device.alias.as_deref()),
                device.host.clone(),
                device.mac.clone(),
                device.model.clone(),
            ),
            Descriptor::Persisted(record) => {
                let mut record = record.clone();
                record.device_type = device_type;
                record
            }
        };

        let handle = self.connector.open(&record);
        let mut node = Node::new(record, handle);
        node.set_timeout(self.timeout);
        Ok(node)
    }

    /// Builds the node for a discovery result using its own type tag.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_discovered(&self, device: &DiscoveredDevice) -> Result<Node<C::Handle>, Error> {
        self.build(&device.device_type, Descriptor::Discovered(device))
    }

    /// Builds the node for a persisted record.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_persisted(&self, record: &DeviceRecord) -> Result<Node<C::Handle>, Error> {
        self.build(record.device_type.tag(), Descriptor::Persisted(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::device::{DeviceHandle, RefreshScope};
    use crate::error::DeviceError;
    use crate::identity::HardwareAddress;

    struct NullHandle {
        host: String,
    }

    impl DeviceHandle for NullHandle {
        async fn is_connected(&self) -> Result<bool, DeviceError> {
            Ok(true)
        }

        async fn connect(&self, _host: &str) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn refresh_status(&self, _scope: RefreshScope) -> Result<(), DeviceError> {
            Ok(())
        }
    }

    struct NullConnector;

    impl Connector for NullConnector {
        type Handle = NullHandle;

        fn open(&self, record: &DeviceRecord) -> NullHandle {
            NullHandle {
                host: record.host.clone(),
            }
        }
    }

    #[test]
    fn builds_strip_with_synthesized_name() {
        let factory = DeviceFactory::new(NullConnector);
        let device = DiscoveredDevice::new("SmartStrip", "50:C7:BF:0A:0B:0C", "10.0.0.5", "HS300");

        let node = factory.build_discovered(&device).unwrap();

        assert_eq!(node.device_type(), DeviceType::Strip);
        assert_eq!(node.name(), "SmartStrip 50:C7:BF:0A:0B:0C");
        assert_eq!(node.address().as_str(), "50c7bf0a0b0c");
        assert_eq!(node.capabilities().outlets, 6);
    }

    #[test]
    fn handle_is_opened_for_device_host() {
        let factory = DeviceFactory::new(NullConnector);
        let device = DiscoveredDevice::new("SmartPlug", "B0:BE:76:12:34:56", "10.0.0.7", "HS105")
            .with_alias("Lamp");

        let node = factory.build_discovered(&device).unwrap();

        assert_eq!(node.handle().host, "10.0.0.7");
        assert_eq!(node.name(), "Lamp");
    }

    #[test]
    fn builds_from_persisted_record() {
        let factory = DeviceFactory::new(NullConnector);
        let record = DeviceRecord::new(
            DeviceType::Bulb,
            "Desk",
            "10.0.0.8",
            HardwareAddress::new("B0:BE:76:AA:BB:CC"),
            "LB130(US)",
        );

        let node = factory.build_persisted(&record).unwrap();

        assert_eq!(node.record(), &record);
        assert!(node.capabilities().color);
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let factory = DeviceFactory::new(NullConnector);
        let device = DiscoveredDevice::new("SmartDimmer", "B0:BE:76:12:34:56", "10.0.0.7", "HS220");

        let err = factory.build_discovered(&device).unwrap_err();

        assert!(matches!(err, Error::UnsupportedDeviceType(tag) if tag == "SmartDimmer"));
    }

    #[test]
    fn explicit_tag_overrides_discovered_one() {
        let factory = DeviceFactory::new(NullConnector);
        let device = DiscoveredDevice::new("SmartPlug", "50:C7:BF:0A:0B:0C", "10.0.0.5", "HS300")
            .with_alias("Strip alias");

        let node = factory
            .build("SmartStrip", Descriptor::Discovered(&device))
            .unwrap();

        assert_eq!(node.device_type(), DeviceType::Strip);
        assert_eq!(node.name(), "SmartStrip 50:C7:BF:0A:0B:0C");
    }

    #[test]
    fn nodes_inherit_factory_timeout() {
        let factory = DeviceFactory::new(NullConnector).with_timeout(Duration::from_secs(2));
        let device = DiscoveredDevice::new("SmartPlug", "B0:BE:76:12:34:56", "10.0.0.7", "HS105");

        let node = factory.build_discovered(&device).unwrap();

        assert_eq!(node.timeout(), Duration::from_secs(2));
    }
}
