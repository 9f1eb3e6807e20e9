// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `kasa_registry` - device registry and discovery reconciliation for a
//! home-automation hub managing TP-Link Kasa smart devices.
//!
//! The crate keeps one live [`Node`](device::Node) per physical device,
//! keyed by its hardware address, and keeps that set in step with what the
//! network reports, even when devices go offline, change IP address or fail
//! to answer a discovery broadcast.
//!
//! # Supported Devices
//!
//! - Smart strips (`SmartStrip`), with per-outlet deep status
//! - Smart plugs (`SmartPlug`), with energy readings on metering models
//! - Smart bulbs (`SmartBulb`), dimmable and optionally colour
//!
//! # Building Blocks
//!
//! - [`identity`]: hardware address normalization and the stable registry
//!   address derived from it
//! - [`store`]: persisted device records on top of the hub's key/value store
//! - [`device`]: the device handle seam, nodes and the node factory
//! - [`discovery`]: the reconciler merging discovery results with the
//!   registry and the persisted records
//! - [`controller`]: lifecycle, poll cycles, commands and the poll scheduler
//! - [`event`]: heartbeat and registry events for the hub
//!
//! The network protocol itself is supplied by the hub through the
//! [`DiscoveryTransport`](discovery::DiscoveryTransport),
//! [`Connector`](device::Connector) and [`DeviceHandle`](device::DeviceHandle)
//! traits, and the key/value store through
//! [`ConfigStore`](store::ConfigStore).
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use kasa_registry::store::JsonFileStore;
//! use kasa_registry::{Controller, ControllerCommand, ControllerConfig};
//! # use kasa_registry::{DeviceRecord, DiscoveredDevice};
//! # use kasa_registry::device::{Connector, DeviceHandle, RefreshScope};
//! # use kasa_registry::discovery::DiscoveryTransport;
//! # use kasa_registry::error::{DeviceError, TransportError};
//! # struct Broadcast;
//! # impl DiscoveryTransport for Broadcast {
//! #     async fn discover(&self) -> Result<Vec<DiscoveredDevice>, TransportError> { Ok(Vec::new()) }
//! # }
//! # struct Link;
//! # impl DeviceHandle for Link {
//! #     async fn is_connected(&self) -> Result<bool, DeviceError> { Ok(true) }
//! #     async fn connect(&self, _host: &str) -> Result<(), DeviceError> { Ok(()) }
//! #     async fn refresh_status(&self, _scope: RefreshScope) -> Result<(), DeviceError> { Ok(()) }
//! # }
//! # struct Links;
//! # impl Connector for Links {
//! #     type Handle = Link;
//! #     fn open(&self, _record: &DeviceRecord) -> Link { Link }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> kasa_registry::Result<()> {
//!     let config = ControllerConfig::new()
//!         .with_short_poll(Duration::from_secs(10))
//!         .with_long_poll(Duration::from_secs(30));
//!     let store = JsonFileStore::open("/var/lib/kasa/params.json")?;
//!     let controller = Arc::new(Controller::new(config, Broadcast, Links, store));
//!
//!     controller.start().await?;
//!     let poller = Arc::clone(&controller).spawn();
//!
//!     controller.handle_command("DISCOVER".parse::<ControllerCommand>()?).await?;
//!
//!     poller.stop().await;
//!     controller.stop();
//!     Ok(())
//! }
//! ```

mod capabilities;
pub mod controller;
pub mod device;
pub mod discovery;
pub mod error;
pub mod event;
pub mod identity;
mod record;
pub mod registry;
pub mod store;

pub use capabilities::Capabilities;
pub use controller::{Controller, ControllerCommand, ControllerConfig, PollerHandle};
pub use device::{ConnectionState, Node};
pub use discovery::{DiscoveryReport, IncrementalReport};
pub use error::{DeviceError, Error, Result, StoreError, TransportError};
pub use event::{ControllerEvent, Pulse};
pub use identity::{HardwareAddress, NormalizedAddress, RegistryAddress};
pub use record::{DeviceRecord, DeviceType, DiscoveredDevice, device_name};
pub use registry::Registry;
