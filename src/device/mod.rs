// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Managed devices and the capabilities they are driven through.
//!
//! The device wire protocol is not part of this crate. A hub plugs it in by
//! implementing [`DeviceHandle`] for one live connection and [`Connector`]
//! for opening handles. [`DeviceFactory`] turns a record into a typed
//! [`Node`] wired to a fresh handle.
//!
//! # Implementing a handle
//!
//! ```
//! use kasa_registry::device::{Connector, DeviceHandle, RefreshScope};
//! use kasa_registry::error::DeviceError;
//! use kasa_registry::DeviceRecord;
//!
//! struct Offline;
//!
//! impl DeviceHandle for Offline {
//!     async fn is_connected(&self) -> Result<bool, DeviceError> {
//!         Ok(false)
//!     }
//!
//!     async fn connect(&self, _host: &str) -> Result<(), DeviceError> {
//!         Err(DeviceError::NotConnected)
//!     }
//!
//!     async fn refresh_status(&self, _scope: RefreshScope) -> Result<(), DeviceError> {
//!         Err(DeviceError::NotConnected)
//!     }
//! }
//!
//! struct OfflineConnector;
//!
//! impl Connector for OfflineConnector {
//!     type Handle = Offline;
//!
//!     fn open(&self, _record: &DeviceRecord) -> Offline {
//!         Offline
//!     }
//! }
//! ```

mod factory;
mod node;

pub use factory::{Descriptor, DeviceFactory};
pub use node::{ConnectionState, Node};

use std::future::Future;
use std::time::Duration;

use crate::error::DeviceError;
use crate::record::DeviceRecord;

/// Default bound on a single call to a device handle.
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

/// How much a status refresh should fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshScope {
    /// Lightweight status (power state), run on every short poll.
    Short,
    /// Deep status (outlet states, energy readings), run on long polls for
    /// devices that support it.
    Long,
    /// Everything the device can report, run on an explicit query.
    Full,
}

/// A live communication channel to one device.
///
/// Each node owns its handle; handles are never shared between nodes.
pub trait DeviceHandle {
    /// Checks whether the device is currently reachable.
    ///
    /// An `Err` means connectivity is unknown, which is different from a
    /// definite `Ok(false)`.
    fn is_connected(&self) -> impl Future<Output = Result<bool, DeviceError>> + Send;

    /// Connects, or reconnects, to the device at `host`.
    ///
    /// Idempotent and safe to call repeatedly.
    fn connect(&self, host: &str) -> impl Future<Output = Result<(), DeviceError>> + Send;

    /// Refreshes the device status and reports it to the hub.
    fn refresh_status(
        &self,
        scope: RefreshScope,
    ) -> impl Future<Output = Result<(), DeviceError>> + Send;
}

/// Opens [`DeviceHandle`]s for records.
pub trait Connector {
    /// The handle type produced.
    type Handle: DeviceHandle;

    /// Opens a handle for the device described by `record`.
    ///
    /// Opening must not perform I/O; the first connection happens on
    /// [`DeviceHandle::connect`].
    fn open(&self, record: &DeviceRecord) -> Self::Handle;
}
