// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! A registered device.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{DEFAULT_DEVICE_TIMEOUT, DeviceHandle, RefreshScope};
use crate::capabilities::Capabilities;
use crate::error::{DeviceError, Error};
use crate::identity::{HardwareAddress, NormalizedAddress, RegistryAddress};
use crate::record::{DeviceRecord, DeviceType};

/// Connectivity of a node as last observed.
///
/// `Unknown` until the first connect or connectivity check, then
/// alternating between `Connected` and `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never checked.
    #[default]
    Unknown,
    /// The last check or connect succeeded.
    Connected,
    /// The last check, connect or refresh failed.
    Disconnected,
}

impl ConnectionState {
    /// Returns true if the device is connected.
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// The live object for one managed device.
///
/// The kind, hardware address and registry address are fixed when the node
/// is built. Only the host and connectivity change afterwards.
pub struct Node<H> {
    record: DeviceRecord,
    capabilities: Capabilities,
    connection: ConnectionState,
    last_seen: Option<DateTime<Utc>>,
    timeout: Duration,
    handle: H,
}

impl<H> Node<H> {
    pub(crate) fn new(record: DeviceRecord, handle: H) -> Self {
        let capabilities = Capabilities::resolve(record.device_type, &record.model);
        Self {
            record,
            capabilities,
            connection: ConnectionState::Unknown,
            last_seen: None,
            timeout: DEFAULT_DEVICE_TIMEOUT,
            handle,
        }
    }

    /// Returns the record backing this node.
    #[must_use]
    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    /// Returns the device kind.
    #[must_use]
    pub fn device_type(&self) -> DeviceType {
        self.record.device_type
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Returns the current host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.record.host
    }

    /// Returns the hardware address.
    #[must_use]
    pub fn mac(&self) -> &HardwareAddress {
        &self.record.mac
    }

    /// Returns the registry key.
    #[must_use]
    pub fn key(&self) -> NormalizedAddress {
        self.record.key()
    }

    /// Returns the stable registry address.
    #[must_use]
    pub fn address(&self) -> &RegistryAddress {
        &self.record.address
    }

    /// Returns the capabilities resolved at registration.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns the last observed connectivity.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Returns when discovery last reported this device.
    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Returns the device handle.
    #[must_use]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Returns the bound on each call to the device.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub(crate) fn set_host(&mut self, host: impl Into<String>) {
        self.record.host = host.into();
    }

    pub(crate) fn mark_seen(&mut self) {
        self.last_seen = Some(Utc::now());
    }
}

impl<H: DeviceHandle> Node<H> {
    /// Checks connectivity through the handle and records the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnreachable`] if the check itself failed, in
    /// which case connectivity is unknown and the recorded state is left
    /// as it was.
    pub async fn is_connected(&mut self) -> Result<bool, Error> {
        let connected = self
            .bounded(self.handle.is_connected())
            .await
            .map_err(|source| self.unreachable(source))?;

        self.connection = if connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        Ok(connected)
    }

    /// Connects to the device at its current host.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnreachable`] if the connection failed; the
    /// node is then marked disconnected.
    pub async fn connect(&mut self) -> Result<(), Error> {
        let result = self.bounded(self.handle.connect(&self.record.host)).await;
        match result {
            Ok(()) => {
                self.connection = ConnectionState::Connected;
                Ok(())
            }
            Err(source) => {
                self.connection = ConnectionState::Disconnected;
                Err(self.unreachable(source))
            }
        }
    }

    /// Refreshes the lightweight status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnreachable`] on failure; the node is then
    /// marked disconnected.
    pub async fn short_poll(&mut self) -> Result<(), Error> {
        self.refresh(RefreshScope::Short).await
    }

    /// Refreshes the deep status.
    ///
    /// Returns `Ok(false)` without touching the device when it has no deep
    /// status to refresh.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnreachable`] on failure; the node is then
    /// marked disconnected.
    pub async fn long_poll(&mut self) -> Result<bool, Error> {
        if !self.capabilities.deep_poll {
            return Ok(false);
        }
        self.refresh(RefreshScope::Long).await?;
        Ok(true)
    }

    /// Reports the full device state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceUnreachable`] on failure; the node is then
    /// marked disconnected.
    pub async fn query(&mut self) -> Result<(), Error> {
        self.refresh(RefreshScope::Full).await
    }

    async fn refresh(&mut self, scope: RefreshScope) -> Result<(), Error> {
        let result = self.bounded(self.handle.refresh_status(scope)).await;
        if let Err(source) = result {
            self.connection = ConnectionState::Disconnected;
            return Err(self.unreachable(source));
        }
        Ok(())
    }

    /// Runs a handle call, failing with [`DeviceError::Timeout`] once the
    /// node's timeout elapses.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, DeviceError>>,
    ) -> Result<T, DeviceError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DeviceError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    fn unreachable(&self, source: DeviceError) -> Error {
        Error::DeviceUnreachable {
            address: self.key(),
            source,
        }
    }
}

impl<H> std::fmt::Debug for Node<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("address", &self.record.address)
            .field("name", &self.record.name)
            .field("host", &self.record.host)
            .field("type", &self.record.device_type)
            .field("connection", &self.connection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct StubHandle {
        online: AtomicBool,
        hung: AtomicBool,
        refreshes: AtomicUsize,
    }

    impl StubHandle {
        async fn hang_if_asked(&self) {
            if self.hung.load(Ordering::SeqCst) {
                std::future::pending::<()>().await;
            }
        }
    }

    impl DeviceHandle for StubHandle {
        async fn is_connected(&self) -> Result<bool, DeviceError> {
            self.hang_if_asked().await;
            Ok(self.online.load(Ordering::SeqCst))
        }

        async fn connect(&self, _host: &str) -> Result<(), DeviceError> {
            self.hang_if_asked().await;
            if self.online.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(DeviceError::NotConnected)
            }
        }

        async fn refresh_status(&self, _scope: RefreshScope) -> Result<(), DeviceError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            self.hang_if_asked().await;
            if self.online.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(DeviceError::Timeout(1000))
            }
        }
    }

    fn node(device_type: DeviceType, model: &str) -> Node<StubHandle> {
        let record = DeviceRecord::new(
            device_type,
            "Test",
            "10.0.0.5",
            HardwareAddress::new("50:C7:BF:0A:0B:0C"),
            model,
        );
        Node::new(record, StubHandle::default())
    }

    #[test]
    fn new_node_is_unknown() {
        let node = node(DeviceType::Plug, "HS105");
        assert_eq!(node.connection_state(), ConnectionState::Unknown);
        assert!(node.last_seen().is_none());
    }

    #[test]
    fn set_host_keeps_identity() {
        let mut node = node(DeviceType::Plug, "HS105");
        let address = node.address().clone();

        node.set_host("10.0.0.9");

        assert_eq!(node.host(), "10.0.0.9");
        assert_eq!(node.address(), &address);
    }

    #[tokio::test]
    async fn failed_connect_marks_disconnected() {
        let mut node = node(DeviceType::Plug, "HS105");

        let err = node.connect().await.unwrap_err();

        assert!(matches!(err, Error::DeviceUnreachable { .. }));
        assert_eq!(node.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connectivity_check_updates_state() {
        let mut node = node(DeviceType::Plug, "HS105");
        node.handle().online.store(true, Ordering::SeqCst);

        assert!(node.is_connected().await.unwrap());
        assert_eq!(node.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn failed_refresh_marks_disconnected() {
        let mut node = node(DeviceType::Plug, "HS105");
        node.handle().online.store(true, Ordering::SeqCst);
        node.connect().await.unwrap();
        node.handle().online.store(false, Ordering::SeqCst);

        assert!(node.short_poll().await.is_err());
        assert_eq!(node.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn long_poll_skips_devices_without_deep_status() {
        let mut node = node(DeviceType::Bulb, "LB100");

        assert!(!node.long_poll().await.unwrap());
        assert_eq!(node.handle().refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn long_poll_refreshes_strips() {
        let mut node = node(DeviceType::Strip, "HS300");
        node.handle().online.store(true, Ordering::SeqCst);

        assert!(node.long_poll().await.unwrap());
        assert_eq!(node.handle().refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_connect_times_out_and_marks_disconnected() {
        let mut node = node(DeviceType::Plug, "HS105");
        node.set_timeout(Duration::from_secs(3));
        node.handle().online.store(true, Ordering::SeqCst);
        node.handle().hung.store(true, Ordering::SeqCst);

        let err = node.connect().await.unwrap_err();

        assert!(matches!(
            err,
            Error::DeviceUnreachable {
                source: DeviceError::Timeout(3000),
                ..
            }
        ));
        assert_eq!(node.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_connectivity_check_keeps_state() {
        let mut node = node(DeviceType::Strip, "HS300");
        node.handle().online.store(true, Ordering::SeqCst);
        node.connect().await.unwrap();
        node.handle().hung.store(true, Ordering::SeqCst);

        assert!(node.is_connected().await.is_err());
        assert_eq!(node.connection_state(), ConnectionState::Connected);
        assert!(node.long_poll().await.is_err());
        assert_eq!(node.connection_state(), ConnectionState::Disconnected);
    }
}
