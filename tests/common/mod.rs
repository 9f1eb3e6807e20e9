// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory network used by the integration tests.
//!
//! [`FakeTransport`] answers discovery with a scripted device list.
//! [`FakeConnector`] opens [`FakeHandle`]s backed by a shared
//! [`FakeNetwork`], where tests switch devices on and off line and read
//! back what the controller did to them.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use kasa_registry::device::{Connector, DeviceHandle, RefreshScope};
use kasa_registry::discovery::DiscoveryTransport;
use kasa_registry::error::{DeviceError, TransportError};
use kasa_registry::store::MemoryConfigStore;
use kasa_registry::{
    Controller, ControllerConfig, DeviceRecord, DiscoveredDevice, NormalizedAddress,
};

pub type TestController = Controller<FakeTransport, FakeConnector, MemoryConfigStore>;

// ============================================================================
// Discovery
// ============================================================================

#[derive(Default)]
struct TransportState {
    devices: Mutex<Vec<DiscoveredDevice>>,
    failing: AtomicBool,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

/// Scripted discovery broadcast.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<TransportState>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(devices: Vec<DiscoveredDevice>) -> Self {
        let transport = Self::new();
        transport.set_devices(devices);
        transport
    }

    pub fn set_devices(&self, devices: Vec<DiscoveredDevice>) {
        *self.state.devices.lock() = devices;
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every discovery call take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

impl DiscoveryTransport for FakeTransport {
    async fn discover(&self) -> Result<Vec<DiscoveredDevice>, TransportError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.state.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.state.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Failed("network unreachable".to_string()));
        }
        Ok(self.state.devices.lock().clone())
    }
}

// ============================================================================
// Devices
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct DeviceStatus {
    online: bool,
    check_fails: bool,
    hung: bool,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            online: true,
            check_fails: false,
            hung: false,
        }
    }
}

/// Shared state of every fake device, keyed by normalized hardware address.
#[derive(Default)]
pub struct FakeNetwork {
    status: Mutex<HashMap<NormalizedAddress, DeviceStatus>>,
    connects: Mutex<Vec<(NormalizedAddress, String)>>,
    refreshes: Mutex<Vec<(NormalizedAddress, RefreshScope)>>,
    opened: AtomicUsize,
}

impl FakeNetwork {
    pub fn set_online(&self, mac: &str, online: bool) {
        self.status.lock().entry(NormalizedAddress::from(mac)).or_default().online = online;
    }

    /// Makes the device's connectivity check itself fail.
    pub fn set_check_fails(&self, mac: &str, fails: bool) {
        self.status
            .lock()
            .entry(NormalizedAddress::from(mac))
            .or_default()
            .check_fails = fails;
    }

    /// Makes every call to the device wait forever.
    pub fn set_hung(&self, mac: &str, hung: bool) {
        self.status.lock().entry(NormalizedAddress::from(mac)).or_default().hung = hung;
    }

    /// Hosts the controller connected `mac` to, in order.
    pub fn connects_to(&self, mac: &str) -> Vec<String> {
        let key = NormalizedAddress::from(mac);
        self.connects
            .lock()
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, host)| host.clone())
            .collect()
    }

    pub fn total_connects(&self) -> usize {
        self.connects.lock().len()
    }

    pub fn refreshes(&self, mac: &str, scope: RefreshScope) -> usize {
        let key = NormalizedAddress::from(mac);
        self.refreshes
            .lock()
            .iter()
            .filter(|(k, s)| *k == key && *s == scope)
            .count()
    }

    pub fn total_refreshes(&self, scope: RefreshScope) -> usize {
        self.refreshes.lock().iter().filter(|(_, s)| *s == scope).count()
    }

    pub fn handles_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn status(&self, key: &NormalizedAddress) -> DeviceStatus {
        self.status.lock().get(key).copied().unwrap_or_default()
    }
}

/// One connection to a fake device.
pub struct FakeHandle {
    key: NormalizedAddress,
    network: Arc<FakeNetwork>,
}

impl FakeHandle {
    async fn hang_if_asked(&self) {
        if self.network.status(&self.key).hung {
            std::future::pending::<()>().await;
        }
    }
}

impl DeviceHandle for FakeHandle {
    async fn is_connected(&self) -> Result<bool, DeviceError> {
        self.hang_if_asked().await;
        let status = self.network.status(&self.key);
        if status.check_fails {
            return Err(DeviceError::Rejected("status check failed".to_string()));
        }
        Ok(status.online)
    }

    async fn connect(&self, host: &str) -> Result<(), DeviceError> {
        self.network
            .connects
            .lock()
            .push((self.key.clone(), host.to_string()));
        self.hang_if_asked().await;
        if self.network.status(&self.key).online {
            Ok(())
        } else {
            Err(DeviceError::Timeout(1000))
        }
    }

    async fn refresh_status(&self, scope: RefreshScope) -> Result<(), DeviceError> {
        self.network.refreshes.lock().push((self.key.clone(), scope));
        self.hang_if_asked().await;
        if self.network.status(&self.key).online {
            Ok(())
        } else {
            Err(DeviceError::NotConnected)
        }
    }
}

/// Opens [`FakeHandle`]s on a shared [`FakeNetwork`].
#[derive(Clone, Default)]
pub struct FakeConnector {
    network: Arc<FakeNetwork>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(&self) -> Arc<FakeNetwork> {
        Arc::clone(&self.network)
    }
}

impl Connector for FakeConnector {
    type Handle = FakeHandle;

    fn open(&self, record: &DeviceRecord) -> FakeHandle {
        self.network.opened.fetch_add(1, Ordering::SeqCst);
        FakeHandle {
            key: record.key(),
            network: Arc::clone(&self.network),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn plug(mac: &str, host: &str, alias: &str) -> DiscoveredDevice {
    DiscoveredDevice::new("SmartPlug", mac, host, "HS105(US)").with_alias(alias)
}

pub fn energy_plug(mac: &str, host: &str, alias: &str) -> DiscoveredDevice {
    DiscoveredDevice::new("SmartPlug", mac, host, "HS110(US)").with_alias(alias)
}

pub fn strip(mac: &str, host: &str) -> DiscoveredDevice {
    DiscoveredDevice::new("SmartStrip", mac, host, "HS300(US)")
}

pub fn bulb(mac: &str, host: &str, alias: &str) -> DiscoveredDevice {
    DiscoveredDevice::new("SmartBulb", mac, host, "LB130(US)").with_alias(alias)
}

/// A controller over fresh fakes; returns the fakes for scripting.
pub fn controller(
    config: ControllerConfig,
    store: MemoryConfigStore,
) -> (TestController, FakeTransport, Arc<FakeNetwork>) {
    let transport = FakeTransport::new();
    let connector = FakeConnector::new();
    let network = connector.network();
    let controller = Controller::new(config, transport.clone(), connector, store);
    (controller, transport, network)
}
