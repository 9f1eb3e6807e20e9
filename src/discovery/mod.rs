// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery and reconciliation against the registry.
//!
//! Discovery broadcasts are best-effort: a device that is briefly offline,
//! or whose answer was lost, simply does not show up in one pass. The
//! [`Reconciler`] therefore never forgets a device because it stayed
//! silent. It persists every device it has seen and, on a full pass,
//! re-registers known devices that did not answer.
//!
//! # Passes
//!
//! - [`Reconciler::discover_all`] runs at start-up. It registers and
//!   persists every responder, then rebuilds every persisted device that
//!   did not respond.
//! - [`Reconciler::reconcile_incremental`] runs when the long poll finds a
//!   node unreachable, or on the hub's `DISCOVER` command. It adds new
//!   devices, follows devices whose host changed and retries disconnected
//!   ones.
//!
//! A transport failure aborts a pass before the registry is touched.
//! Anything that goes wrong with a single device is logged and skipped.

mod report;

pub use report::{DiscoveryReport, IncrementalReport};

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::time::Duration;

use crate::device::{Connector, DeviceFactory, Node};
use crate::error::{Error, TransportError};
use crate::event::{ControllerEvent, EventBus};
use crate::identity::NormalizedAddress;
use crate::record::DiscoveredDevice;
use crate::registry::Registry;
use crate::store::{ConfigStore, DeviceParams};

/// Default bound on a single discovery call.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// The network discovery broadcast.
pub trait DiscoveryTransport {
    /// Broadcasts a discovery probe and collects the answers.
    ///
    /// Finding no devices is `Ok` with an empty list.
    fn discover(&self) -> impl Future<Output = Result<Vec<DiscoveredDevice>, TransportError>> + Send;
}

/// How a node came to be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Answered the current discovery pass.
    Discovered,
    /// Rebuilt from the parameter store.
    Persisted,
}

/// Merges discovery results with the registry and the persisted records.
#[derive(Debug)]
pub struct Reconciler<T, C, S> {
    transport: T,
    factory: DeviceFactory<C>,
    params: DeviceParams<S>,
    events: EventBus,
    timeout: Duration,
}

impl<T, C, S> Reconciler<T, C, S>
where
    T: DiscoveryTransport,
    C: Connector,
    S: ConfigStore,
{
    /// Creates a reconciler publishing to `events`.
    #[must_use]
    pub fn new(
        transport: T,
        factory: DeviceFactory<C>,
        params: DeviceParams<S>,
        events: EventBus,
    ) -> Self {
        Self {
            transport,
            factory,
            params,
            events,
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    /// Sets the bound on each discovery call.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the persisted device parameters.
    #[must_use]
    pub fn params(&self) -> &DeviceParams<S> {
        &self.params
    }

    /// Returns the node factory.
    #[must_use]
    pub fn factory(&self) -> &DeviceFactory<C> {
        &self.factory
    }

    /// Runs a full discovery pass.
    ///
    /// Every responder is built, registered (replacing any existing node for
    /// the same device, which also picks up a new host) and persisted. Then
    /// every persisted device that did not respond and is not registered yet
    /// is rebuilt from its record. Corrupt or unsupported records are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if discovery itself failed. The registry
    /// is left untouched in that case.
    pub async fn discover_all(
        &self,
        registry: &mut Registry<C::Handle>,
    ) -> Result<DiscoveryReport, Error> {
        tracing::info!("Starting full discovery");
        let discovered = self.discover().await?;

        let mut report = DiscoveryReport {
            discovered: discovered.len(),
            ..DiscoveryReport::default()
        };
        let mut seen = HashSet::new();

        for (key, device) in &discovered {
            tracing::debug!(
                alias = ?device.alias,
                model = %device.model,
                mac = %device.mac,
                host = %device.host,
                "Got device"
            );

            match self.factory.build_discovered(device) {
                Ok(node) => {
                    report.registered.push(node.address().clone());
                    self.register(registry, node, Origin::Discovered).await;
                    seen.insert(key.clone());
                }
                Err(e) => {
                    tracing::error!(mac = %device.mac, error = %e, "Skipping discovered device");
                    report.skipped += 1;
                }
            }
        }

        for key in self.params.keys() {
            if seen.contains(&key) {
                continue;
            }
            if registry.contains(&key) {
                tracing::debug!(key = %key, "Known device already registered, keeping live node");
                continue;
            }

            let record = match self.params.load_key(&key) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping persisted device");
                    report.skipped += 1;
                    continue;
                }
            };

            tracing::info!(
                name = %record.name,
                host = %record.host,
                address = %record.address,
                "Adding previously known device that did not respond to discovery"
            );

            match self.factory.build_persisted(&record) {
                Ok(node) => {
                    report.recovered.push(node.address().clone());
                    self.register(registry, node, Origin::Persisted).await;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping persisted device");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            discovered = report.discovered,
            registered = report.registered.len(),
            recovered = report.recovered.len(),
            skipped = report.skipped,
            "Full discovery completed"
        );
        Ok(report)
    }

    /// Runs an incremental discovery pass.
    ///
    /// - Unknown devices are built and registered like in a full pass.
    /// - Known devices at a new host get the new host and a reconnect.
    /// - Known devices at the same host that are not connected get a
    ///   reconnect.
    /// - Everything else is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if discovery itself failed. The registry
    /// is left untouched in that case.
    pub async fn reconcile_incremental(
        &self,
        registry: &mut Registry<C::Handle>,
    ) -> Result<IncrementalReport, Error> {
        tracing::info!("Starting incremental discovery");
        let discovered = self.discover().await?;

        let mut report = IncrementalReport {
            discovered: discovered.len(),
            ..IncrementalReport::default()
        };

        for (key, device) in discovered {
            if !registry.contains(&key) {
                tracing::info!(
                    alias = ?device.alias,
                    mac = %device.mac,
                    host = %device.host,
                    "Found new device"
                );
                match self.factory.build_discovered(&device) {
                    Ok(node) => {
                        report.added.push(node.address().clone());
                        self.register(registry, node, Origin::Discovered).await;
                    }
                    Err(e) => {
                        tracing::error!(mac = %device.mac, error = %e, "Skipping discovered device");
                        report.skipped += 1;
                    }
                }
                continue;
            }

            let Some(node) = registry.get_mut(&key) else {
                continue;
            };
            node.mark_seen();

            if node.host() != device.host {
                let from = node.host().to_string();
                tracing::warn!(
                    name = %node.name(),
                    from = %from,
                    to = %device.host,
                    "Updating device host"
                );
                node.set_host(device.host.clone());
                if let Err(e) = self.params.save(node.record()) {
                    tracing::error!(address = %node.address(), error = %e, "Failed to persist new host");
                }

                self.events.publish(ControllerEvent::HostChanged {
                    address: node.address().clone(),
                    from,
                    to: device.host.clone(),
                });
                self.reconnect(node).await;
                report.moved.push(node.address().clone());
            } else if matches!(node.is_connected().await, Ok(true)) {
                tracing::debug!(
                    name = %node.name(),
                    host = %node.host(),
                    "Device host unchanged and connected"
                );
                report.unchanged += 1;
            } else {
                self.reconnect(node).await;
                report.reconnected.push(node.address().clone());
            }
        }

        tracing::info!(
            discovered = report.discovered,
            added = report.added.len(),
            moved = report.moved.len(),
            reconnected = report.reconnected.len(),
            "Incremental discovery completed"
        );
        Ok(report)
    }

    /// Calls the transport, bounded by the timeout, and keys the results.
    async fn discover(&self) -> Result<BTreeMap<NormalizedAddress, DiscoveredDevice>, Error> {
        let result = match tokio::time::timeout(self.timeout, self.transport.discover()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        match result {
            Ok(devices) => {
                tracing::debug!(count = devices.len(), "Discovery answered");
                // Later answers from the same device win.
                Ok(devices
                    .into_iter()
                    .map(|device| (device.key(), device))
                    .collect())
            }
            Err(e) => {
                tracing::error!(error = %e, "Discovery failed");
                self.events.publish(ControllerEvent::DiscoveryFailed {
                    reason: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    /// Connects, persists and inserts a freshly built node.
    async fn register(
        &self,
        registry: &mut Registry<C::Handle>,
        mut node: Node<C::Handle>,
        origin: Origin,
    ) {
        tracing::info!(
            kind = %node.device_type(),
            name = %node.name(),
            address = %node.address(),
            "Adding device"
        );

        if origin == Origin::Discovered {
            node.mark_seen();
            if let Err(e) = self.params.save(node.record()) {
                tracing::error!(address = %node.address(), error = %e, "Failed to persist device");
            }
        }

        if let Err(e) = node.connect().await {
            tracing::warn!(address = %node.address(), error = %e, "Device not reachable yet");
        }

        self.events.publish(ControllerEvent::DeviceAdded {
            address: node.address().clone(),
            kind: node.device_type(),
        });
        registry.insert(node);
    }

    async fn reconnect(&self, node: &mut Node<C::Handle>) {
        let connected = match node.connect().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(address = %node.address(), error = %e, "Reconnect failed");
                false
            }
        };
        self.events.publish(ControllerEvent::Reconnected {
            address: node.address().clone(),
            connected,
        });
    }
}
