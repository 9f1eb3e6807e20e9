// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The controller node: registry, poll cycles and hub commands.
//!
//! A [`Controller`] owns the [`Registry`] of live nodes and the
//! [`Reconciler`] that feeds it. The hub drives it through lifecycle hooks
//! ([`start`](Controller::start), [`stop`](Controller::stop)), the two poll
//! cycles and [commands](ControllerCommand). Every one of those that touches
//! the registry holds its lock for its whole duration, so discovery passes,
//! poll cycles and commands never interleave.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use kasa_registry::{Controller, ControllerConfig};
//! # use kasa_registry::{DeviceRecord, DiscoveredDevice};
//! # use kasa_registry::device::{Connector, DeviceHandle, RefreshScope};
//! # use kasa_registry::discovery::DiscoveryTransport;
//! # use kasa_registry::error::{DeviceError, TransportError};
//! # use kasa_registry::store::MemoryConfigStore;
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
//! async fn main() {
//!     let controller = Arc::new(Controller::new(
//!         ControllerConfig::default(),
//!         Broadcast,
//!         Links,
//!         MemoryConfigStore::new(),
//!     ));
//!
//!     let mut events = controller.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{event:?}");
//!         }
//!     });
//!
//!     if let Err(e) = controller.start().await {
//!         eprintln!("start-up discovery failed, retrying on next long poll: {e}");
//!     }
//!
//!     let poller = Arc::clone(&controller).spawn();
//!     tokio::time::sleep(std::time::Duration::from_secs(600)).await;
//!     poller.stop().await;
//!     controller.stop();
//! }
//! ```

mod command;
mod config;
mod poller;

pub use command::ControllerCommand;
pub use config::ControllerConfig;
pub use poller::PollerHandle;

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard, broadcast, watch};

use crate::device::{Connector, DeviceFactory};
use crate::discovery::{DiscoveryReport, DiscoveryTransport, IncrementalReport, Reconciler};
use crate::error::Error;
use crate::event::{ControllerEvent, EventBus, Pulse};
use crate::registry::Registry;
use crate::store::{ConfigStore, DeviceParams};

/// Manages every smart device on the network for the hub.
pub struct Controller<T, C: Connector, S> {
    config: ControllerConfig,
    reconciler: Reconciler<T, C, S>,
    /// The single serialization boundary for registry mutation.
    registry: Mutex<Registry<C::Handle>>,
    events: EventBus,
    running: watch::Sender<bool>,
    /// Last pulse sent, `None` before the first heartbeat.
    heartbeat: parking_lot::Mutex<Option<Pulse>>,
    /// Set while no full discovery pass has succeeded yet.
    needs_full_discovery: AtomicBool,
}

impl<T, C, S> Controller<T, C, S>
where
    T: DiscoveryTransport,
    C: Connector,
    S: ConfigStore,
{
    /// Creates a stopped controller with an empty registry.
    #[must_use]
    pub fn new(config: ControllerConfig, transport: T, connector: C, store: S) -> Self {
        let events = config.event_bus();
        let reconciler = Reconciler::new(
            transport,
            DeviceFactory::new(connector).with_timeout(config.device_timeout()),
            DeviceParams::new(store),
            events.clone(),
        )
        .with_timeout(config.discovery_timeout());
        let (running, _) = watch::channel(false);

        Self {
            config,
            reconciler,
            registry: Mutex::new(Registry::new()),
            events,
            running,
            heartbeat: parking_lot::Mutex::new(None),
            needs_full_discovery: AtomicBool::new(false),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the persisted device parameters.
    #[must_use]
    pub fn params(&self) -> &DeviceParams<S> {
        self.reconciler.params()
    }

    /// Subscribes to controller events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Returns a receiver following the "running" status.
    #[must_use]
    pub fn watch_running(&self) -> watch::Receiver<bool> {
        self.running.subscribe()
    }

    /// Returns the "running" status.
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Returns true while the start-up discovery has not succeeded yet.
    #[must_use]
    pub fn needs_full_discovery(&self) -> bool {
        self.needs_full_discovery.load(Ordering::Acquire)
    }

    /// Locks the registry.
    ///
    /// Polls, discovery passes and commands wait while the guard is held.
    pub async fn registry(&self) -> MutexGuard<'_, Registry<C::Handle>> {
        self.registry.lock().await
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts the controller.
    ///
    /// Marks the controller running, asks the hub to refresh the node
    /// profile, sends the first heartbeat, validates the persisted
    /// parameters and runs a full discovery pass.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the discovery pass failed. The
    /// controller keeps running and the next long poll retries the full
    /// pass.
    pub async fn start(&self) -> Result<DiscoveryReport, Error> {
        tracing::info!(
            name = %self.config.name(),
            address = %self.config.address(),
            "Starting controller"
        );
        self.running.send_replace(true);
        self.events.publish(ControllerEvent::ProfileUpdateRequested);
        self.heartbeat();
        self.check_params();

        let report = self.discover_all().await?;
        tracing::info!(nodes = report.total(), "Controller started");
        Ok(report)
    }

    /// Marks the controller stopped.
    ///
    /// Nodes stay registered; a later [`start`](Self::start) reconciles them.
    pub fn stop(&self) {
        tracing::info!(name = %self.config.name(), "Stopping controller");
        self.running.send_replace(false);
    }

    /// Sends the next heartbeat pulse and returns it.
    ///
    /// Pulses alternate, starting with [`Pulse::On`].
    pub fn heartbeat(&self) -> Pulse {
        let pulse = {
            let mut last = self.heartbeat.lock();
            let next = last.map_or(Pulse::On, Pulse::toggled);
            *last = Some(next);
            next
        };
        tracing::debug!(pulse = pulse.command(), "Heartbeat");
        self.events.publish(ControllerEvent::Heartbeat(pulse));
        pulse
    }

    // =========================================================================
    // Poll cycles
    // =========================================================================

    /// Refreshes the lightweight status of every node.
    ///
    /// Returns how many nodes answered. A failing node is logged and marked
    /// disconnected; the others still run.
    pub async fn short_poll(&self) -> usize {
        let mut registry = self.registry.lock().await;
        let mut answered = 0;

        for node in registry.iter_mut() {
            match node.short_poll().await {
                Ok(()) => answered += 1,
                Err(e) => tracing::warn!(name = %node.name(), error = %e, "Short poll failed"),
            }
        }
        answered
    }

    /// Runs the long poll cycle.
    ///
    /// Sends a heartbeat, then checks every node's connectivity and refreshes
    /// the deep status of connected nodes that have one. A node whose check
    /// fails is skipped for this cycle.
    ///
    /// If any node was found disconnected, one incremental discovery pass
    /// runs for the whole cycle. While the start-up discovery has not
    /// succeeded, a full pass runs instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the discovery pass failed; the next
    /// cycle tries again.
    pub async fn long_poll(&self) -> Result<(), Error> {
        self.heartbeat();

        let mut registry = self.registry.lock().await;
        let mut all_connected = true;

        for node in registry.iter_mut() {
            match node.is_connected().await {
                Err(e) => {
                    tracing::debug!(name = %node.name(), error = %e, "Connectivity unknown, skipping");
                }
                Ok(false) => {
                    tracing::info!(name = %node.name(), host = %node.host(), "Device not connected");
                    all_connected = false;
                }
                Ok(true) => match node.long_poll().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(name = %node.name(), "No deep status to refresh");
                    }
                    Err(e) => {
                        tracing::warn!(name = %node.name(), error = %e, "Deep status refresh failed");
                    }
                },
            }
        }

        if self.needs_full_discovery() {
            tracing::info!("Retrying full discovery");
            self.full_pass(&mut registry).await?;
        } else if !all_connected {
            self.reconciler.reconcile_incremental(&mut registry).await?;
        }
        Ok(())
    }

    /// Validates the parameters, then asks every node for its full state.
    ///
    /// Returns how many nodes answered.
    pub async fn query(&self) -> usize {
        self.check_params();

        let mut registry = self.registry.lock().await;
        let mut answered = 0;
        for node in registry.iter_mut() {
            match node.query().await {
                Ok(()) => answered += 1,
                Err(e) => tracing::warn!(name = %node.name(), error = %e, "Query failed"),
            }
        }
        tracing::info!(answered, nodes = registry.len(), "Query completed");
        answered
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Runs a full discovery pass against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if discovery failed. The registry is left
    /// untouched and the next long poll retries the full pass.
    pub async fn discover_all(&self) -> Result<DiscoveryReport, Error> {
        let mut registry = self.registry.lock().await;
        self.full_pass(&mut registry).await
    }

    /// Runs an incremental discovery pass against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if discovery failed.
    pub async fn reconcile_incremental(&self) -> Result<IncrementalReport, Error> {
        let mut registry = self.registry.lock().await;
        self.reconciler.reconcile_incremental(&mut registry).await
    }

    async fn full_pass(
        &self,
        registry: &mut Registry<C::Handle>,
    ) -> Result<DiscoveryReport, Error> {
        let result = self.reconciler.discover_all(registry).await;
        self.needs_full_discovery.store(result.is_err(), Ordering::Release);
        result
    }

    // =========================================================================
    // Commands and parameters
    // =========================================================================

    /// Executes a hub command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if a `DISCOVER` pass failed.
    pub async fn handle_command(&self, command: ControllerCommand) -> Result<(), Error> {
        tracing::info!(command = %command, "Handling command");
        match command {
            ControllerCommand::Query => {
                self.query().await;
            }
            ControllerCommand::Discover => {
                self.reconcile_incremental().await?;
            }
            ControllerCommand::UpdateProfile => {
                self.events.publish(ControllerEvent::ProfileUpdateRequested);
            }
        }
        Ok(())
    }

    /// Checks every persisted device record.
    ///
    /// Corrupt and unsupported records are logged; they are ignored by
    /// discovery until the device answers again. Returns how many records
    /// are valid.
    pub fn check_params(&self) -> usize {
        let params = self.reconciler.params();
        let mut valid = 0;

        for key in params.keys() {
            match params.load_key(&key) {
                Ok(Some(_)) => valid += 1,
                Ok(None) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "Invalid device parameter"),
            }
        }
        tracing::debug!(valid, "Checked device parameters");
        valid
    }
}

impl<T, C: Connector, S> std::fmt::Debug for Controller<T, C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.config)
            .field("running", &*self.running.borrow())
            .field("needs_full_discovery", &self.needs_full_discovery)
            .finish_non_exhaustive()
    }
}
