// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timer-driven poll scheduling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::Controller;
use crate::device::{Connector, DeviceHandle};
use crate::discovery::DiscoveryTransport;
use crate::store::ConfigStore;

impl<T, C, S> Controller<T, C, S>
where
    T: DiscoveryTransport + Send + Sync + 'static,
    C: Connector + Send + Sync + 'static,
    C::Handle: DeviceHandle + Send + Sync + 'static,
    S: ConfigStore + Send + Sync + 'static,
{
    /// Drives the short and long polls until `shutdown` turns true or its
    /// sender is dropped.
    ///
    /// The first polls fire one interval after the call. A cycle that
    /// overruns delays the following ticks instead of bursting them.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut short = ticker(self.config.short_poll());
        let mut long = ticker(self.config.long_poll());

        tracing::info!(
            short_poll = ?self.config.short_poll(),
            long_poll = ?self.config.long_poll(),
            "Poll scheduler started"
        );

        while !*shutdown.borrow_and_update() {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = long.tick() => {
                    if let Err(e) = self.long_poll().await {
                        tracing::debug!(error = %e, "Long poll discovery failed");
                    }
                }
                _ = short.tick() => {
                    self.short_poll().await;
                }
            }
        }

        tracing::info!("Poll scheduler stopped");
    }

    /// Runs [`run`](Self::run) on a new task.
    #[must_use = "dropping the handle leaves the scheduler running with no way to stop it"]
    pub fn spawn(self: Arc<Self>) -> PollerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(rx).await });
        PollerHandle { shutdown, task }
    }
}

fn ticker(period: Duration) -> Interval {
    // interval_at panics on a zero period.
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Handle to a spawned poll scheduler.
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Returns true if the scheduler task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the scheduler to stop and waits for it.
    ///
    /// A cycle in progress finishes first.
    pub async fn stop(self) {
        self.shutdown.send_replace(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Poll scheduler task failed");
        }
    }
}
