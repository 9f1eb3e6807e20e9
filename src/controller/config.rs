// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller configuration.

use std::time::Duration;

use crate::device::DEFAULT_DEVICE_TIMEOUT;
use crate::discovery::DEFAULT_DISCOVERY_TIMEOUT;
use crate::event::EventBus;

const DEFAULT_NAME: &str = "Kasa Controller";
const DEFAULT_ADDRESS: &str = "tplkasactl";
const DEFAULT_SHORT_POLL: Duration = Duration::from_secs(10);
const DEFAULT_LONG_POLL: Duration = Duration::from_secs(30);
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Settings for a [`Controller`](super::Controller).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use kasa_registry::ControllerConfig;
///
/// let config = ControllerConfig::new()
///     .with_short_poll(Duration::from_secs(5))
///     .with_long_poll(Duration::from_secs(60))
///     .with_discovery_timeout(Duration::from_secs(3));
///
/// assert_eq!(config.name(), "Kasa Controller");
/// assert_eq!(config.long_poll(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    name: String,
    address: String,
    short_poll: Duration,
    long_poll: Duration,
    discovery_timeout: Duration,
    device_timeout: Duration,
    event_capacity: usize,
}

impl ControllerConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the controller's display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the controller's own hub address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets the short-poll interval.
    #[must_use]
    pub fn with_short_poll(mut self, interval: Duration) -> Self {
        self.short_poll = interval;
        self
    }

    /// Sets the long-poll interval.
    #[must_use]
    pub fn with_long_poll(mut self, interval: Duration) -> Self {
        self.long_poll = interval;
        self
    }

    /// Sets the bound on each discovery call.
    #[must_use]
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Sets the bound on each call to a single device.
    #[must_use]
    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = timeout;
        self
    }

    /// Sets how many events the bus buffers per subscriber.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Returns the controller's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the controller's own hub address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the short-poll interval.
    #[must_use]
    pub fn short_poll(&self) -> Duration {
        self.short_poll
    }

    /// Returns the long-poll interval.
    #[must_use]
    pub fn long_poll(&self) -> Duration {
        self.long_poll
    }

    /// Returns the bound on each discovery call.
    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        self.discovery_timeout
    }

    /// Returns the bound on each call to a single device.
    #[must_use]
    pub fn device_timeout(&self) -> Duration {
        self.device_timeout
    }

    pub(crate) fn event_bus(&self) -> EventBus {
        // broadcast::channel panics on zero capacity.
        EventBus::with_capacity(self.event_capacity.max(1))
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            short_poll: DEFAULT_SHORT_POLL,
            long_poll: DEFAULT_LONG_POLL,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            device_timeout: DEFAULT_DEVICE_TIMEOUT,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ControllerConfig::default();

        assert_eq!(config.name(), "Kasa Controller");
        assert_eq!(config.address(), "tplkasactl");
        assert_eq!(config.short_poll(), Duration::from_secs(10));
        assert_eq!(config.long_poll(), Duration::from_secs(30));
        assert_eq!(config.discovery_timeout(), Duration::from_secs(5));
        assert_eq!(config.device_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn chained_setters() {
        let config = ControllerConfig::new()
            .with_name("Garage")
            .with_address("garagectl")
            .with_short_poll(Duration::from_secs(2))
            .with_long_poll(Duration::from_secs(20))
            .with_discovery_timeout(Duration::from_millis(1500))
            .with_device_timeout(Duration::from_secs(4));

        assert_eq!(config.name(), "Garage");
        assert_eq!(config.address(), "garagectl");
        assert_eq!(config.short_poll(), Duration::from_secs(2));
        assert_eq!(config.long_poll(), Duration::from_secs(20));
        assert_eq!(config.discovery_timeout(), Duration::from_millis(1500));
        assert_eq!(config.device_timeout(), Duration::from_secs(4));
    }

    #[test]
    fn zero_event_capacity_is_clamped() {
        let config = ControllerConfig::new().with_event_capacity(0);
        assert_eq!(config.event_bus().subscriber_count(), 0);
    }
}
