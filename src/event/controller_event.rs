// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller event types.

use crate::identity::RegistryAddress;
use crate::record::DeviceType;

/// One beat of the two-valued liveness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pulse {
    /// Reported to the hub as `DON`.
    On,
    /// Reported to the hub as `DOF`.
    Off,
}

impl Pulse {
    /// Returns the other pulse.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }

    /// Returns the hub command name for this pulse.
    #[must_use]
    pub const fn command(self) -> &'static str {
        match self {
            Self::On => "DON",
            Self::Off => "DOF",
        }
    }
}

/// Events emitted by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The controller is alive; alternates on every long poll.
    Heartbeat(Pulse),

    /// A node was registered, either new or rebuilt.
    DeviceAdded {
        /// Registry address of the node.
        address: RegistryAddress,
        /// Kind of device.
        kind: DeviceType,
    },

    /// Discovery found a known device at a different host.
    HostChanged {
        /// Registry address of the node.
        address: RegistryAddress,
        /// Previous host.
        from: String,
        /// New host.
        to: String,
    },

    /// A reconnection attempt finished.
    Reconnected {
        /// Registry address of the node.
        address: RegistryAddress,
        /// Whether the device is connected now.
        connected: bool,
    },

    /// A discovery pass failed at the transport level.
    DiscoveryFailed {
        /// Human readable cause.
        reason: String,
    },

    /// The hub should (re)install the node profile.
    ProfileUpdateRequested,
}

impl ControllerEvent {
    /// Returns the registry address this event is about, if any.
    #[must_use]
    pub fn address(&self) -> Option<&RegistryAddress> {
        match self {
            Self::DeviceAdded { address, .. }
            | Self::HostChanged { address, .. }
            | Self::Reconnected { address, .. } => Some(address),
            Self::Heartbeat(_) | Self::DiscoveryFailed { .. } | Self::ProfileUpdateRequested => {
                None
            }
        }
    }

    /// Returns `true` if this is a heartbeat.
    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Heartbeat(_))
    }
}
