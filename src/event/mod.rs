// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events the controller reports to the hub.
//!
//! The [`EventBus`] uses tokio's broadcast channel, so any number of hub
//! components can follow heartbeats, registrations and host changes.
//!
//! # Examples
//!
//! ```
//! use kasa_registry::event::{ControllerEvent, EventBus, Pulse};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(ControllerEvent::Heartbeat(Pulse::On));
//! ```

mod controller_event;
mod event_bus;

pub use controller_event::{ControllerEvent, Pulse};
pub use event_bus::EventBus;
