// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device capability sets.
//!
//! Capabilities are resolved once, when a node is built, from its kind and
//! model string. The poll scheduler consults them instead of probing a
//! device and treating failures as "feature missing".

use crate::record::DeviceType;

/// Plug models carrying an energy meter.
const ENERGY_PLUG_MODELS: &[&str] = &["HS110", "KP115"];

/// Bulb models with colour support.
const COLOR_BULB_MODELS: &[&str] = &["LB130", "KL130"];

/// Outlets on a strip when the model does not tell us otherwise.
const DEFAULT_STRIP_OUTLETS: u8 = 6;

/// What a managed device supports.
///
/// # Examples
///
/// ```
/// use kasa_registry::{Capabilities, DeviceType};
///
/// let plug = Capabilities::resolve(DeviceType::Plug, "HS110(US)");
/// assert!(plug.deep_poll);
///
/// let bulb = Capabilities::resolve(DeviceType::Bulb, "LB130(US)");
/// assert!(bulb.color);
/// assert!(!bulb.deep_poll);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
// Independent feature flags.
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Number of switchable outlets.
    pub outlets: u8,

    /// Supports the long-poll deep refresh (outlet or energy readings).
    pub deep_poll: bool,

    /// Supports brightness control.
    pub dimmable: bool,

    /// Supports hue/saturation colour.
    pub color: bool,

    /// Reports energy usage.
    pub energy: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::plug()
    }
}

impl Capabilities {
    /// A plain single-outlet plug.
    #[must_use]
    pub const fn plug() -> Self {
        Self {
            outlets: 1,
            deep_poll: false,
            dimmable: false,
            color: false,
            energy: false,
        }
    }

    /// A plug with an energy meter.
    #[must_use]
    pub const fn energy_plug() -> Self {
        Self {
            outlets: 1,
            deep_poll: true,
            dimmable: false,
            color: false,
            energy: true,
        }
    }

    /// A multi-outlet strip.
    #[must_use]
    pub const fn strip(outlets: u8) -> Self {
        Self {
            outlets,
            deep_poll: true,
            dimmable: false,
            color: false,
            energy: false,
        }
    }

    /// A dimmable bulb, optionally with colour.
    #[must_use]
    pub const fn bulb(color: bool) -> Self {
        Self {
            outlets: 1,
            deep_poll: false,
            dimmable: true,
            color,
            energy: false,
        }
    }

    /// Resolves the capabilities of a device from its kind and model.
    ///
    /// Model strings carry a region suffix (`HS110(US)`), so only the
    /// prefix is matched.
    #[must_use]
    pub fn resolve(device_type: DeviceType, model: &str) -> Self {
        let model = model.trim().to_ascii_uppercase();
        let is_one_of = |models: &[&str]| models.iter().any(|m| model.starts_with(m));

        match device_type {
            DeviceType::Strip => Self::strip(strip_outlets(&model)),
            DeviceType::Plug if is_one_of(ENERGY_PLUG_MODELS) => Self::energy_plug(),
            DeviceType::Plug => Self::plug(),
            DeviceType::Bulb => Self::bulb(is_one_of(COLOR_BULB_MODELS)),
        }
    }
}

fn strip_outlets(model: &str) -> u8 {
    if model.starts_with("HS107") || model.starts_with("KP200") {
        2
    } else if model.starts_with("KP303") {
        3
    } else {
        DEFAULT_STRIP_OUTLETS
    }
}
