// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hardware address normalization and registry address derivation.
//!
//! Devices report their MAC in the colon-delimited form (`50:C7:BF:0A:0B:0C`).
//! The hub cannot use colons in identifiers, so every key we store or look up
//! uses the stripped form (`50C7BF0A0B0C`) instead. Both spellings name the
//! same device and compare equal as [`HardwareAddress`] values.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Maximum identifier length accepted by the hub's addressing scheme.
pub const MAX_REGISTRY_ADDRESS_LEN: usize = 14;

/// A device hardware (MAC) address as reported by the device.
///
/// Equality and hashing use the [normalized](normalize) form, so
/// `"50:C7:BF:0A:0B:0C"` and `"50C7BF0A0B0C"` are the same address.
/// The original spelling is kept for display and persistence.
///
/// # Examples
///
/// ```
/// use kasa_registry::HardwareAddress;
///
/// let colon = HardwareAddress::new("50:C7:BF:0A:0B:0C");
/// let stripped = HardwareAddress::new("50C7BF0A0B0C");
/// assert_eq!(colon, stripped);
/// assert_eq!(colon.normalized().as_str(), "50C7BF0A0B0C");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareAddress(String);

impl HardwareAddress {
    /// Wraps a hardware address string.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Returns the address as originally spelled.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the stripped form used for every key.
    #[must_use]
    pub fn normalized(&self) -> NormalizedAddress {
        normalize(&self.0)
    }

    /// Returns the registry address derived from this hardware address.
    #[must_use]
    pub fn registry_address(&self) -> RegistryAddress {
        derive_registry_address(&self.0)
    }
}

impl PartialEq for HardwareAddress {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for HardwareAddress {}

impl Hash for HardwareAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Debug for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HardwareAddress({})", self.0)
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HardwareAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for HardwareAddress {
    fn from(address: String) -> Self {
        Self(address)
    }
}

/// A hardware address with every colon removed.
///
/// This is the only form used as a store key, a registry map key or an
/// address suffix.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    /// Returns the stripped address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NormalizedAddress({})", self.0)
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NormalizedAddress {
    fn from(address: &str) -> Self {
        normalize(address)
    }
}

impl From<&HardwareAddress> for NormalizedAddress {
    fn from(address: &HardwareAddress) -> Self {
        address.normalized()
    }
}

/// The stable hub-facing identifier of a managed device.
///
/// Derived once from the hardware address and never changed afterwards,
/// whatever happens to the device's host, name or model.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistryAddress(String);

impl RegistryAddress {
    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegistryAddress({})", self.0)
    }
}

impl fmt::Display for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips all colon characters from a hardware address.
///
/// Total and deterministic; any string is accepted.
#[must_use]
pub fn normalize(address: &str) -> NormalizedAddress {
    NormalizedAddress(address.chars().filter(|&c| c != ':').collect())
}

/// Derives the registry address for a hardware address.
///
/// Lower-cases the address, keeps only ASCII alphanumerics and `_`, and
/// truncates to [`MAX_REGISTRY_ADDRESS_LEN`]. A 48-bit MAC strips down to 12
/// hex digits, so distinct MACs never collide.
#[must_use]
pub fn derive_registry_address(address: &str) -> RegistryAddress {
    let id: String = address
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.to_ascii_lowercase())
        .take(MAX_REGISTRY_ADDRESS_LEN)
        .collect();
    RegistryAddress(id)
}
