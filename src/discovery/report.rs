// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outcomes of discovery passes.

use crate::identity::RegistryAddress;

/// What a full discovery pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Distinct devices that answered.
    pub discovered: usize,
    /// Responders that were registered and persisted.
    pub registered: Vec<RegistryAddress>,
    /// Silent devices rebuilt from their persisted record.
    pub recovered: Vec<RegistryAddress>,
    /// Devices skipped for an unsupported type or a corrupt record.
    pub skipped: usize,
}

impl DiscoveryReport {
    /// Returns how many nodes the pass registered in total.
    #[must_use]
    pub fn total(&self) -> usize {
        self.registered.len() + self.recovered.len()
    }
}

/// What an incremental discovery pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncrementalReport {
    /// Distinct devices that answered.
    pub discovered: usize,
    /// New devices registered.
    pub added: Vec<RegistryAddress>,
    /// Known devices found at a new host.
    pub moved: Vec<RegistryAddress>,
    /// Known devices at the same host that were reconnected.
    pub reconnected: Vec<RegistryAddress>,
    /// Known devices that needed nothing.
    pub unchanged: usize,
    /// New devices skipped for an unsupported type.
    pub skipped: usize,
}
