// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The in-memory map of managed nodes.

use std::collections::BTreeMap;

use crate::device::Node;
use crate::identity::{HardwareAddress, NormalizedAddress};

/// Live nodes keyed by normalized hardware address.
///
/// Owned by the controller behind its single mutation lock; nothing here
/// synchronizes on its own.
pub struct Registry<H> {
    nodes: BTreeMap<NormalizedAddress, Node<H>>,
}

impl<H> Registry<H> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Registers `node`, replacing any node for the same device.
    ///
    /// Returns the replaced node.
    pub fn insert(&mut self, node: Node<H>) -> Option<Node<H>> {
        self.nodes.insert(node.key(), node)
    }

    /// Returns the node for `key`.
    #[must_use]
    pub fn get(&self, key: &NormalizedAddress) -> Option<&Node<H>> {
        self.nodes.get(key)
    }

    /// Returns the node for `key` mutably.
    pub fn get_mut(&mut self, key: &NormalizedAddress) -> Option<&mut Node<H>> {
        self.nodes.get_mut(key)
    }

    /// Returns the node for a hardware address in either spelling.
    #[must_use]
    pub fn by_mac(&self, mac: &HardwareAddress) -> Option<&Node<H>> {
        self.nodes.get(&mac.normalized())
    }

    /// Returns true if a node is registered for `key`.
    #[must_use]
    pub fn contains(&self, key: &NormalizedAddress) -> bool {
        self.nodes.contains_key(key)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the registered keys in order.
    #[must_use]
    pub fn keys(&self) -> Vec<NormalizedAddress> {
        self.nodes.keys().cloned().collect()
    }

    /// Iterates over the nodes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Node<H>> {
        self.nodes.values()
    }

    /// Iterates mutably over the nodes in key order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node<H>> {
        self.nodes.values_mut()
    }
}

impl<H> Default for Registry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.nodes.values()).finish()
    }
}
