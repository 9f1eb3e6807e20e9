// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory parameter store.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::ConfigStore;
use crate::error::StoreError;

/// A [`ConfigStore`] held in memory.
///
/// Suitable for hubs that persist the parameter map themselves and hand
/// it over at start-up. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with the hub's current parameters.
    #[must_use]
    pub fn with_entries(entries: BTreeMap<String, String>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Inserts a single raw entry.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Returns a copy of every entry.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn put_all(&self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        self.entries.write().extend(entries);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}
