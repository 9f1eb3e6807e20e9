// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON file backed parameter store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use super::ConfigStore;
use crate::error::StoreError;

/// A [`ConfigStore`] persisted as one JSON object in a file.
///
/// The whole map is loaded on open and cached; every [`put_all`] rewrites
/// the file. A missing file is an empty store.
///
/// [`put_all`]: ConfigStore::put_all
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, loading any existing entries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or is
    /// not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let entries: BTreeMap<String, String> = serde_json::from_str(&contents)?;
            tracing::info!(path = %path.display(), count = entries.len(), "Loaded device parameters");
            entries
        } else {
            tracing::info!(path = %path.display(), "No parameter file found, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents)?;

        tracing::debug!(path = %self.path.display(), "Saved device parameters");
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn put_all(&self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        // Held across the file write so concurrent writers merge in turn.
        let mut guard = self.entries.write();
        let mut updated = guard.clone();
        updated.extend(entries);

        // The cache only changes once the file write succeeded.
        self.write(&updated)?;
        *guard = updated;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}
