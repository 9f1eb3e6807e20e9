// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted device parameters.
//!
//! The hub keeps a flat text map of custom parameters that survives
//! restarts. Every device we have ever registered owns one entry in it,
//! keyed by its [normalized](crate::identity::normalize) hardware address,
//! holding the JSON-encoded [`DeviceRecord`].
//!
//! [`ConfigStore`] is the raw map; [`DeviceParams`] layers record encoding
//! on top of it.
//!
//! # Examples
//!
//! ```
//! use kasa_registry::store::{DeviceParams, MemoryConfigStore};
//! use kasa_registry::{DeviceRecord, DeviceType, HardwareAddress};
//!
//! let params = DeviceParams::new(MemoryConfigStore::new());
//! let record = DeviceRecord::new(
//!     DeviceType::Plug,
//!     "Lamp",
//!     "10.0.0.7",
//!     HardwareAddress::new("B0:BE:76:12:34:56"),
//!     "HS105",
//! );
//!
//! params.save(&record).unwrap();
//! assert!(params.exists(&record.mac));
//! assert_eq!(params.load(&record.mac).unwrap(), Some(record));
//! ```

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryConfigStore;

use std::collections::BTreeMap;

use crate::error::{Error, StoreError};
use crate::identity::{HardwareAddress, NormalizedAddress};
use crate::record::{DeviceRecord, DeviceType};

/// A durable key/value text store owned by the hub.
///
/// Implementations need no locking beyond what makes them `Sync`; the
/// controller never calls into the store from two passes at once.
pub trait ConfigStore {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Inserts or overwrites every entry of `entries`, leaving other keys
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend could not persist the entries.
    fn put_all(&self, entries: BTreeMap<String, String>) -> Result<(), StoreError>;

    /// Returns every key currently stored.
    fn keys(&self) -> Vec<String>;
}

/// Reads and writes [`DeviceRecord`]s in a [`ConfigStore`].
#[derive(Debug)]
pub struct DeviceParams<S> {
    store: S,
}

impl<S: ConfigStore> DeviceParams<S> {
    /// Wraps a store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes `record` under its normalized hardware address, replacing any
    /// previous entry for the same device.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if encoding or the backend write fails.
    pub fn save(&self, record: &DeviceRecord) -> Result<(), Error> {
        let key = record.key();
        let value = serde_json::to_string(record).map_err(StoreError::from)?;
        tracing::debug!(key = %key, value = %value, "Saving device record");

        let mut entries = BTreeMap::new();
        entries.insert(key.as_str().to_string(), value);
        self.store.put_all(entries)?;
        Ok(())
    }

    /// Loads the record stored for `mac`.
    ///
    /// Returns `Ok(None)` when nothing is stored under the key.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigCorrupt`] if the stored value is not a valid record.
    /// - [`Error::UnsupportedDeviceType`] if it names a type we do not manage.
    pub fn load(&self, mac: &HardwareAddress) -> Result<Option<DeviceRecord>, Error> {
        self.load_key(&mac.normalized())
    }

    /// Loads the record stored under an already normalized key.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_key(&self, key: &NormalizedAddress) -> Result<Option<DeviceRecord>, Error> {
        let Some(raw) = self.store.get(key.as_str()) else {
            return Ok(None);
        };
        decode_record(key, &raw).map(Some)
    }

    /// Returns true if a record is stored for `mac`.
    #[must_use]
    pub fn exists(&self, mac: &HardwareAddress) -> bool {
        self.store.get(mac.normalized().as_str()).is_some()
    }

    /// Returns the normalized key of every stored entry.
    #[must_use]
    pub fn keys(&self) -> Vec<NormalizedAddress> {
        self.store
            .keys()
            .iter()
            .map(|key| NormalizedAddress::from(key.as_str()))
            .collect()
    }
}

fn decode_record(key: &NormalizedAddress, raw: &str) -> Result<DeviceRecord, Error> {
    let corrupt = |source| Error::ConfigCorrupt {
        key: key.to_string(),
        source,
    };

    let value: serde_json::Value = serde_json::from_str(raw).map_err(corrupt)?;

    // An unknown tag is a type we do not manage, not a broken record.
    if let Some(tag) = value.get("type").and_then(serde_json::Value::as_str) {
        tag.parse::<DeviceType>()?;
    }

    let mut record: DeviceRecord = serde_json::from_value(value).map_err(corrupt)?;

    // A record filed under another device's key would be registered twice.
    if record.key() != *key {
        return Err(corrupt(<serde_json::Error as serde::de::Error>::custom(format!(
            "record for {} stored under another key",
            record.mac
        ))));
    }

    let derived = record.mac.registry_address();
    if record.address != derived {
        tracing::warn!(
            key = %key,
            stored = %record.address,
            derived = %derived,
            "Stored registry address does not match hardware address, using derived"
        );
        record.address = derived;
    }

    Ok(record)
}
