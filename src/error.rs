// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the registry.
//!
//! Errors are split by the collaborator that produced them: the discovery
//! transport, a single device handle, or the persisted parameter store.
//! Per-device failures are logged and absorbed at the boundary of a
//! discovery pass or poll cycle; only [`Error::Transport`] aborts a pass.

use thiserror::Error;

use crate::identity::NormalizedAddress;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The discovery broadcast failed as a whole.
    #[error("discovery transport failed: {0}")]
    Transport(#[from] TransportError),

    /// A discovered or persisted device carries a type tag we do not manage.
    #[error("unsupported device type: {0}")]
    UnsupportedDeviceType(String),

    /// A persisted device record could not be parsed.
    #[error("persisted record for {key} is corrupt: {source}")]
    ConfigCorrupt {
        /// Store key of the offending record.
        key: String,
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A single device failed a connectivity check or refresh.
    #[error("device {address} is unreachable: {source}")]
    DeviceUnreachable {
        /// Normalized hardware address of the device.
        address: NormalizedAddress,
        /// What the device handle reported.
        #[source]
        source: DeviceError,
    },

    /// Writing to the persisted parameter store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The hub sent a command name this controller does not handle.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Failures of the discovery transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The broadcast could not be sent or the responses could not be read.
    #[error("discovery failed: {0}")]
    Failed(String),

    /// Discovery did not finish within the configured bound.
    #[error("discovery timed out after {0} ms")]
    Timeout(u64),

    /// Socket level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a [`DeviceHandle`](crate::device::DeviceHandle).
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The handle has no live connection to the device.
    #[error("device is not connected")]
    NotConnected,

    /// The device did not answer in time.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The device answered with something we could not use.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Socket level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a [`ConfigStore`](crate::store::ConfigStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file or a record could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
