//! Error types
//!
//! Inventory mutation never fails outright: constraint rejections, unknown
//! items and stale slot indices are logged and skipped. The errors below
//! cover the edges where data enters the crate.

use crate::item::ItemId;
use thiserror::Error;

/// Item catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Definition list could not be parsed
    #[error("Failed to parse item definitions: {0}")]
    Parse(#[from] serde_json::Error),
    /// Two definitions share an id
    #[error("Item already registered: {0}")]
    Duplicate(ItemId),
    /// Definition without a usable id
    #[error("Item definition has an invalid id")]
    InvalidId,
}

/// Settings loading errors
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Settings could not be parsed
    #[error("Failed to parse inventory settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value that cannot be used as a limit
    #[error("Invalid inventory setting: {0}")]
    Invalid(String),
}

/// Replication snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Serialization error
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[source] bincode::Error),
    /// Deserialization error
    #[error("Failed to decode snapshot: {0}")]
    Decode(#[source] bincode::Error),
    /// Snapshot delivered to the authoritative instance
    #[error("Inventory '{0}' is authoritative and does not accept snapshots")]
    NotObserver(String),
    /// Snapshot is not newer than the last applied one
    #[error("Stale snapshot: received sequence {received}, current {current}")]
    Stale { received: u64, current: u64 },
}
