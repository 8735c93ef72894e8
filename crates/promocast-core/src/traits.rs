//! Capability traits the broadcast engine calls through.
//!
//! One implementation of each is selected at composition time; the
//! engine never branches on the backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{ActivityRecord, BroadcastConfig, Destination, NewDestination};

/// Persistence for the configuration singleton, the destination
/// registry, and the append-only activity ledger.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read the configuration singleton. Always present: the store
    /// seeds it on first open.
    async fn load_config(&self) -> Result<BroadcastConfig>;

    async fn save_config(&self, config: &BroadcastConfig) -> Result<()>;

    /// Insert a destination. Fails with `DuplicateDestination` if the
    /// chat id is already registered; the registry is unchanged then.
    async fn insert_destination(&self, dest: &NewDestination) -> Result<Destination>;

    /// Delete by id. Returns whether a row was removed.
    async fn delete_destination(&self, id: i64) -> Result<bool>;

    async fn list_destinations(&self) -> Result<Vec<Destination>>;

    /// Only destinations flagged active, i.e. the fan-out set.
    async fn active_destinations(&self) -> Result<Vec<Destination>>;

    async fn set_destination_active(&self, id: i64, active: bool) -> Result<()>;

    /// Written by the reachability sweep; last writer wins.
    async fn set_destination_status(&self, id: i64, status: &str) -> Result<()>;

    /// Append one ledger row. Timestamp is assigned at insert.
    async fn append_activity(&self, detail: &str) -> Result<()>;

    async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>>;

    /// Count success rows with a timestamp at or after `since`.
    async fn sent_since(&self, since: DateTime<Utc>) -> Result<u32>;
}

/// Outbound messaging transport.
///
/// Failures are typed: `DestinationInvalid` when the destination
/// itself is unreachable or bad, `Transport` for network/API-level
/// trouble.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;

    /// Send an image with a caption.
    async fn send_photo(&self, chat_id: &str, photo: &Path, caption: &str) -> Result<()>;

    /// Lightweight existence probe. Returns an identifying label for
    /// the destination on success.
    async fn probe(&self, chat_id: &str) -> Result<String>;
}

/// Resolves an opaque image reference to a local file.
pub trait AssetStore: Send + Sync {
    /// `AssetNotFound` if the reference does not resolve to a file.
    fn resolve(&self, name: &str) -> Result<PathBuf>;
}
