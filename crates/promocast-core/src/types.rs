//! Typed records for the persisted broadcast state.
//!
//! Keep these structs focused on the data returned by storage queries;
//! the cycle/scheduler logic lives in `promocast-scheduler`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PromoError, Result};

/// Prefix every success row in the activity ledger starts with. The
/// sent-today aggregate counts rows by it.
pub const ACTIVITY_SUCCESS_PREFIX: &str = "sent";

/// Whether a fired cycle actually delivers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Paused,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Running => "running",
            RunState::Paused => "paused",
        }
    }

    /// Parse the persisted form. Unknown values read as `Paused` so a
    /// corrupted row never causes surprise sends.
    pub fn parse(s: &str) -> Self {
        match s {
            "running" => RunState::Running,
            _ => RunState::Paused,
        }
    }
}

/// The broadcast configuration singleton (row id 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Message template, may contain spin-syntax groups.
    pub message: String,
    /// Upload filename of the attached image; empty = text-only.
    pub photo: String,
    /// Interval lower bound, minutes.
    pub interval_min: u32,
    /// Interval upper bound, minutes.
    pub interval_max: u32,
    pub run_state: RunState,
    /// Last destination a preview was sent to.
    pub preview_id: String,
}

impl BroadcastConfig {
    /// Values seeded on first database open.
    pub fn seed() -> Self {
        Self {
            message: String::new(),
            photo: String::new(),
            interval_min: 30,
            interval_max: 40,
            run_state: RunState::Running,
            preview_id: String::new(),
        }
    }

    /// Invariant: 1 <= interval_min <= interval_max.
    pub fn validate_bounds(lower: u32, upper: u32) -> Result<()> {
        if lower < 1 || lower > upper {
            return Err(PromoError::InvalidBounds { lower, upper });
        }
        Ok(())
    }
}

/// A registered broadcast destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub id: i64,
    /// External chat identifier. Unique across the registry.
    pub chat_id: String,
    pub name: String,
    pub group_label: String,
    /// Included in the fan-out when true.
    pub active: bool,
    /// Last-known reachability status, written by the sweep.
    pub last_status: String,
}

/// Insert payload for a destination; id and status are assigned by the
/// store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDestination {
    pub chat_id: String,
    pub name: String,
    pub group_label: String,
}

impl NewDestination {
    pub fn new(chat_id: &str, name: &str, group_label: &str) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            name: name.to_string(),
            group_label: if group_label.is_empty() {
                "default".to_string()
            } else {
                group_label.to_string()
            },
        }
    }
}

/// One append-only row in the activity ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: i64,
    /// Assigned at insert, stored as RFC 3339 UTC.
    pub timestamp: DateTime<Utc>,
    pub detail: String,
}

/// Aggregate view consumed by the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub sent_today: u32,
    pub recent_logs: Vec<ActivityRecord>,
    pub room_count: usize,
    pub config: BroadcastConfig,
    pub destinations: Vec<Destination>,
}

/// Outcome of a batch destination import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    /// Rows skipped because the chat id was already registered.
    pub skipped: usize,
}
