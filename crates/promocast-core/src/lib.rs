//! # Promocast Core
//!
//! Shared foundation for the broadcast daemon: the error taxonomy,
//! typed records for the persisted state, the capability traits the
//! engine calls through (`Storage`, `Transport`, `AssetStore`), and
//! the runtime application config.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::AppConfig;
pub use error::{PromoError, Result};
pub use traits::{AssetStore, Storage, Transport};
pub use types::{
    ActivityRecord, BroadcastConfig, DashboardSnapshot, Destination, ImportReport,
    NewDestination, RunState, ACTIVITY_SUCCESS_PREFIX,
};
