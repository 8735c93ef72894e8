//! # Promocast Store
//!
//! SQLite-backed `Storage` implementation and the filesystem
//! `AssetStore` for uploaded broadcast images.

pub mod assets;
pub mod sqlite;

pub use assets::FsAssetStore;
pub use sqlite::SqliteStore;
