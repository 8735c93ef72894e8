//! Promocast error taxonomy.
//!
//! Setup errors abort a broadcast cycle into a single failure record;
//! per-destination delivery errors are swallowed by the fan-out loop.
//! Nothing here is fatal to the process.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PromoError>;

#[derive(Debug, Error)]
pub enum PromoError {
    /// Interval bounds violate ordering or positivity. Rejected before
    /// anything is applied or re-armed.
    #[error("invalid interval bounds {lower}..{upper}: need 1 <= lower <= upper")]
    InvalidBounds { lower: u32, upper: u32 },

    /// Empty template or no active destinations at cycle start.
    #[error("broadcast configuration incomplete: {0}")]
    ConfigurationIncomplete(String),

    /// Unique-constraint violation on destination insert.
    #[error("destination already registered: {0}")]
    DuplicateDestination(String),

    /// Image reference present but unresolvable. Delivery falls back
    /// to text-only; not a cycle failure.
    #[error("asset not found: {0}")]
    AssetNotFound(String),

    /// The destination itself is unreachable or invalid (chat not
    /// found, bot kicked, bad id).
    #[error("destination unreachable: {0}")]
    DestinationInvalid(String),

    /// Transport/network-level failure talking to the messaging API.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
