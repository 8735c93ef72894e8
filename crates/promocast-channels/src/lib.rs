//! # Promocast Channels
//! Outbound messaging transport implementations.

pub mod telegram;

pub use telegram::{TelegramConfig, TelegramTransport};
