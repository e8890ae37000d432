//! Data models for dashboard entities.
//!
//! This module contains the records exchanged with the backend:
//!
//! - `User`: the authenticated identity
//! - `Bot`, `BotType`, `BotStats`: managed Telegram bots and overview counts
//! - `Broadcast`, `BroadcastReceipt`: broadcast history and send results
//! - `Transaction`, `TransactionStats`, `TransactionReport`: store sales
//! - `Product`, `NewProduct`: store catalogue and stock uploads
//!
//! With the `ts` feature enabled, each model also derives `ts_rs::TS` so
//! front-ends can share the exact shapes.

pub mod bot;
pub mod broadcast;
pub mod product;
pub mod transaction;
pub mod user;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};

pub use bot::{Bot, BotStats, BotType};
pub use broadcast::{Broadcast, BroadcastReceipt, BroadcastSummary};
pub use product::{CreatedProduct, NewProduct, Product, ProductReceipt, StockReceipt};
pub use transaction::{Transaction, TransactionReport, TransactionStats, TransactionStatus};
pub use user::User;

/// Deserialize `null` as the type's default value.
/// The backend emits `null` for unset text and counter columns.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (with offset) and the naive ISO 8601 form the backend
/// produces, e.g. `2024-05-01T13:45:00` or `2024-05-01T13:45:00.123456`.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
