use serde::{Deserialize, Serialize};

use super::{null_as_default, parse_timestamp};

/// A past broadcast. The backend truncates long messages to a preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Broadcast {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipients_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Broadcast {
    pub fn sent_at(&self) -> Option<chrono::NaiveDateTime> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BroadcastSummary {
    pub id: i64,
    pub recipients_count: i64,
    pub total_users: i64,
}

/// Result of sending a broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BroadcastReceipt {
    /// Human-readable confirmation from the backend
    pub message: String,
    #[serde(default)]
    pub broadcast: Option<BroadcastSummary>,
}

impl BroadcastReceipt {
    /// Recipients that did not receive the message
    pub fn failed_count(&self) -> i64 {
        self.broadcast
            .as_ref()
            .map(|b| (b.total_users - b.recipients_count).max(0))
            .unwrap_or(0)
    }
}
