use serde::{Deserialize, Serialize};

use super::{null_as_default, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Expired,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Failed => "Failed",
            TransactionStatus::Expired => "Expired",
            TransactionStatus::Cancelled => "Cancelled",
            TransactionStatus::Unknown => "Unknown",
        }
    }
}

/// A store sale made through one of the user's bots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Transaction {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub order_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub product_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub buyer_username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: TransactionStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub payment_method: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub paid_at: Option<String>,
}

impl Transaction {
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    pub fn paid_at_time(&self) -> Option<chrono::NaiveDateTime> {
        self.paid_at.as_deref().and_then(parse_timestamp)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct TransactionStats {
    pub total_transactions: i64,
    pub completed_transactions: i64,
    /// Sum of completed transaction amounts
    pub total_revenue: i64,
}

impl TransactionStats {
    /// Compute the stats the same way the backend does
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let completed = transactions.iter().filter(|t| t.is_completed());
        Self {
            total_transactions: transactions.len() as i64,
            completed_transactions: completed.clone().count() as i64,
            total_revenue: completed.map(|t| t.amount).sum(),
        }
    }
}

/// Transactions of one bot together with their summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct TransactionReport {
    pub transactions: Vec<Transaction>,
    pub stats: TransactionStats,
}
