use serde::{Deserialize, Serialize};

use super::null_as_default;

/// Kind of Telegram bot managed by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum BotType {
    Store,
    Verification,
    PointsVerify,
    Custom,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BotType {
    pub fn display_name(&self) -> &'static str {
        match self {
            BotType::Store => "Store",
            BotType::Verification => "Verification",
            BotType::PointsVerify => "Points Verify",
            BotType::Custom => "Custom",
            BotType::Unknown => "Unknown",
        }
    }
}

/// A bot registered by the current user.
///
/// Counter fields depend on the bot type; the backend omits the ones that
/// do not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct Bot {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bot_username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bot_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bot_type: BotType,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transactions_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifications_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_balance: Option<i64>,
}

impl Bot {
    /// Telegram handle, e.g. `@my_store_bot`
    pub fn handle(&self) -> String {
        format!("@{}", self.bot_username)
    }

    pub fn status_display(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }
}

/// Per-type bot counts shown on the dashboard overview
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct BotStats {
    pub total_bots: usize,
    pub store_bots: usize,
    pub verification_bots: usize,
    pub points_verify_bots: usize,
}

impl BotStats {
    pub fn from_bots(bots: &[Bot]) -> Self {
        let count = |kind: BotType| bots.iter().filter(|b| b.bot_type == kind).count();
        Self {
            total_bots: bots.len(),
            store_bots: count(BotType::Store),
            verification_bots: count(BotType::Verification),
            points_verify_bots: count(BotType::PointsVerify),
        }
    }
}
