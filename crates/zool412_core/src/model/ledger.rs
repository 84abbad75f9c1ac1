//! General ledger of every action that costs money or consumes resources.

use crate::model::resources::Article;
use crate::model::user::UserId;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Kind of action recorded in the ledger.
    pub enum LedgerActionType {
        Order => "Order",
        Experiment => "Experiment",
        Juice => "Juice",
        Hunting => "Hunting",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: UserId,
    pub action_type: LedgerActionType,
    /// Short reference, e.g. article key or experiment type.
    pub action_label: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub week: u32,
    pub cost_chuan: f64,
    pub cartridge_used: Option<Article>,
}

/// Ledger row written alongside a committed action.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub user_id: UserId,
    pub action_type: LedgerActionType,
    pub action_label: Option<String>,
    pub cost_chuan: f64,
    pub cartridge_used: Option<Article>,
}

/// Filter options for listing ledger entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerQuery {
    pub user_id: Option<UserId>,
    pub action_type: Option<LedgerActionType>,
    pub limit: Option<u32>,
}
