//! Order records.
//!
//! # Responsibility
//! - Describe purchases that arrive after a wait, and instant effect records
//!   (juice) that share the same ledger trail.
//!
//! # Invariants
//! - Effect orders (`is_effect`) are never delivered by the weekly clock.
//! - `is_delivered` flips once; a delivered order is never re-applied.

use crate::model::resources::{AcquisitionType, Article, TechAssistant};
use crate::model::user::UserId;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Primary key of `orders`.
pub type OrderKey = i64;

/// Event label stored on juice effect orders.
pub const JUICE_EVENT_TYPE: &str = "juice";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub key: OrderKey,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub article: Article,
    /// Price paid in chuan.
    pub value: f64,
    /// Weeks left until delivery.
    pub wait_weeks: u32,
    pub acquisition_type: Option<AcquisitionType>,
    pub placed_week: u32,
    pub is_effect: bool,
    /// Inventory column an effect applied to (e.g. `ta_saltos_shifts`).
    pub inventory_field: Option<String>,
    pub event_type: Option<String>,
    pub is_delivered: bool,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        !self.is_effect && !self.is_delivered
    }
}

/// Purchase request after pricing has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: UserId,
    pub article: Article,
    pub acquisition_type: AcquisitionType,
    pub value: f64,
    pub wait_weeks: u32,
}

/// One juice dose applied to a technical assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JuiceApplication {
    pub user_id: UserId,
    pub ta: TechAssistant,
    pub shift_bonus: i64,
    /// Doses `ta` may take per game week.
    pub doses_per_week: u32,
}

/// Filter options for listing orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderListQuery {
    pub user_id: Option<UserId>,
    pub pending_only: bool,
}
