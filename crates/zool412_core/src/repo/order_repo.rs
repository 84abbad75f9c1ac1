//! Order repository: purchases and juice effects.
//!
//! # Responsibility
//! - Charge and record purchases that are delivered by the weekly clock.
//! - Apply juice doses immediately and keep an effect record of each.
//!
//! # Invariants
//! - Credits are checked before anything is written.
//! - Every committed order has exactly one ledger row.

use crate::model::inventory::ResourceDraw;
use crate::model::ledger::{LedgerActionType, NewLedgerEntry};
use crate::model::order::{
    JuiceApplication, NewOrder, Order, OrderKey, OrderListQuery, JUICE_EVENT_TYPE,
};
use crate::model::resources::{AcquisitionType, Article, TechAssistant};
use crate::repo::inventory_repo::{adjust_shifts, commit_draw, load_inventory};
use crate::repo::{
    ensure_connection_ready, ensure_user_exists, insert_ledger_entry, int_to_week, now_stamp,
    parse_optional_text, parse_text, RepoError, RepoResult, TableRequirements,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

pub(crate) const ORDER_SELECT_SQL: &str = "SELECT
    key,
    user_id,
    date,
    time,
    article,
    value,
    wait_weeks,
    acquisition_type,
    placed_week,
    is_effect,
    inventory_field,
    event_type,
    is_delivered
FROM orders";

const REQUIRED_TABLES: TableRequirements = &[
    (
        "orders",
        &[
            "key",
            "user_id",
            "article",
            "value",
            "wait_weeks",
            "acquisition_type",
            "placed_week",
            "is_effect",
            "inventory_field",
            "event_type",
            "is_delivered",
        ],
    ),
    ("inventory", &["credits", "juice", "current_week"]),
    ("users", &["key"]),
    ("user_ledger", &["user_id", "action_type", "cost_chuan"]),
];

pub trait OrderRepository {
    /// Charges `order.value` and records a pending delivery.
    fn place_order(&self, order: &NewOrder) -> RepoResult<Order>;
    /// Consumes one juice and credits the shift bonus to the assistant.
    ///
    /// The weekly allowance and the juice stock are checked in the same
    /// transaction as the write.
    fn record_juice(&self, application: &JuiceApplication) -> RepoResult<Order>;
    /// Juice doses given to `ta` during game week `week`.
    fn juice_count_in_week(&self, ta: TechAssistant, week: u32) -> RepoResult<u32>;
    /// Oldest first.
    fn list_orders(&self, query: &OrderListQuery) -> RepoResult<Vec<Order>>;
}

pub struct SqliteOrderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrderRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl OrderRepository for SqliteOrderRepository<'_> {
    fn place_order(&self, order: &NewOrder) -> RepoResult<Order> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_user_exists(&tx, order.user_id)?;
        let inventory = load_inventory(&tx)?;

        commit_draw(
            &tx,
            &inventory,
            &ResourceDraw {
                credits: order.value,
                ..ResourceDraw::default()
            },
        )?;

        let (date, time) = now_stamp();
        tx.execute(
            "INSERT INTO orders (
                user_id,
                date,
                time,
                article,
                value,
                wait_weeks,
                acquisition_type,
                placed_week,
                is_effect,
                inventory_field,
                event_type,
                is_delivered
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, NULL, 0);",
            params![
                order.user_id,
                date,
                time,
                order.article.as_str(),
                order.value,
                order.wait_weeks,
                order.acquisition_type.as_str(),
                inventory.current_week,
                order.article.inventory_column(),
            ],
        )?;
        let key = tx.last_insert_rowid();

        insert_ledger_entry(
            &tx,
            &NewLedgerEntry {
                user_id: order.user_id,
                action_type: LedgerActionType::Order,
                action_label: Some(order.article.as_str().to_string()),
                cost_chuan: order.value,
                cartridge_used: None,
            },
            inventory.current_week,
        )?;
        let placed = load_order(&tx, key)?;
        tx.commit()?;

        info!(
            "event=order_placed module=repo status=ok order_key={} article={} wait_weeks={}",
            key, order.article, order.wait_weeks
        );
        Ok(placed)
    }

    fn record_juice(&self, application: &JuiceApplication) -> RepoResult<Order> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_user_exists(&tx, application.user_id)?;
        let inventory = load_inventory(&tx)?;
        let week = inventory.current_week;
        if juice_doses_in_week(&tx, application.ta, week)? >= application.doses_per_week {
            return Err(RepoError::JuiceLimitReached {
                ta: application.ta,
                week,
            });
        }
        if inventory.juice < 1 {
            return Err(RepoError::NoJuiceLeft);
        }

        commit_draw(
            &tx,
            &inventory,
            &ResourceDraw {
                article: Some(Article::Juice),
                ..ResourceDraw::default()
            },
        )?;
        adjust_shifts(&tx, application.ta, application.shift_bonus)?;

        let (date, time) = now_stamp();
        tx.execute(
            "INSERT INTO orders (
                user_id,
                date,
                time,
                article,
                value,
                wait_weeks,
                acquisition_type,
                placed_week,
                is_effect,
                inventory_field,
                event_type,
                is_delivered
            ) VALUES (?1, ?2, ?3, ?4, 0, 0, NULL, ?5, 1, ?6, ?7, 1);",
            params![
                application.user_id,
                date,
                time,
                Article::Juice.as_str(),
                inventory.current_week,
                application.ta.shift_column(),
                JUICE_EVENT_TYPE,
            ],
        )?;
        let key = tx.last_insert_rowid();

        insert_ledger_entry(
            &tx,
            &NewLedgerEntry {
                user_id: application.user_id,
                action_type: LedgerActionType::Juice,
                action_label: Some(application.ta.shift_column().to_string()),
                cost_chuan: 0.0,
                cartridge_used: None,
            },
            inventory.current_week,
        )?;
        let recorded = load_order(&tx, key)?;
        tx.commit()?;

        info!(
            "event=juice_applied module=repo status=ok ta={} shift_bonus={}",
            application.ta, application.shift_bonus
        );
        Ok(recorded)
    }

    fn juice_count_in_week(&self, ta: TechAssistant, week: u32) -> RepoResult<u32> {
        juice_doses_in_week(self.conn, ta, week)
    }

    fn list_orders(&self, query: &OrderListQuery) -> RepoResult<Vec<Order>> {
        let mut sql = format!("{ORDER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Integer(user_id));
        }
        if query.pending_only {
            sql.push_str(" AND is_effect = 0 AND is_delivered = 0");
        }
        sql.push_str(" ORDER BY key ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut orders = Vec::new();
        while let Some(row) = rows.next()? {
            orders.push(parse_order_row(row)?);
        }
        Ok(orders)
    }
}

fn juice_doses_in_week(conn: &Connection, ta: TechAssistant, week: u32) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*)
         FROM orders
         WHERE is_effect = 1
           AND event_type = ?1
           AND inventory_field = ?2
           AND placed_week = ?3;",
        params![JUICE_EVENT_TYPE, ta.shift_column(), week],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(crate) fn load_order(conn: &Connection, key: OrderKey) -> RepoResult<Order> {
    let mut stmt = conn.prepare(&format!("{ORDER_SELECT_SQL} WHERE key = ?1;"))?;
    let mut rows = stmt.query([key])?;
    match rows.next()? {
        Some(row) => parse_order_row(row),
        None => Err(RepoError::NotFound { entity: "order", id: key }),
    }
}

pub(crate) fn parse_order_row(row: &Row<'_>) -> RepoResult<Order> {
    let article: String = row.get("article")?;
    let is_effect: i64 = row.get("is_effect")?;
    let is_delivered: i64 = row.get("is_delivered")?;
    Ok(Order {
        key: row.get("key")?,
        user_id: row.get("user_id")?,
        date: row.get("date")?,
        time: row.get("time")?,
        article: parse_text("orders.article", &article, Article::parse)?,
        value: row.get("value")?,
        wait_weeks: int_to_week("orders.wait_weeks", row.get("wait_weeks")?)?,
        acquisition_type: parse_optional_text(
            "orders.acquisition_type",
            row.get("acquisition_type")?,
            AcquisitionType::parse,
        )?,
        placed_week: int_to_week("orders.placed_week", row.get("placed_week")?)?,
        is_effect: is_effect != 0,
        inventory_field: row.get("inventory_field")?,
        event_type: row.get("event_type")?,
        is_delivered: is_delivered != 0,
    })
}
