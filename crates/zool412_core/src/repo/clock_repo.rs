//! Weekly game clock.
//!
//! # Responsibility
//! - Move the game one week forward and settle whatever became due.
//!
//! # Invariants
//! - The week bump, deliveries and completions commit together.
//! - An order is delivered at most once; effect orders are never delivered.
//! - Waits never go below zero.

use crate::model::experiment::Experiment;
use crate::model::order::Order;
use crate::repo::experiment_repo::{parse_experiment_row, EXPERIMENT_SELECT_SQL};
use crate::repo::inventory_repo::load_inventory;
use crate::repo::order_repo::{load_order, parse_order_row, ORDER_SELECT_SQL};
use crate::repo::{ensure_connection_ready, RepoResult, TableRequirements};
use log::info;
use rusqlite::{Connection, Transaction, TransactionBehavior};

const REQUIRED_TABLES: TableRequirements = &[
    ("inventory", &["current_week"]),
    (
        "orders",
        &["key", "article", "wait_weeks", "is_effect", "is_delivered"],
    ),
    ("experiments", &["id", "wait_weeks", "is_complete", "is_failed"]),
];

/// What happened when the clock moved.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekReport {
    /// The new current week.
    pub week: u32,
    pub delivered: Vec<Order>,
    pub completed: Vec<Experiment>,
}

pub trait ClockRepository {
    fn advance_week(&self) -> RepoResult<WeekReport>;
}

pub struct SqliteClockRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteClockRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ClockRepository for SqliteClockRepository<'_> {
    fn advance_week(&self) -> RepoResult<WeekReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inventory = load_inventory(&tx)?;
        let week = inventory.current_week + 1;
        tx.execute("UPDATE inventory SET current_week = ?1;", [week])?;

        let delivered = deliver_due_orders(&tx)?;
        let completed = complete_due_experiments(&tx)?;
        tx.commit()?;

        info!(
            "event=week_advanced module=repo status=ok week={} delivered={} completed={}",
            week,
            delivered.len(),
            completed.len()
        );
        Ok(WeekReport {
            week,
            delivered,
            completed,
        })
    }
}

fn deliver_due_orders(conn: &Connection) -> RepoResult<Vec<Order>> {
    conn.execute(
        "UPDATE orders
         SET wait_weeks = MAX(wait_weeks - 1, 0)
         WHERE is_effect = 0 AND is_delivered = 0;",
        [],
    )?;

    let due = {
        let mut stmt = conn.prepare(&format!(
            "{ORDER_SELECT_SQL}
             WHERE is_effect = 0 AND is_delivered = 0 AND wait_weeks = 0
             ORDER BY key ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut due = Vec::new();
        while let Some(row) = rows.next()? {
            due.push(parse_order_row(row)?);
        }
        due
    };

    let mut delivered = Vec::with_capacity(due.len());
    for order in due {
        let column = order.article.inventory_column();
        conn.execute(
            &format!("UPDATE inventory SET {column} = {column} + 1;"),
            [],
        )?;
        conn.execute(
            "UPDATE orders SET is_delivered = 1 WHERE key = ?1;",
            [order.key],
        )?;
        delivered.push(load_order(conn, order.key)?);
    }
    Ok(delivered)
}

fn complete_due_experiments(conn: &Connection) -> RepoResult<Vec<Experiment>> {
    conn.execute(
        "UPDATE experiments
         SET wait_weeks = MAX(wait_weeks - 1, 0)
         WHERE is_complete = 0 AND is_failed = 0;",
        [],
    )?;

    let due_ids = {
        let mut stmt = conn.prepare(
            "SELECT id FROM experiments
             WHERE is_complete = 0 AND is_failed = 0 AND wait_weeks = 0
             ORDER BY id ASC;",
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids
    };

    let mut completed = Vec::with_capacity(due_ids.len());
    let mut stmt = conn.prepare(&format!("{EXPERIMENT_SELECT_SQL} WHERE id = ?1;"))?;
    for id in due_ids {
        conn.execute("UPDATE experiments SET is_complete = 1 WHERE id = ?1;", [id])?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            completed.push(parse_experiment_row(row)?);
        }
    }
    Ok(completed)
}
