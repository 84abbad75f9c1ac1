//! Ledger repository (read side).
//!
//! Rows are written by the repositories that commit the underlying action.

use crate::model::ledger::{LedgerActionType, LedgerEntry, LedgerQuery};
use crate::model::resources::Article;
use crate::model::user::UserId;
use crate::repo::{
    ensure_connection_ready, int_to_week, parse_optional_text, parse_text, RepoResult,
    TableRequirements,
};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

const LEDGER_DEFAULT_LIMIT: u32 = 50;
const LEDGER_LIMIT_MAX: u32 = 500;

const REQUIRED_TABLES: TableRequirements = &[(
    "user_ledger",
    &[
        "id",
        "user_id",
        "action_type",
        "action_label",
        "date",
        "time",
        "week",
        "cost_chuan",
        "cartridge_used",
    ],
)];

pub trait LedgerRepository {
    /// Newest first. `limit` defaults to 50 and clamps to 500.
    fn list_entries(&self, query: &LedgerQuery) -> RepoResult<Vec<LedgerEntry>>;
    /// Sum of `cost_chuan` over every entry of `user_id`.
    fn total_spent(&self, user_id: UserId) -> RepoResult<f64>;
}

pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn list_entries(&self, query: &LedgerQuery) -> RepoResult<Vec<LedgerEntry>> {
        let mut sql = String::from(
            "SELECT
                id,
                user_id,
                action_type,
                action_label,
                date,
                time,
                week,
                cost_chuan,
                cartridge_used
             FROM user_ledger
             WHERE 1 = 1",
        );
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(user_id) = query.user_id {
            sql.push_str(" AND user_id = ?");
            bind_values.push(Value::Integer(user_id));
        }
        if let Some(action_type) = query.action_type {
            sql.push_str(" AND action_type = ?");
            bind_values.push(Value::Text(action_type.as_str().to_string()));
        }

        sql.push_str(" ORDER BY id DESC LIMIT ?");
        let limit = query
            .limit
            .unwrap_or(LEDGER_DEFAULT_LIMIT)
            .clamp(1, LEDGER_LIMIT_MAX);
        bind_values.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_ledger_row(row)?);
        }
        Ok(entries)
    }

    fn total_spent(&self, user_id: UserId) -> RepoResult<f64> {
        let total: f64 = self.conn.query_row(
            "SELECT COALESCE(SUM(cost_chuan), 0.0) FROM user_ledger WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

fn parse_ledger_row(row: &Row<'_>) -> RepoResult<LedgerEntry> {
    let action_type: String = row.get("action_type")?;
    Ok(LedgerEntry {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        action_type: parse_text(
            "user_ledger.action_type",
            &action_type,
            LedgerActionType::parse,
        )?,
        action_label: row.get("action_label")?,
        date: row.get("date")?,
        time: row.get("time")?,
        week: int_to_week("user_ledger.week", row.get("week")?)?,
        cost_chuan: row.get("cost_chuan")?,
        cartridge_used: parse_optional_text(
            "user_ledger.cartridge_used",
            row.get("cartridge_used")?,
            Article::parse,
        )?,
    })
}
