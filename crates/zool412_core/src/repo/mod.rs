//! Repository layer: SQLite persistence behind use-case oriented traits.
//!
//! # Responsibility
//! - Keep SQL inside the storage boundary; services only see model types.
//! - Commit every resource-consuming action together with its ledger row.
//!
//! # Invariants
//! - Repositories refuse connections that are not migrated to the latest
//!   schema version.
//! - Multi-statement writes run in one `IMMEDIATE` transaction.
//! - Reads reject malformed persisted values instead of masking them.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::inventory::{describe_shortfalls, Shortfall};
use crate::model::ledger::NewLedgerEntry;
use crate::model::resources::{AnimalSpecies, TechAssistant};
use crate::model::user::UserId;
use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_repo;
pub mod clock_repo;
pub mod experiment_repo;
pub mod inventory_repo;
pub mod ledger_repo;
pub mod order_repo;
pub mod user_repo;

pub use catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use clock_repo::{ClockRepository, SqliteClockRepository, WeekReport};
pub use experiment_repo::{ExperimentRepository, SqliteExperimentRepository};
pub use inventory_repo::{AnimalCollection, InventoryRepository, SqliteInventoryRepository};
pub use ledger_repo::{LedgerRepository, SqliteLedgerRepository};
pub use order_repo::{OrderRepository, SqliteOrderRepository};
pub use user_repo::{SqliteUserRepository, UserRepository};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Connection schema version differs from the one this build expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
    InventoryNotInitialized,
    InventoryAlreadyInitialized,
    UserNotFound(UserId),
    NotFound { entity: &'static str, id: i64 },
    /// The draw no longer fits the inventory at commit time.
    InsufficientResources(Vec<Shortfall>),
    DuplicateObjectName(String),
    SpeciesLocked(AnimalSpecies),
    /// Hunting found nothing to collect.
    StockFull(AnimalSpecies),
    NoJuiceLeft,
    /// `ta` already took this week's juice allowance.
    JuiceLimitReached { ta: TechAssistant, week: u32 },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InventoryNotInitialized => write!(f, "inventory has not been initialized"),
            Self::InventoryAlreadyInitialized => write!(f, "inventory is already initialized"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InsufficientResources(missing) => {
                write!(f, "insufficient resources: {}", describe_shortfalls(missing))
            }
            Self::DuplicateObjectName(name) => {
                write!(f, "an object named `{name}` has already been fabricated")
            }
            Self::SpeciesLocked(species) => write!(f, "species {species} is not unlocked"),
            Self::StockFull(species) => write!(f, "{species} stock is already full"),
            Self::NoJuiceLeft => write!(f, "no juice left in inventory"),
            Self::JuiceLimitReached { ta, week } => {
                write!(f, "{ta} has already been juiced in week {week}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Tables (with their required columns) a repository depends on.
pub(crate) type TableRequirements = &'static [(&'static str, &'static [&'static str])];

pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    requirements: TableRequirements,
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in requirements {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in columns.iter() {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Local wall-clock date and time (whole seconds) stamped on new rows.
pub(crate) fn now_stamp() -> (NaiveDate, NaiveTime) {
    let now = Local::now().naive_local();
    let time = now.time();
    (now.date(), time.with_nanosecond(0).unwrap_or(time))
}

pub(crate) fn ensure_user_exists(conn: &Connection, user_id: UserId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE key = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::UserNotFound(user_id))
    }
}

pub(crate) fn insert_ledger_entry(
    conn: &Connection,
    entry: &NewLedgerEntry,
    week: u32,
) -> RepoResult<i64> {
    let (date, time) = now_stamp();
    conn.execute(
        "INSERT INTO user_ledger (
            user_id,
            action_type,
            action_label,
            date,
            time,
            week,
            cost_chuan,
            cartridge_used
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            entry.user_id,
            entry.action_type.as_str(),
            entry.action_label.as_deref(),
            date,
            time,
            week,
            entry.cost_chuan,
            entry.cartridge_used.map(|article| article.as_str()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Parses a TEXT column through a `text_enum!` parser.
pub(crate) fn parse_text<T>(
    column: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
) -> RepoResult<T> {
    parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{value}` in {column}")))
}

pub(crate) fn parse_optional_text<T>(
    column: &str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
) -> RepoResult<Option<T>> {
    value
        .map(|text| parse_text(column, &text, parse))
        .transpose()
}

pub(crate) fn int_to_week(column: &str, value: i64) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid week count `{value}` in {column}")))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
