//! Schema steps for the game database.
//!
//! Each step is a SQL script bundled into the binary. The highest applied
//! step is stored in `PRAGMA user_version`, and every pending step runs in
//! one transaction so a half-migrated file is never left behind.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by `version`, starting at 1 with no gaps.
const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "game_state",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "autostation_experiments",
        sql: include_str!("0002_experiments.sql"),
    },
];

pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

fn pending_steps(applied: u32) -> impl Iterator<Item = &'static SchemaStep> {
    SCHEMA_STEPS.iter().filter(move |step| step.version > applied)
}

/// Brings `conn` up to [`latest_version`].
///
/// A database already at the latest version is left untouched; one from a
/// newer build is rejected with [`DbError::UnsupportedSchemaVersion`].
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let applied = current_user_version(conn)?;
    let latest = latest_version();
    if applied > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: applied,
            latest_supported: latest,
        });
    }
    if applied == latest {
        debug!("event=db_migrate module=db status=skip version={applied}");
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending_steps(applied) {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={applied} to_version={latest}");
    Ok(())
}

pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}
