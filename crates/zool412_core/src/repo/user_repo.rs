//! User repository.

use crate::model::user::{NewUser, User, UserId};
use crate::repo::{ensure_connection_ready, RepoResult, TableRequirements};
use rusqlite::{params, Connection, OptionalExtension, Row};

const REQUIRED_TABLES: TableRequirements =
    &[("users", &["key", "last_name", "first_name", "team"])];

pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Users ordered by key.
    fn list_users(&self) -> RepoResult<Vec<User>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (last_name, first_name, team) VALUES (?1, ?2, ?3);",
            params![
                user.last_name.as_str(),
                user.first_name.as_str(),
                user.team.as_deref()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT key, last_name, first_name, team FROM users WHERE key = ?1;",
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, last_name, first_name, team FROM users ORDER BY key ASC;")?;
        let users = stmt
            .query_map([], parse_user_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        key: row.get("key")?,
        last_name: row.get("last_name")?,
        first_name: row.get("first_name")?,
        team: row.get("team")?,
    })
}
