//! User records.
//!
//! The users table is a development placeholder; identity and
//! authentication live outside this backend.

use serde::{Deserialize, Serialize};

/// Primary key of `users`.
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub key: UserId,
    pub last_name: String,
    pub first_name: String,
    pub team: Option<String>,
}

/// Insert payload for a new user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub last_name: String,
    pub first_name: String,
    pub team: Option<String>,
}

impl NewUser {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        team: Option<&str>,
    ) -> Self {
        Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
            team: team.map(str::to_string),
        }
    }
}
