//! Core domain logic for the ZOOL412 autostation lab.
//! This crate is the single source of truth for game rules and storage.

#[macro_use]
mod macros;

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod station;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, reset_db, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::inventory::{Inventory, ResourceDraw, Shortfall};
pub use repo::{RepoError, RepoResult};
pub use station::{BookingPlan, BookingRequest, PlanError, StationKind};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
