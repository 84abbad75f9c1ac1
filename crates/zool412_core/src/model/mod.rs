//! Domain model for the autostation lab backend.
//!
//! # Responsibility
//! - Define canonical records for inventory, users, orders and experiments.
//! - Keep resource vocabulary and inventory arithmetic free of SQL.
//!
//! # Invariants
//! - Exactly one inventory row describes the game state.
//! - Every enum persisted as TEXT round-trips through `as_str`/`parse`.

pub mod catalog;
pub mod experiment;
pub mod inventory;
pub mod ledger;
pub mod order;
pub mod resources;
pub mod user;
