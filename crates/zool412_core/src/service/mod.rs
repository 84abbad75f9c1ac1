//! Game use-case services.
//!
//! # Responsibility
//! - Apply game rules (pricing, weekly limits, hunting) above repositories.
//! - Keep the CLI decoupled from storage details.
//!
//! # Invariants
//! - Services are generic over repository traits and never issue SQL.

pub mod admin_service;
pub mod clock_service;
pub mod experiment_service;
pub mod hunting_service;
pub mod order_service;

pub use admin_service::{default_catalog, AdminService};
pub use clock_service::ClockService;
pub use experiment_service::{BookingQuote, ExperimentService, ExperimentServiceError};
pub use hunting_service::{HuntingService, HuntingServiceError};
pub use order_service::{OrderService, OrderServiceError, JUICE_SHIFT_BONUS};
