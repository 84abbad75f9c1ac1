//! Purchasing and juice use-cases.
//!
//! # Responsibility
//! - Price orders from the catalog and acquisition type.
//! - Enforce the weekly juice limit per technical assistant.
//!
//! # Invariants
//! - Order value is `catalog price * price factor`.
//! - Order wait is `catalog wait + cooldown`.
//! - Each assistant takes at most one juice dose per game week.

use crate::model::inventory::{describe_shortfalls, Shortfall};
use crate::model::order::{JuiceApplication, NewOrder, Order, OrderListQuery};
use crate::model::resources::{AcquisitionType, Article, TechAssistant};
use crate::model::user::UserId;
use crate::repo::{CatalogRepository, OrderRepository, RepoError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shifts added to an assistant by one juice dose.
pub const JUICE_SHIFT_BONUS: i64 = 20;
const JUICE_DOSES_PER_WEEK: u32 = 1;

#[derive(Debug)]
pub enum OrderServiceError {
    /// Article has no catalog price yet.
    NotInCatalog(Article),
    InsufficientResources(Vec<Shortfall>),
    NoJuiceLeft,
    /// The assistant already had juice this week.
    AlreadyJuiced { ta: TechAssistant, week: u32 },
    UserNotFound(UserId),
    Repo(RepoError),
}

impl Display for OrderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInCatalog(article) => {
                write!(f, "{} has no catalog price", article.display_name())
            }
            Self::InsufficientResources(missing) => {
                write!(f, "insufficient resources: {}", describe_shortfalls(missing))
            }
            Self::NoJuiceLeft => write!(f, "no juice left in inventory"),
            Self::AlreadyJuiced { ta, week } => {
                write!(f, "{ta} has already been juiced in week {week}")
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for OrderServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InsufficientResources(missing) => Self::InsufficientResources(missing),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::NoJuiceLeft => Self::NoJuiceLeft,
            RepoError::JuiceLimitReached { ta, week } => Self::AlreadyJuiced { ta, week },
            other => Self::Repo(other),
        }
    }
}

pub struct OrderService<C: CatalogRepository, O: OrderRepository> {
    catalog: C,
    orders: O,
}

impl<C: CatalogRepository, O: OrderRepository> OrderService<C, O> {
    pub fn new(catalog: C, orders: O) -> Self {
        Self { catalog, orders }
    }

    /// Charges the user's purchase now; the article arrives after the wait.
    pub fn place_order(
        &self,
        user_id: UserId,
        article: Article,
        acquisition_type: AcquisitionType,
    ) -> Result<Order, OrderServiceError> {
        let item = self
            .catalog
            .get_item(article)?
            .ok_or(OrderServiceError::NotInCatalog(article))?;

        let order = NewOrder {
            user_id,
            article,
            acquisition_type,
            value: item.chuan_cost * acquisition_type.price_factor(),
            wait_weeks: item.wait_weeks + acquisition_type.cooldown_weeks(),
        };
        self.orders.place_order(&order).map_err(|err| {
            warn!(
                "event=order_rejected module=service status=error article={} reason=\"{}\"",
                article, err
            );
            err.into()
        })
    }

    /// Gives one juice dose to `ta`, adding `JUICE_SHIFT_BONUS` shifts.
    pub fn administer_juice(
        &self,
        user_id: UserId,
        ta: TechAssistant,
    ) -> Result<Order, OrderServiceError> {
        self.orders
            .record_juice(&JuiceApplication {
                user_id,
                ta,
                shift_bonus: JUICE_SHIFT_BONUS,
                doses_per_week: JUICE_DOSES_PER_WEEK,
            })
            .map_err(|err| {
                warn!(
                    "event=juice_rejected module=service status=error ta={} reason=\"{}\"",
                    ta, err
                );
                err.into()
            })
    }

    pub fn list_orders(&self, query: &OrderListQuery) -> Result<Vec<Order>, OrderServiceError> {
        Ok(self.orders.list_orders(query)?)
    }
}
