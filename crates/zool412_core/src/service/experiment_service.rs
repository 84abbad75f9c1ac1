//! Experiment booking use-cases.
//!
//! # Responsibility
//! - Turn a submitted form into a priced plan and show what it would cost.
//! - Commit confirmed bookings through the experiment repository.
//!
//! # Invariants
//! - `quote` never writes.
//! - Validation and name checks run before any resource is drawn.

use crate::model::experiment::{
    Experiment, ExperimentDetail, ExperimentId, ExperimentListQuery, ExperimentRecord,
};
use crate::model::inventory::{describe_shortfalls, Shortfall};
use crate::model::user::UserId;
use crate::repo::{ExperimentRepository, InventoryRepository, RepoError};
use crate::station::{BookingPlan, BookingRequest, PlanError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ExperimentServiceError {
    /// Form failed validation.
    Plan(PlanError),
    InsufficientResources(Vec<Shortfall>),
    DuplicateObjectName(String),
    UserNotFound(UserId),
    ExperimentNotFound(ExperimentId),
    Repo(RepoError),
}

impl Display for ExperimentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan(err) => write!(f, "invalid form: {err}"),
            Self::InsufficientResources(missing) => {
                write!(f, "insufficient resources: {}", describe_shortfalls(missing))
            }
            Self::DuplicateObjectName(name) => {
                write!(f, "an object named `{name}` has already been fabricated")
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::ExperimentNotFound(id) => write!(f, "experiment not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExperimentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Plan(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlanError> for ExperimentServiceError {
    fn from(value: PlanError) -> Self {
        Self::Plan(value)
    }
}

impl From<RepoError> for ExperimentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InsufficientResources(missing) => Self::InsufficientResources(missing),
            RepoError::DuplicateObjectName(name) => Self::DuplicateObjectName(name),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Dry-run result shown before a booking is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingQuote {
    pub plan: BookingPlan,
    /// Empty when the current inventory covers the plan.
    pub shortfalls: Vec<Shortfall>,
}

impl BookingQuote {
    pub fn is_affordable(&self) -> bool {
        self.shortfalls.is_empty()
    }
}

pub struct ExperimentService<E, I>
where
    E: ExperimentRepository,
    I: InventoryRepository,
{
    experiments: E,
    inventory: I,
}

impl<E, I> ExperimentService<E, I>
where
    E: ExperimentRepository,
    I: InventoryRepository,
{
    pub fn new(experiments: E, inventory: I) -> Self {
        Self {
            experiments,
            inventory,
        }
    }

    /// Validates and prices `request` against the current inventory.
    pub fn quote(&self, request: &BookingRequest) -> Result<BookingQuote, ExperimentServiceError> {
        let plan = request.plan()?;
        self.ensure_unique_object(&plan)?;
        let shortfalls = self.inventory.get()?.shortfalls(&plan.draw);
        Ok(BookingQuote { plan, shortfalls })
    }

    /// Validates, prices and commits `request` for `user_id`.
    pub fn book(
        &self,
        user_id: UserId,
        request: &BookingRequest,
    ) -> Result<ExperimentRecord, ExperimentServiceError> {
        let plan = request.plan().map_err(|err| {
            warn!(
                "event=booking_rejected module=service status=error station={} reason=\"{}\"",
                request.kind(),
                err
            );
            ExperimentServiceError::from(err)
        })?;
        self.ensure_unique_object(&plan)?;

        let record = self.experiments.book(user_id, &plan)?;
        info!(
            "event=booking_committed module=service status=ok station={} experiment_id={} wait_weeks={}",
            request.kind(),
            record.experiment.id,
            record.experiment.wait_weeks
        );
        Ok(record)
    }

    pub fn get(&self, id: ExperimentId) -> Result<ExperimentRecord, ExperimentServiceError> {
        self.experiments
            .get_experiment(id)?
            .ok_or(ExperimentServiceError::ExperimentNotFound(id))
    }

    pub fn list(
        &self,
        query: &ExperimentListQuery,
    ) -> Result<Vec<Experiment>, ExperimentServiceError> {
        Ok(self.experiments.list_experiments(query)?)
    }

    fn ensure_unique_object(&self, plan: &BookingPlan) -> Result<(), ExperimentServiceError> {
        if let ExperimentDetail::Polykiln(detail) = &plan.detail {
            if self.experiments.polykiln_object_exists(&detail.object_name)? {
                return Err(ExperimentServiceError::DuplicateObjectName(
                    detail.object_name.clone(),
                ));
            }
        }
        Ok(())
    }
}
