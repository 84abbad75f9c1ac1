//! Animal hunting use-case.
//!
//! A hunt refills one species to its capacity. It costs one TA shift per
//! ten animals collected, rounded up (`hunting_shift_cost`).

use crate::model::inventory::{describe_shortfalls, Shortfall};
use crate::model::resources::AnimalSpecies;
use crate::model::user::UserId;
use crate::repo::{AnimalCollection, InventoryRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum HuntingServiceError {
    SpeciesLocked(AnimalSpecies),
    /// Nothing to collect: stock is already at capacity.
    StockFull(AnimalSpecies),
    InsufficientResources(Vec<Shortfall>),
    UserNotFound(UserId),
    Repo(RepoError),
}

impl Display for HuntingServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SpeciesLocked(species) => write!(f, "species {species} is not unlocked"),
            Self::StockFull(species) => write!(f, "{species} stock is already full"),
            Self::InsufficientResources(missing) => {
                write!(f, "insufficient resources: {}", describe_shortfalls(missing))
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HuntingServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HuntingServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InsufficientResources(missing) => Self::InsufficientResources(missing),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::SpeciesLocked(species) => Self::SpeciesLocked(species),
            RepoError::StockFull(species) => Self::StockFull(species),
            other => Self::Repo(other),
        }
    }
}

pub struct HuntingService<I: InventoryRepository> {
    inventory: I,
}

impl<I: InventoryRepository> HuntingService<I> {
    pub fn new(inventory: I) -> Self {
        Self { inventory }
    }

    pub fn collect_animals(
        &self,
        user_id: UserId,
        species: AnimalSpecies,
    ) -> Result<AnimalCollection, HuntingServiceError> {
        let collection = self
            .inventory
            .collect_animals(user_id, species)
            .map_err(|err| {
                warn!(
                    "event=hunt_rejected module=service status=error species={} reason=\"{}\"",
                    species, err
                );
                HuntingServiceError::from(err)
            })?;
        info!(
            "event=animals_collected module=service status=ok species={} collected={} shifts={}",
            species,
            collection.collected,
            collection.shifts.total()
        );
        Ok(collection)
    }
}
