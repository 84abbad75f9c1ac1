//! Game administration: seeding and unlocking.
//!
//! # Responsibility
//! - Create the starting inventory, the priced catalog and test users.
//! - Change species capacity.

use crate::model::catalog::CatalogItem;
use crate::model::inventory::Inventory;
use crate::model::resources::{AnimalSpecies, Article};
use crate::model::user::{NewUser, UserId};
use crate::repo::{CatalogRepository, InventoryRepository, RepoResult, UserRepository};
use log::info;

const CATALOG_PRICES: &[(Article, f64)] = &[
    (Article::XattyCartridge, 50_000.0),
    (Article::ZeropointCartridge, 80_000.0),
    (Article::NcPk1Cartridge, 60_000.0),
    (Article::SmartFilamentSCartridge, 20_000.0),
    (Article::SmartFilamentMCartridge, 30_000.0),
    (Article::SmartFilamentLCartridge, 45_000.0),
    (Article::MamrReelCartridge, 25_000.0),
    (Article::DupontCartridge, 70_000.0),
    (Article::Juice, 15_000.0),
];

const TEST_USERS: &[(&str, &str, &str)] = &[
    ("Ada", "Sterling", "Alpha"),
    ("Boris", "Kettle", "Beta"),
    ("Chiara", "Voss", "Gamma"),
];

/// Catalog seeded by `initialize_item_catalog`. Base waits are all zero.
pub fn default_catalog() -> Vec<CatalogItem> {
    CATALOG_PRICES
        .iter()
        .map(|(article, price)| CatalogItem::new(*article, *price, 0))
        .collect()
}

pub struct AdminService<I, C, U>
where
    I: InventoryRepository,
    C: CatalogRepository,
    U: UserRepository,
{
    inventory: I,
    catalog: C,
    users: U,
}

impl<I, C, U> AdminService<I, C, U>
where
    I: InventoryRepository,
    C: CatalogRepository,
    U: UserRepository,
{
    pub fn new(inventory: I, catalog: C, users: U) -> Self {
        Self {
            inventory,
            catalog,
            users,
        }
    }

    /// Writes the starting inventory. Fails if the game already has one.
    pub fn initialize_inventory(&self) -> RepoResult<Inventory> {
        self.inventory.initialize(&Inventory::starting())?;
        info!("event=inventory_initialized module=service status=ok");
        self.inventory.get()
    }

    /// Upserts every default price; safe to run repeatedly.
    pub fn initialize_item_catalog(&self) -> RepoResult<Vec<CatalogItem>> {
        for item in default_catalog() {
            self.catalog.upsert_item(&item)?;
        }
        let items = self.catalog.list_items()?;
        info!(
            "event=catalog_seeded module=service status=ok items={}",
            items.len()
        );
        Ok(items)
    }

    /// Creates the three test users when no user exists yet.
    ///
    /// Returns the ids created by this call.
    pub fn create_test_users(&self) -> RepoResult<Vec<UserId>> {
        if !self.users.list_users()?.is_empty() {
            return Ok(Vec::new());
        }

        let mut created = Vec::with_capacity(TEST_USERS.len());
        for (first_name, last_name, team) in TEST_USERS {
            created.push(
                self.users
                    .create_user(&NewUser::new(*first_name, *last_name, Some(*team)))?,
            );
        }
        info!(
            "event=test_users_created module=service status=ok count={}",
            created.len()
        );
        Ok(created)
    }

    /// Sets capacity and fills the stock. A negative `max` locks the species.
    pub fn unlock_species(&self, species: AnimalSpecies, max: i64) -> RepoResult<Inventory> {
        self.inventory.set_species_capacity(species, max)
    }

    pub fn inventory(&self) -> RepoResult<Inventory> {
        self.inventory.get()
    }
}
