//! Inventory repository: the single game-state row.
//!
//! # Responsibility
//! - Create, read and adjust the inventory row.
//! - Apply resource draws inside callers' transactions.
//!
//! # Invariants
//! - At most one inventory row exists; reads use the lowest id.
//! - `commit_draw` never leaves a negative credit, shift or cartridge count
//!   behind: it re-checks shortfalls first.
//! - Hunting decides lock state, stock and cost on the row it locks.

use crate::model::inventory::{hunting_shift_cost, Inventory, ResourceDraw, ShiftAllocation};
use crate::model::ledger::{LedgerActionType, NewLedgerEntry};
use crate::model::resources::{AnimalSpecies, TechAssistant};
use crate::model::user::UserId;
use crate::repo::{
    ensure_connection_ready, ensure_user_exists, insert_ledger_entry, int_to_week, RepoError,
    RepoResult, TableRequirements,
};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const INVENTORY_SELECT_SQL: &str = "SELECT
    credits,
    ta_saltos_shifts,
    ta_nitro_shifts,
    ta_helene_shifts,
    ta_carnival_shifts,
    juice,
    animals_51u6_max,
    animals_51u6_m_max,
    animals_c248_s_max,
    animals_c248_l_max,
    animals_51u6_available,
    animals_51u6_m_available,
    animals_c248_s_available,
    animals_c248_l_available,
    xatty_cartridge,
    zeropoint_cartridge,
    nc_pk1_cartridge,
    smart_filament_s_cartridge,
    smart_filament_m_cartridge,
    smart_filament_l_cartridge,
    mamr_reel_cartridge,
    dupont_cartridge,
    current_week
FROM inventory
ORDER BY id ASC
LIMIT 1";

const REQUIRED_TABLES: TableRequirements = &[
    (
        "inventory",
        &["id", "credits", "juice", "mamr_reel_cartridge", "current_week"],
    ),
    ("users", &["key"]),
    ("user_ledger", &["user_id", "action_type", "cost_chuan"]),
];

/// Subjects gathered by one hunting trip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimalCollection {
    pub species: AnimalSpecies,
    pub collected: i64,
    pub shifts: ShiftAllocation,
    pub inventory_after: Inventory,
}

pub trait InventoryRepository {
    /// Inserts the inventory row; fails when one already exists.
    fn initialize(&self, inventory: &Inventory) -> RepoResult<()>;
    fn get(&self) -> RepoResult<Inventory>;
    /// Sets capacity and refills to it; a negative `max` locks the species.
    fn set_species_capacity(&self, species: AnimalSpecies, max: i64) -> RepoResult<Inventory>;
    /// Refills `species` to capacity, spending one shift per ten animals.
    fn collect_animals(
        &self,
        user_id: UserId,
        species: AnimalSpecies,
    ) -> RepoResult<AnimalCollection>;
}

pub struct SqliteInventoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteInventoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl InventoryRepository for SqliteInventoryRepository<'_> {
    fn initialize(&self, inventory: &Inventory) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if find_inventory(&tx)?.is_some() {
            return Err(RepoError::InventoryAlreadyInitialized);
        }

        tx.execute(
            "INSERT INTO inventory (
                credits,
                ta_saltos_shifts,
                ta_nitro_shifts,
                ta_helene_shifts,
                ta_carnival_shifts,
                juice,
                animals_51u6_max,
                animals_51u6_m_max,
                animals_c248_s_max,
                animals_c248_l_max,
                animals_51u6_available,
                animals_51u6_m_available,
                animals_c248_s_available,
                animals_c248_l_available,
                xatty_cartridge,
                zeropoint_cartridge,
                nc_pk1_cartridge,
                smart_filament_s_cartridge,
                smart_filament_m_cartridge,
                smart_filament_l_cartridge,
                mamr_reel_cartridge,
                dupont_cartridge,
                current_week
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23
            );",
            params![
                inventory.credits,
                inventory.ta_saltos_shifts,
                inventory.ta_nitro_shifts,
                inventory.ta_helene_shifts,
                inventory.ta_carnival_shifts,
                inventory.juice,
                inventory.animals_51u6_max,
                inventory.animals_51u6_m_max,
                inventory.animals_c248_s_max,
                inventory.animals_c248_l_max,
                inventory.animals_51u6_available,
                inventory.animals_51u6_m_available,
                inventory.animals_c248_s_available,
                inventory.animals_c248_l_available,
                inventory.xatty_cartridge,
                inventory.zeropoint_cartridge,
                inventory.nc_pk1_cartridge,
                inventory.smart_filament_s_cartridge,
                inventory.smart_filament_m_cartridge,
                inventory.smart_filament_l_cartridge,
                inventory.mamr_reel_cartridge,
                inventory.dupont_cartridge,
                inventory.current_week,
            ],
        )?;
        tx.commit()?;

        info!("event=inventory_init module=repo status=ok");
        Ok(())
    }

    fn get(&self) -> RepoResult<Inventory> {
        load_inventory(self.conn)
    }

    fn set_species_capacity(&self, species: AnimalSpecies, max: i64) -> RepoResult<Inventory> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        load_inventory(&tx)?;

        let max = max.max(-1);
        tx.execute(
            &format!(
                "UPDATE inventory SET {} = ?1, {} = ?1;",
                species.max_column(),
                species.available_column()
            ),
            [max],
        )?;
        let updated = load_inventory(&tx)?;
        tx.commit()?;

        info!(
            "event=species_capacity module=repo status=ok species={} max={}",
            species, max
        );
        Ok(updated)
    }

    fn collect_animals(
        &self,
        user_id: UserId,
        species: AnimalSpecies,
    ) -> RepoResult<AnimalCollection> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_user_exists(&tx, user_id)?;
        let inventory = load_inventory(&tx)?;
        let stock = inventory.animal_stock(species);
        if stock.is_locked() {
            return Err(RepoError::SpeciesLocked(species));
        }
        let collected = stock.missing();
        if collected == 0 {
            return Err(RepoError::StockFull(species));
        }

        let draw = ResourceDraw {
            shifts: hunting_shift_cost(collected),
            ..ResourceDraw::default()
        };
        let shifts = commit_draw(&tx, &inventory, &draw)?;
        tx.execute(
            &format!(
                "UPDATE inventory SET {} = {};",
                species.available_column(),
                species.max_column()
            ),
            [],
        )?;
        insert_ledger_entry(
            &tx,
            &NewLedgerEntry {
                user_id,
                action_type: LedgerActionType::Hunting,
                action_label: Some(species.as_str().to_string()),
                cost_chuan: 0.0,
                cartridge_used: None,
            },
            inventory.current_week,
        )?;
        let inventory_after = load_inventory(&tx)?;
        tx.commit()?;

        Ok(AnimalCollection {
            species,
            collected,
            shifts,
            inventory_after,
        })
    }
}

pub(crate) fn find_inventory(conn: &Connection) -> RepoResult<Option<Inventory>> {
    conn.query_row(INVENTORY_SELECT_SQL, [], |row| Ok(parse_inventory_row(row)))
        .optional()?
        .transpose()
}

pub(crate) fn load_inventory(conn: &Connection) -> RepoResult<Inventory> {
    find_inventory(conn)?.ok_or(RepoError::InventoryNotInitialized)
}

/// Takes `draw` out of the inventory row.
///
/// Callers own the surrounding transaction.
pub(crate) fn commit_draw(
    conn: &Connection,
    inventory: &Inventory,
    draw: &ResourceDraw,
) -> RepoResult<ShiftAllocation> {
    let missing = inventory.shortfalls(draw);
    if !missing.is_empty() {
        return Err(RepoError::InsufficientResources(missing));
    }
    let allocation = inventory.allocate_shifts(draw.shifts).ok_or_else(|| {
        RepoError::InsufficientResources(inventory.shortfalls(&ResourceDraw {
            shifts: draw.shifts,
            ..ResourceDraw::default()
        }))
    })?;

    if draw.credits > 0.0 {
        conn.execute(
            "UPDATE inventory SET credits = credits - ?1;",
            [draw.credits],
        )?;
    }
    for (ta, used) in &allocation.draws {
        adjust_shifts(conn, *ta, -used)?;
    }
    if let Some(article) = draw.article {
        let column = article.inventory_column();
        conn.execute(
            &format!("UPDATE inventory SET {column} = {column} - 1;"),
            [],
        )?;
    }

    Ok(allocation)
}

pub(crate) fn adjust_shifts(conn: &Connection, ta: TechAssistant, delta: i64) -> RepoResult<()> {
    let column = ta.shift_column();
    conn.execute(
        &format!("UPDATE inventory SET {column} = {column} + ?1;"),
        [delta],
    )?;
    Ok(())
}

fn parse_inventory_row(row: &Row<'_>) -> RepoResult<Inventory> {
    Ok(Inventory {
        credits: row.get("credits")?,
        ta_saltos_shifts: row.get("ta_saltos_shifts")?,
        ta_nitro_shifts: row.get("ta_nitro_shifts")?,
        ta_helene_shifts: row.get("ta_helene_shifts")?,
        ta_carnival_shifts: row.get("ta_carnival_shifts")?,
        juice: row.get("juice")?,
        animals_51u6_max: row.get("animals_51u6_max")?,
        animals_51u6_m_max: row.get("animals_51u6_m_max")?,
        animals_c248_s_max: row.get("animals_c248_s_max")?,
        animals_c248_l_max: row.get("animals_c248_l_max")?,
        animals_51u6_available: row.get("animals_51u6_available")?,
        animals_51u6_m_available: row.get("animals_51u6_m_available")?,
        animals_c248_s_available: row.get("animals_c248_s_available")?,
        animals_c248_l_available: row.get("animals_c248_l_available")?,
        xatty_cartridge: row.get("xatty_cartridge")?,
        zeropoint_cartridge: row.get("zeropoint_cartridge")?,
        nc_pk1_cartridge: row.get("nc_pk1_cartridge")?,
        smart_filament_s_cartridge: row.get("smart_filament_s_cartridge")?,
        smart_filament_m_cartridge: row.get("smart_filament_m_cartridge")?,
        smart_filament_l_cartridge: row.get("smart_filament_l_cartridge")?,
        mamr_reel_cartridge: row.get("mamr_reel_cartridge")?,
        dupont_cartridge: row.get("dupont_cartridge")?,
        current_week: int_to_week("inventory.current_week", row.get("current_week")?)?,
    })
}
