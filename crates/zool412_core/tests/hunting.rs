mod common;

use common::{admin, row_count, seeded_db};
use zool412_core::model::ledger::{LedgerActionType, LedgerQuery};
use zool412_core::model::resources::{AnimalSpecies, TechAssistant};
use zool412_core::repo::{
    InventoryRepository, LedgerRepository, SqliteInventoryRepository, SqliteLedgerRepository,
};
use zool412_core::service::{HuntingService, HuntingServiceError};
use zool412_core::RepoError;

#[test]
fn hunting_refills_stock_and_costs_shifts_per_ten_animals() {
    let (conn, user_id) = seeded_db();
    conn.execute("UPDATE inventory SET animals_51u6_available = 15;", [])
        .unwrap();
    let service = HuntingService::new(SqliteInventoryRepository::try_new(&conn).unwrap());

    let collection = service
        .collect_animals(user_id, AnimalSpecies::U51)
        .unwrap();
    assert_eq!(collection.collected, 25);
    assert_eq!(collection.shifts.draws, vec![(TechAssistant::Saltos, 3)]);
    assert_eq!(
        collection
            .inventory_after
            .animal_stock(AnimalSpecies::U51)
            .available,
        40
    );
    assert_eq!(collection.inventory_after.ta_saltos_shifts, 117);

    let entries = SqliteLedgerRepository::try_new(&conn)
        .unwrap()
        .list_entries(&LedgerQuery {
            action_type: Some(LedgerActionType::Hunting),
            ..LedgerQuery::default()
        })
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action_label.as_deref(), Some("animals_51u6"));
}

#[test]
fn hunting_a_locked_species_fails() {
    let (conn, user_id) = seeded_db();
    let service = HuntingService::new(SqliteInventoryRepository::try_new(&conn).unwrap());

    let err = service
        .collect_animals(user_id, AnimalSpecies::C248L)
        .unwrap_err();
    assert!(matches!(
        err,
        HuntingServiceError::SpeciesLocked(AnimalSpecies::C248L)
    ));
}

#[test]
fn hunting_a_full_stock_fails_without_side_effects() {
    let (conn, user_id) = seeded_db();
    let service = HuntingService::new(SqliteInventoryRepository::try_new(&conn).unwrap());

    let err = service
        .collect_animals(user_id, AnimalSpecies::U51)
        .unwrap_err();
    assert!(matches!(
        err,
        HuntingServiceError::StockFull(AnimalSpecies::U51)
    ));
    assert_eq!(admin(&conn).inventory().unwrap().total_shifts(), 480);
    assert_eq!(row_count(&conn, "user_ledger"), 0);
}

#[test]
fn hunting_without_shifts_reports_shortfall() {
    let (conn, user_id) = seeded_db();
    admin(&conn)
        .unlock_species(AnimalSpecies::C248S, 30)
        .unwrap();
    conn.execute(
        "UPDATE inventory SET
            animals_c248_s_available = 0,
            ta_saltos_shifts = 1,
            ta_nitro_shifts = 0,
            ta_helene_shifts = 0,
            ta_carnival_shifts = 0;",
        [],
    )
    .unwrap();
    let service = HuntingService::new(SqliteInventoryRepository::try_new(&conn).unwrap());

    let err = service
        .collect_animals(user_id, AnimalSpecies::C248S)
        .unwrap_err();
    assert!(matches!(err, HuntingServiceError::InsufficientResources(_)));
    assert_eq!(
        admin(&conn)
            .inventory()
            .unwrap()
            .animal_stock(AnimalSpecies::C248S)
            .available,
        0
    );
}

#[test]
fn inventory_repo_checks_lock_and_capacity_on_its_own() {
    let (conn, user_id) = seeded_db();
    let repo = SqliteInventoryRepository::try_new(&conn).unwrap();

    assert!(matches!(
        repo.collect_animals(user_id, AnimalSpecies::U51M).unwrap_err(),
        RepoError::SpeciesLocked(AnimalSpecies::U51M)
    ));
    assert!(matches!(
        repo.collect_animals(user_id, AnimalSpecies::U51).unwrap_err(),
        RepoError::StockFull(AnimalSpecies::U51)
    ));

    conn.execute("UPDATE inventory SET animals_51u6_available = 39;", [])
        .unwrap();
    let collection = repo.collect_animals(user_id, AnimalSpecies::U51).unwrap();
    assert_eq!(collection.collected, 1);
    assert_eq!(collection.shifts.total(), 1);
    assert_eq!(row_count(&conn, "user_ledger"), 1);
}
