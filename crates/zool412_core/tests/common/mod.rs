#![allow(dead_code)]

use rusqlite::Connection;
use zool412_core::db::open_db_in_memory;
use zool412_core::model::user::UserId;
use zool412_core::repo::{
    SqliteCatalogRepository, SqliteExperimentRepository, SqliteInventoryRepository,
    SqliteOrderRepository, SqliteUserRepository,
};
use zool412_core::service::{AdminService, ExperimentService, OrderService};

/// In-memory game with starting inventory, catalog and three users.
pub fn seeded_db() -> (Connection, UserId) {
    let conn = open_db_in_memory().unwrap();
    let user_id = {
        let admin = admin(&conn);
        admin.initialize_inventory().unwrap();
        admin.initialize_item_catalog().unwrap();
        admin.create_test_users().unwrap()[0]
    };
    (conn, user_id)
}

pub fn admin(
    conn: &Connection,
) -> AdminService<
    SqliteInventoryRepository<'_>,
    SqliteCatalogRepository<'_>,
    SqliteUserRepository<'_>,
> {
    AdminService::new(
        SqliteInventoryRepository::try_new(conn).unwrap(),
        SqliteCatalogRepository::try_new(conn).unwrap(),
        SqliteUserRepository::try_new(conn).unwrap(),
    )
}

pub fn orders(
    conn: &Connection,
) -> OrderService<SqliteCatalogRepository<'_>, SqliteOrderRepository<'_>> {
    OrderService::new(
        SqliteCatalogRepository::try_new(conn).unwrap(),
        SqliteOrderRepository::try_new(conn).unwrap(),
    )
}

pub fn experiments(
    conn: &Connection,
) -> ExperimentService<SqliteExperimentRepository<'_>, SqliteInventoryRepository<'_>> {
    ExperimentService::new(
        SqliteExperimentRepository::try_new(conn).unwrap(),
        SqliteInventoryRepository::try_new(conn).unwrap(),
    )
}

pub fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
