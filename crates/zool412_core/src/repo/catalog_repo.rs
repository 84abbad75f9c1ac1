//! Item catalog repository.
//!
//! # Invariants
//! - `item_key` is unique; upserts replace price, label and wait in place.

use crate::model::catalog::CatalogItem;
use crate::model::resources::Article;
use crate::repo::{
    ensure_connection_ready, int_to_week, parse_text, RepoResult, TableRequirements,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

const CATALOG_SELECT_SQL: &str = "SELECT
    item_key,
    display_name,
    chuan_cost,
    wait_weeks
FROM item_catalog";

const REQUIRED_TABLES: TableRequirements = &[(
    "item_catalog",
    &["item_key", "display_name", "chuan_cost", "wait_weeks"],
)];

pub trait CatalogRepository {
    fn upsert_item(&self, item: &CatalogItem) -> RepoResult<()>;
    fn get_item(&self, article: Article) -> RepoResult<Option<CatalogItem>>;
    fn list_items(&self) -> RepoResult<Vec<CatalogItem>>;
}

pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn upsert_item(&self, item: &CatalogItem) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO item_catalog (item_key, display_name, chuan_cost, wait_weeks)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(item_key) DO UPDATE SET
                display_name = excluded.display_name,
                chuan_cost = excluded.chuan_cost,
                wait_weeks = excluded.wait_weeks;",
            params![
                item.item_key.as_str(),
                item.display_name.as_str(),
                item.chuan_cost,
                item.wait_weeks,
            ],
        )?;
        Ok(())
    }

    fn get_item(&self, article: Article) -> RepoResult<Option<CatalogItem>> {
        self.conn
            .query_row(
                &format!("{CATALOG_SELECT_SQL} WHERE item_key = ?1;"),
                [article.as_str()],
                |row| Ok(parse_catalog_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_items(&self) -> RepoResult<Vec<CatalogItem>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATALOG_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_catalog_row(row)?);
        }
        Ok(items)
    }
}

fn parse_catalog_row(row: &Row<'_>) -> RepoResult<CatalogItem> {
    let item_key: String = row.get("item_key")?;
    Ok(CatalogItem {
        item_key: parse_text("item_catalog.item_key", &item_key, Article::parse)?,
        display_name: row.get("display_name")?,
        chuan_cost: row.get("chuan_cost")?,
        wait_weeks: int_to_week("item_catalog.wait_weeks", row.get("wait_weeks")?)?,
    })
}
