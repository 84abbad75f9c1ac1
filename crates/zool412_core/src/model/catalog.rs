//! Catalog of orderable items with price (chuan) and base wait time (weeks).

use crate::model::resources::Article;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_key: Article,
    pub display_name: String,
    pub chuan_cost: f64,
    pub wait_weeks: u32,
}

impl CatalogItem {
    /// Creates an item labelled with the article's default display name.
    pub fn new(item_key: Article, chuan_cost: f64, wait_weeks: u32) -> Self {
        Self {
            item_key,
            display_name: item_key.display_name().to_string(),
            chuan_cost,
            wait_weeks,
        }
    }
}
