//! Catalog item repository.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query_as};

use corner_shop_core::{ItemId, Slug};

use super::{PgRepository, RepositoryError, decode_parsed};
use crate::models::{Item, NewItem};

const ITEM_COLUMNS: &str = "id, slug, title, price, category, label, description";

/// Catalog reads, plus creation for administrators.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// All items, ordered by title.
    async fn list_items(&self) -> Result<Vec<Item>, RepositoryError>;

    /// Look up an item by slug.
    async fn get_item_by_slug(&self, slug: &Slug) -> Result<Option<Item>, RepositoryError>;

    /// Create a catalog item.
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    async fn create_item(&self, item: NewItem) -> Result<Item, RepositoryError>;
}

impl<'r> FromRow<'r, PgRow> for Item {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let category: String = row.try_get("category")?;
        let label: String = row.try_get("label")?;

        Ok(Self {
            id: row.try_get::<ItemId, _>("id")?,
            slug: row.try_get("slug")?,
            title: row.try_get("title")?,
            price: row.try_get("price")?,
            category: decode_parsed(&category, "category")?,
            label: decode_parsed(&label, "label")?,
            description: row.try_get("description")?,
        })
    }
}

#[async_trait]
impl ItemRepository for PgRepository {
    async fn list_items(&self) -> Result<Vec<Item>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM shop.items ORDER BY title, id");
        let items = query_as::<Postgres, Item>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(items)
    }

    async fn get_item_by_slug(&self, slug: &Slug) -> Result<Option<Item>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM shop.items WHERE slug = $1");
        let item = query_as::<Postgres, Item>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        Ok(item)
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, RepositoryError> {
        let sql = format!(
            "INSERT INTO shop.items (slug, title, price, category, label, description) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ITEM_COLUMNS}"
        );
        query_as::<Postgres, Item>(&sql)
            .bind(&item.slug)
            .bind(&item.title)
            .bind(item.price)
            .bind(item.category.as_str())
            .bind(item.label.as_str())
            .bind(&item.description)
            .fetch_one(self.pool())
            .await
            .map_err(|e| RepositoryError::from_insert(e, "item slug"))
    }
}
