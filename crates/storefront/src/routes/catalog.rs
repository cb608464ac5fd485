//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use corner_shop_core::{Category, Label, Money, Slug};

use super::Page;
use crate::error::{AppError, Result};
use crate::middleware::Flash;
use crate::models::Item;
use crate::state::AppState;

/// Item display data.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub slug: Slug,
    pub title: String,
    pub price: Money,
    pub category: Category,
    pub label: Label,
    pub description: Option<String>,
    pub url: String,
    pub add_to_cart_url: String,
    pub remove_from_cart_url: String,
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        Self {
            url: super::product_path(&item.slug),
            add_to_cart_url: format!("/add-to-cart/{}", item.slug),
            remove_from_cart_url: format!("/remove-from-cart/{}", item.slug),
            slug: item.slug,
            title: item.title,
            price: item.price,
            category: item.category,
            label: item.label,
            description: item.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItemList {
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize)]
pub struct ItemDetail {
    pub item: ItemView,
}

/// Parse a slug from the path, treating a malformed one as a missing item.
pub(super) fn parse_slug(raw: &str) -> Result<Slug> {
    Slug::parse(raw).map_err(|_| AppError::NotFound(format!("item {raw}")))
}

/// List every catalog item.
#[instrument(skip(state, flash))]
pub async fn index(State(state): State<AppState>, flash: Flash) -> Result<Json<Page<ItemList>>> {
    let items = state.repo().list_items().await?;
    let items = items.into_iter().map(ItemView::from).collect();
    Page::render(&flash, ItemList { items }).await
}

/// Show a single item.
#[instrument(skip(state, flash))]
pub async fn show(
    State(state): State<AppState>,
    flash: Flash,
    Path(slug): Path<String>,
) -> Result<Json<Page<ItemDetail>>> {
    let slug = parse_slug(&slug)?;
    let item = state
        .repo()
        .get_item_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("item {slug}")))?;

    Page::render(
        &flash,
        ItemDetail {
            item: ItemView::from(item),
        },
    )
    .await
}
