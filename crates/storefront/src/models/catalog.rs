//! Catalog item types.

use serde::Serialize;

use corner_shop_core::{Category, ItemId, Label, Money, Slug};

/// A purchasable catalog entry.
///
/// Items are created by an administrator and never modified by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Database ID.
    pub id: ItemId,
    /// Unique URL slug.
    pub slug: Slug,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Money,
    /// Catalog category.
    pub category: Category,
    /// Badge label.
    pub label: Label,
    /// Optional long description.
    pub description: Option<String>,
}

/// Parameters for creating a catalog item.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub slug: Slug,
    pub title: String,
    pub price: Money,
    pub category: Category,
    pub label: Label,
    pub description: Option<String>,
}
