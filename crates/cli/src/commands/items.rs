//! Catalog commands.

use corner_shop_storefront::db::ItemRepository;
use corner_shop_storefront::models::NewItem;

use super::{CommandError, repository};

/// Add an item to the catalog.
///
/// Fails with a conflict if the slug is taken.
pub async fn create(item: NewItem) -> Result<(), CommandError> {
    let repo = repository().await?;
    let item = repo.create_item(item).await?;
    tracing::info!(
        id = %item.id,
        slug = %item.slug,
        price = %item.price,
        category = %item.category,
        "Item created"
    );
    Ok(())
}
