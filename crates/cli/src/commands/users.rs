//! Shopper record commands.

use corner_shop_core::Email;
use corner_shop_storefront::db::UserRepository;

use super::{CommandError, repository};

/// Create a shopper record.
pub async fn create(email: &Email) -> Result<(), CommandError> {
    let repo = repository().await?;
    let user = repo.create_user(email).await?;
    tracing::info!(id = %user.id, email = %user.email, "User created");
    Ok(())
}
