//! Database migration command.
//!
//! ```bash
//! cs-cli migrate
//! ```
//!
//! Applies `crates/storefront/migrations/` and creates the tower-sessions
//! table used by the storefront's session store.

use corner_shop_storefront::middleware::migrate_session_store;

use super::{CommandError, connect};

/// Run storefront database migrations.
pub async fn storefront() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    sqlx::migrate!("../storefront/migrations").run(&pool).await?;

    tracing::info!("Creating session store table...");
    migrate_session_store(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
