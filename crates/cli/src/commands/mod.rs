//! Command implementations.
//!
//! Each command connects with `STOREFRONT_DATABASE_URL` (falling back to
//! `DATABASE_URL`) and goes through the storefront's repositories and
//! services, so the same uniqueness rules apply as in the web app.

pub mod coupons;
pub mod items;
pub mod migrate;
pub mod refunds;
pub mod users;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use corner_shop_storefront::db::{self, PgRepository, RepositoryError};
use corner_shop_storefront::services::RefundError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Refund(#[from] RefundError),
}

fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Connect to the storefront database.
pub async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&url).await?)
}

/// Connect and wrap the pool in a repository.
pub async fn repository() -> Result<PgRepository, CommandError> {
    Ok(PgRepository::new(connect().await?))
}
