//! Database operations for the storefront.
//!
//! # Database schema: `shop`
//!
//! - `users` - Shopper identities
//! - `items` - Catalog entries
//! - `orders` - Carts (`ordered = false`) and placed orders
//! - `order_items` - Cart lines, one unordered row per (user, item)
//! - `billing_addresses`, `coupons`, `payments`, `refunds`
//!
//! Two partial unique indexes carry the cart invariants:
//! `orders (user_id) WHERE NOT ordered` and
//! `order_items (user_id, item_id) WHERE NOT ordered`. The get-or-create
//! operations insert with `ON CONFLICT DO NOTHING` against them.
//!
//! # Repositories
//!
//! Each concern has its own `async_trait` repository trait. [`PgRepository`]
//! implements all of them against `PostgreSQL`; [`MemoryRepository`]
//! implements them in process for tests and local runs. Services hold an
//! `Arc<dyn Repository>`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p corner-shop-cli -- migrate
//! ```

mod checkout;
mod items;
pub mod memory;
mod orders;
mod payments;
mod refunds;
mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use checkout::CheckoutRepository;
pub use items::ItemRepository;
pub use memory::MemoryRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use refunds::RefundRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to [`RepositoryError::Conflict`], anything else
    /// to [`RepositoryError::Database`].
    pub(crate) fn from_insert(error: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = error
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(error)
    }
}

/// All repository traits, plus a connectivity check.
#[async_trait]
pub trait Repository:
    ItemRepository
    + OrderRepository
    + CheckoutRepository
    + PaymentRepository
    + RefundRepository
    + UserRepository
{
    /// Verify the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed repository.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Create a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Read a non-negative `INTEGER` quantity column.
pub(crate) fn decode_quantity(value: i32, column: &str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_owned(),
        source: Box::new(e),
    })
}

/// Parse a `TEXT` column through `FromStr`.
pub(crate) fn decode_parsed<T>(value: &str, column: &str) -> Result<T, sqlx::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_owned(),
        source: Box::new(e),
    })
}
