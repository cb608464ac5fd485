//! User repository for database operations.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query_as};

use corner_shop_core::Email;

use super::{PgRepository, RepositoryError};
use crate::models::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    async fn create_user(&self, email: &Email) -> Result<User, RepositoryError>;
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn create_user(&self, email: &Email) -> Result<User, RepositoryError> {
        query_as::<Postgres, User>(
            "INSERT INTO shop.users (email) VALUES ($1) RETURNING id, email, created_at",
        )
        .bind(email)
        .fetch_one(self.pool())
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))
    }
}
