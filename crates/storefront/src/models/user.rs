//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use corner_shop_core::{Email, UserId};

/// A shopper.
///
/// Only the identity is stored here; signing in is handled outside the
/// storefront and lands a [`CurrentUser`](super::CurrentUser) in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
