//! Cart operations.
//!
//! The cart is the user's single unordered [`Order`](crate::models::Order).
//! It is created lazily by the first add-to-cart and holds at most one line
//! per item; adding an item that is already present bumps its quantity.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, instrument};

use corner_shop_core::{Slug, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::{FlashLevel, Item, OrderSummary};

/// What a cart mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOutcome {
    /// A new line was linked to the cart.
    Added,
    /// An existing line's quantity changed.
    QuantityUpdated,
    /// The line was taken out of the cart.
    Removed,
    /// The item was not in the cart; nothing changed.
    NotInCart,
    /// The user has no cart; nothing changed.
    NoActiveOrder,
}

impl CartOutcome {
    /// Shopper-facing message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Added => "This item was added to your cart.",
            Self::QuantityUpdated => "This item quantity was updated.",
            Self::Removed => "This item was removed from your cart.",
            Self::NotInCart => "This item was not in your cart.",
            Self::NoActiveOrder => "You do not have an active order.",
        }
    }

    #[must_use]
    pub const fn level(self) -> FlashLevel {
        match self {
            Self::NoActiveOrder => FlashLevel::Warning,
            _ => FlashLevel::Info,
        }
    }

    /// Whether the cart still holds the item afterwards.
    #[must_use]
    pub const fn in_cart(self) -> bool {
        matches!(self, Self::Added | Self::QuantityUpdated)
    }
}

#[derive(Debug, Error)]
pub enum CartError {
    #[error("item not found: {0}")]
    ItemNotFound(Slug),

    #[error("no active order")]
    NoActiveOrder,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CartError {
    /// Shopper-facing message for domain errors.
    #[must_use]
    pub const fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::ItemNotFound(_) => Some("That item does not exist."),
            Self::NoActiveOrder => Some("You do not have an active order."),
            Self::Repository(_) => None,
        }
    }
}

/// Cart operations for signed-in users.
#[derive(Clone)]
pub struct CartService {
    repo: Arc<dyn Repository>,
}

impl CartService {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    async fn item(&self, slug: &Slug) -> Result<Item, CartError> {
        self.repo
            .get_item_by_slug(slug)
            .await?
            .ok_or_else(|| CartError::ItemNotFound(slug.clone()))
    }

    /// Add one unit of an item to the user's cart, creating the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` for an unknown slug.
    #[instrument(skip(self), fields(user = %user, slug = %slug))]
    pub async fn add(&self, user: UserId, slug: &Slug) -> Result<CartOutcome, CartError> {
        let item = self.item(slug).await?;
        let line = self.repo.get_or_create_order_item(user, item.id).await?;
        let order = self.repo.get_or_create_active_order(user, Utc::now()).await?;

        if self.repo.find_order_item(order.id, item.id).await?.is_some() {
            let line = self.repo.increment_quantity(line.id).await?;
            debug!(order = %order.id, quantity = line.quantity, "Cart quantity incremented");
            Ok(CartOutcome::QuantityUpdated)
        } else {
            self.repo.link_order_item(order.id, line.id).await?;
            debug!(order = %order.id, "Item added to cart");
            Ok(CartOutcome::Added)
        }
    }

    /// Take an item out of the user's cart entirely.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` for an unknown slug.
    #[instrument(skip(self), fields(user = %user, slug = %slug))]
    pub async fn remove(&self, user: UserId, slug: &Slug) -> Result<CartOutcome, CartError> {
        let item = self.item(slug).await?;
        let Some(order) = self.repo.get_active_order(user).await? else {
            return Ok(CartOutcome::NoActiveOrder);
        };
        let Some(line) = self.repo.find_order_item(order.id, item.id).await? else {
            return Ok(CartOutcome::NotInCart);
        };

        self.repo.remove_order_item(line.id).await?;
        Ok(CartOutcome::Removed)
    }

    /// Take one unit of an item out of the user's cart, removing the line
    /// when its quantity is one.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` for an unknown slug.
    #[instrument(skip(self), fields(user = %user, slug = %slug))]
    pub async fn decrement(&self, user: UserId, slug: &Slug) -> Result<CartOutcome, CartError> {
        let item = self.item(slug).await?;
        let Some(order) = self.repo.get_active_order(user).await? else {
            return Ok(CartOutcome::NoActiveOrder);
        };
        let Some(line) = self.repo.find_order_item(order.id, item.id).await? else {
            return Ok(CartOutcome::NotInCart);
        };

        if line.quantity > 1 {
            self.repo.decrement_quantity(line.id).await?;
            Ok(CartOutcome::QuantityUpdated)
        } else {
            self.repo.remove_order_item(line.id).await?;
            Ok(CartOutcome::Removed)
        }
    }

    /// The user's cart with lines, coupon and billing address.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoActiveOrder` when the user has no cart.
    pub async fn summary(&self, user: UserId) -> Result<OrderSummary, CartError> {
        let order = self
            .repo
            .get_active_order(user)
            .await?
            .ok_or(CartError::NoActiveOrder)?;

        let lines = self.repo.order_lines(order.id).await?;
        let coupon = match order.coupon_id {
            Some(id) => self.repo.get_coupon(id).await?,
            None => None,
        };
        let billing_address = match order.billing_address_id {
            Some(id) => self.repo.get_billing_address(id).await?,
            None => None,
        };

        Ok(OrderSummary {
            order,
            lines,
            coupon,
            billing_address,
        })
    }
}
