//! Cart route handlers.
//!
//! Mutations queue a flash message and redirect; only an unknown item is an
//! error response (404).

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use corner_shop_core::{Money, Slug};

use super::catalog::parse_slug;
use super::{Page, product_path, redirect_with};
use crate::error::{AppError, Result};
use crate::middleware::{Flash, RequireAuth};
use crate::models::{FlashLevel, OrderLine, OrderSummary};
use crate::services::{CartError, CartOutcome};
use crate::state::AppState;

/// Where the cart summary lives.
pub const ORDER_SUMMARY_PATH: &str = "/order-summary";

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    pub slug: Slug,
    pub title: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub total: Money,
}

impl From<OrderLine> for LineView {
    fn from(line: OrderLine) -> Self {
        Self {
            total: line.total(),
            slug: line.item.slug,
            title: line.item.title,
            unit_price: line.item.price,
            quantity: line.order_item.quantity,
        }
    }
}

/// Coupon display data.
#[derive(Debug, Clone, Serialize)]
pub struct CouponView {
    pub code: String,
    pub amount: Money,
}

/// Cart summary display data.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummaryView {
    pub lines: Vec<LineView>,
    pub item_count: u32,
    pub subtotal: Money,
    pub coupon: Option<CouponView>,
    pub has_billing_address: bool,
}

impl From<OrderSummary> for OrderSummaryView {
    fn from(summary: OrderSummary) -> Self {
        Self {
            item_count: summary.item_count(),
            subtotal: summary.subtotal(),
            has_billing_address: summary.billing_address.is_some(),
            coupon: summary.coupon.map(|c| CouponView {
                code: c.code,
                amount: c.amount,
            }),
            lines: summary.lines.into_iter().map(LineView::from).collect(),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ItemNotFound(slug) => Self::NotFound(format!("item {slug}")),
            CartError::NoActiveOrder => Self::BadRequest("no active order".to_owned()),
            CartError::Repository(e) => Self::Database(e),
        }
    }
}

/// Flash the outcome's message and redirect.
async fn flash_outcome(flash: &Flash, outcome: CartOutcome, to: &str) -> Result<Response> {
    redirect_with(flash, outcome.level(), outcome.message(), to).await
}

/// Add one unit of an item to the cart.
#[instrument(skip(state, flash, user), fields(user = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(slug): Path<String>,
) -> Result<Response> {
    let slug = parse_slug(&slug)?;
    let outcome = state.cart().add(user.id, &slug).await?;
    flash_outcome(&flash, outcome, ORDER_SUMMARY_PATH).await
}

/// Remove an item's line from the cart.
///
/// Goes back to the item page when nothing was removed.
#[instrument(skip(state, flash, user), fields(user = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(slug): Path<String>,
) -> Result<Response> {
    let slug = parse_slug(&slug)?;
    let outcome = state.cart().remove(user.id, &slug).await?;
    let to = match outcome {
        CartOutcome::Removed => ORDER_SUMMARY_PATH.to_owned(),
        _ => product_path(&slug),
    };
    flash_outcome(&flash, outcome, &to).await
}

/// Remove one unit of an item from the cart.
#[instrument(skip(state, flash, user), fields(user = %user.id))]
pub async fn decrement(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(slug): Path<String>,
) -> Result<Response> {
    let slug = parse_slug(&slug)?;
    let outcome = state.cart().decrement(user.id, &slug).await?;
    let to = match outcome {
        CartOutcome::NoActiveOrder => product_path(&slug),
        _ => ORDER_SUMMARY_PATH.to_owned(),
    };
    flash_outcome(&flash, outcome, &to).await
}

/// Show the cart, or send the shopper home if there is none.
#[instrument(skip(state, flash, user), fields(user = %user.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
) -> Result<Response> {
    match state.cart().summary(user.id).await {
        Ok(summary) => {
            let page = Page::render(&flash, OrderSummaryView::from(summary)).await?;
            Ok(page.into_response())
        }
        Err(err) => match err.user_message() {
            Some(message) => redirect_with(&flash, FlashLevel::Warning, message, "/").await,
            None => Err(err.into()),
        },
    }
}
