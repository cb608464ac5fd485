//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (repository ping)
//!
//! # Catalog
//! GET  /                             - Item listing
//! GET  /product/{slug}               - Item detail
//!
//! # Cart (requires auth)
//! POST /add-to-cart/{slug}           - Add one unit
//! POST /remove-from-cart/{slug}      - Remove the line
//! POST /remove-item-from-cart/{slug} - Remove one unit
//! GET  /order-summary                - Cart summary
//!
//! # Checkout (requires auth)
//! GET  /checkout                     - Checkout form and summary
//! POST /checkout                     - Billing address + payment option
//! POST /add-coupon                   - Apply a coupon
//! GET  /payment/{option}             - Payment page data
//! POST /payment/{option}             - Charge the card
//!
//! # Refunds
//! GET  /request-refund               - Refund form description
//! POST /request-refund               - Submit a refund request
//!
//! GET  /messages                     - Drain queued flash messages
//! ```
//!
//! GET views return JSON documents with the queued flash messages under
//! `messages`. POST handlers queue a message and answer with a 303 redirect.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod messages;
pub mod payment;
pub mod refund;

use axum::{
    Json, Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::Flash;
use crate::models::{FlashLevel, FlashMessage};
use crate::state::AppState;

/// A JSON view with the flash messages queued for it.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub messages: Vec<FlashMessage>,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Page<T> {
    /// Drain the flash queue into a page around `data`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be read.
    pub async fn render(flash: &Flash, data: T) -> Result<Json<Self>> {
        let messages = flash.drain().await?;
        Ok(Json(Self { messages, data }))
    }
}

/// Queue a flash message and redirect with 303 See Other.
///
/// # Errors
///
/// Returns `AppError::Session` if the message cannot be stored.
pub async fn redirect_with(
    flash: &Flash,
    level: FlashLevel,
    text: impl Into<String>,
    to: &str,
) -> Result<Response> {
    flash.push(level, text).await?;
    Ok(Redirect::to(to).into_response())
}

/// Path of an item's detail page.
#[must_use]
pub fn product_path(slug: &impl std::fmt::Display) -> String {
    format!("/product/{slug}")
}

/// Create the health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add-to-cart/{slug}", post(cart::add))
        .route("/remove-from-cart/{slug}", post(cart::remove))
        .route("/remove-item-from-cart/{slug}", post(cart::decrement))
        .route("/order-summary", get(cart::summary))
}

/// Create the checkout and payment routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/add-coupon", post(checkout::add_coupon))
        .route("/payment/{option}", get(payment::show).post(payment::charge))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health_routes())
        // Catalog
        .route("/", get(catalog::index))
        .route("/product/{slug}", get(catalog::show))
        .merge(cart_routes())
        .merge(checkout_routes())
        // Refunds
        .route("/request-refund", get(refund::show).post(refund::request))
        .route("/messages", get(messages::drain))
}
