//! Payment route handlers.
//!
//! Every charge attempt ends with a redirect home; the outcome is carried by
//! the flash message.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use corner_shop_core::{CurrencyCode, PaymentOption};

use super::cart::OrderSummaryView;
use super::checkout::CHECKOUT_PATH;
use super::{Page, redirect_with};
use crate::error::{AppError, Result};
use crate::middleware::{Flash, RequireAuth};
use crate::models::FlashLevel;
use crate::services::{PAYMENT_SUCCESS_MESSAGE, PaymentError};
use crate::state::AppState;

const PAYPAL_UNAVAILABLE: &str = "PayPal payments are not available yet.";

/// Card payment form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentForm {
    #[serde(rename = "stripeToken", default)]
    pub stripe_token: String,
}

/// Payment page data.
#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub option: PaymentOption,
    pub currency: CurrencyCode,
    pub order: OrderSummaryView,
}

fn parse_option(raw: &str) -> Result<PaymentOption> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("payment option {raw}")))
}

fn failure_level(err: &PaymentError) -> FlashLevel {
    match err {
        PaymentError::NoActiveOrder | PaymentError::EmptyOrder => FlashLevel::Warning,
        _ => FlashLevel::Error,
    }
}

/// Show the payment page for the cart.
///
/// Requires a billing address on the cart; without one the shopper goes
/// back to checkout.
#[instrument(skip(state, flash, user), fields(user = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(option): Path<String>,
) -> Result<Response> {
    let option = parse_option(&option)?;
    if option == PaymentOption::PayPal {
        return redirect_with(&flash, FlashLevel::Warning, PAYPAL_UNAVAILABLE, CHECKOUT_PATH).await;
    }

    let summary = match state.cart().summary(user.id).await {
        Ok(summary) => summary,
        Err(err) => {
            return match err.user_message() {
                Some(message) => redirect_with(&flash, FlashLevel::Warning, message, "/").await,
                None => Err(err.into()),
            };
        }
    };

    if summary.billing_address.is_none() {
        return redirect_with(
            &flash,
            FlashLevel::Warning,
            "You have not added a billing address.",
            CHECKOUT_PATH,
        )
        .await;
    }

    let view = PaymentView {
        option,
        currency: state.config().payments.currency,
        order: OrderSummaryView::from(summary),
    };
    Ok(Page::render(&flash, view).await?.into_response())
}

/// Charge the cart with the submitted card token.
#[instrument(skip(state, flash, user, form), fields(user = %user.id))]
pub async fn charge(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Path(option): Path<String>,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let option = parse_option(&option)?;
    if option == PaymentOption::PayPal {
        return redirect_with(&flash, FlashLevel::Warning, PAYPAL_UNAVAILABLE, "/").await;
    }

    match state.payments().charge(user.id, &form.stripe_token).await {
        Ok(order) => {
            info!(order = %order.id, ref_code = ?order.ref_code, "Order placed");
            redirect_with(&flash, FlashLevel::Success, PAYMENT_SUCCESS_MESSAGE, "/").await
        }
        Err(err) => {
            warn!(error = %err, "Payment failed");
            redirect_with(&flash, failure_level(&err), err.user_message(), "/").await
        }
    }
}
