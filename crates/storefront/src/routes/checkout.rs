//! Checkout route handlers.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::cart::{ORDER_SUMMARY_PATH, OrderSummaryView};
use super::{Page, redirect_with};
use crate::error::{AppError, Result};
use crate::middleware::{Flash, RequireAuth};
use crate::models::{CheckoutForm, FlashLevel};
use crate::services::CheckoutError;
use crate::state::AppState;

pub const CHECKOUT_PATH: &str = "/checkout";

/// Coupon form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub code: String,
}

/// A form field the client should render.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub name: &'static str,
    pub required: bool,
}

/// A payment path the shopper can pick.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentChoiceView {
    pub value: &'static str,
    pub label: &'static str,
}

/// Checkout page data.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub fields: Vec<FieldView>,
    pub payment_options: Vec<PaymentChoiceView>,
    pub coupon_action: &'static str,
    pub order: OrderSummaryView,
}

fn checkout_fields() -> Vec<FieldView> {
    [
        ("street_address", true),
        ("apartment_address", false),
        ("country", true),
        ("zip", true),
        ("payment_option", true),
    ]
    .into_iter()
    .map(|(name, required)| FieldView { name, required })
    .collect()
}

fn payment_choices() -> Vec<PaymentChoiceView> {
    vec![
        PaymentChoiceView {
            value: "S",
            label: "Stripe",
        },
        PaymentChoiceView {
            value: "P",
            label: "PayPal",
        },
    ]
}

/// Turn a domain error into a flash and redirect, or pass infrastructure
/// errors through.
async fn recover(flash: &Flash, err: CheckoutError, to: &str) -> Result<Response> {
    match err {
        CheckoutError::Repository(e) => Err(AppError::Database(e)),
        other => {
            let level = match other {
                CheckoutError::CouponNotFound(_) => FlashLevel::Info,
                _ => FlashLevel::Warning,
            };
            let message = other.user_message().unwrap_or_default();
            redirect_with(flash, level, message, to).await
        }
    }
}

/// Show the checkout form with the current cart.
#[instrument(skip(state, flash, user), fields(user = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
) -> Result<Response> {
    let summary = match state.cart().summary(user.id).await {
        Ok(summary) => summary,
        Err(err) => {
            return match err.user_message() {
                Some(message) => redirect_with(&flash, FlashLevel::Info, message, "/").await,
                None => Err(err.into()),
            };
        }
    };

    let view = CheckoutView {
        fields: checkout_fields(),
        payment_options: payment_choices(),
        coupon_action: "/add-coupon",
        order: OrderSummaryView::from(summary),
    };
    Ok(Page::render(&flash, view).await?.into_response())
}

/// Save the billing address and continue to the chosen payment page.
#[instrument(skip(state, flash, user, form), fields(user = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    match state.checkout().submit(user.id, form).await {
        Ok(option) => Ok(Redirect::to(&format!("/payment/{option}")).into_response()),
        Err(CheckoutError::NoActiveOrder) => {
            recover(&flash, CheckoutError::NoActiveOrder, ORDER_SUMMARY_PATH).await
        }
        Err(err) => {
            warn!(error = %err, "Checkout rejected");
            recover(&flash, err, CHECKOUT_PATH).await
        }
    }
}

/// Apply a coupon code to the cart.
#[instrument(skip(state, flash, user, form), fields(user = %user.id))]
pub async fn add_coupon(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    flash: Flash,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    match state.checkout().apply_coupon(user.id, &form.code).await {
        Ok(_) => {
            redirect_with(
                &flash,
                FlashLevel::Success,
                "Successfully added coupon.",
                CHECKOUT_PATH,
            )
            .await
        }
        Err(err) => recover(&flash, err, CHECKOUT_PATH).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_fields_mark_apartment_optional() {
        let fields = checkout_fields();
        let optional: Vec<_> = fields.iter().filter(|f| !f.required).map(|f| f.name).collect();
        assert_eq!(optional, vec!["apartment_address"]);
    }

    #[test]
    fn test_payment_choices_parse() {
        for choice in payment_choices() {
            assert!(choice.value.parse::<corner_shop_core::PaymentOption>().is_ok());
        }
    }
}
