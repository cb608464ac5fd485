//! Refund request route handlers.
//!
//! Refund requests are keyed by reference code and email, so these routes do
//! not require a signed-in shopper.

use axum::{Form, Json, extract::State, response::Response};
use serde::Serialize;
use tracing::{info, instrument};

use super::{Page, redirect_with};
use crate::error::{AppError, Result};
use crate::middleware::Flash;
use crate::models::{FlashLevel, RefundRequestForm};
use crate::services::{REFUND_RECEIVED_MESSAGE, RefundError};
use crate::state::AppState;

pub const REQUEST_REFUND_PATH: &str = "/request-refund";

#[derive(Debug, Serialize)]
pub struct RefundFormView {
    pub action: &'static str,
    pub fields: [&'static str; 3],
}

/// Describe the refund request form.
pub async fn show(flash: Flash) -> Result<Json<Page<RefundFormView>>> {
    Page::render(
        &flash,
        RefundFormView {
            action: REQUEST_REFUND_PATH,
            fields: ["ref_code", "message", "email"],
        },
    )
    .await
}

/// Store a refund request.
#[instrument(skip(state, flash, form))]
pub async fn request(
    State(state): State<AppState>,
    flash: Flash,
    Form(form): Form<RefundRequestForm>,
) -> Result<Response> {
    match state.refunds().request(form).await {
        Ok(refund) => {
            info!(refund = %refund.id, order = %refund.order_id, "Refund request stored");
            redirect_with(
                &flash,
                FlashLevel::Info,
                REFUND_RECEIVED_MESSAGE,
                REQUEST_REFUND_PATH,
            )
            .await
        }
        Err(RefundError::Repository(e)) => Err(AppError::Database(e)),
        Err(err) => {
            let message = err.user_message().unwrap_or_default();
            redirect_with(&flash, FlashLevel::Info, message, REQUEST_REFUND_PATH).await
        }
    }
}
