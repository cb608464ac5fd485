//! Flash message endpoint.

use axum::Json;

use crate::error::Result;
use crate::middleware::Flash;
use crate::models::FlashMessage;

/// Return and clear every queued flash message.
pub async fn drain(flash: Flash) -> Result<Json<Vec<FlashMessage>>> {
    Ok(Json(flash.drain().await?))
}
