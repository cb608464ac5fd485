//! Refund administration.
//!
//! ```bash
//! cs-cli refunds grant <REF_CODE>...
//! ```
//!
//! Marks each matching placed order as refund granted, clears its pending
//! request and accepts its refund rows. Unknown codes are reported and
//! skipped.

use std::sync::Arc;

use corner_shop_storefront::services::RefundService;

use super::{CommandError, repository};

/// Grant refunds for the given reference codes.
pub async fn grant(ref_codes: &[String]) -> Result<(), CommandError> {
    let service = RefundService::new(Arc::new(repository().await?));
    let updated = service.grant(ref_codes).await?;

    let requested = u64::try_from(ref_codes.len()).unwrap_or(u64::MAX);
    if updated < requested {
        tracing::warn!(
            updated,
            requested,
            "Some reference codes did not match a placed order"
        );
    }
    tracing::info!(updated, "Refunds granted");
    Ok(())
}
