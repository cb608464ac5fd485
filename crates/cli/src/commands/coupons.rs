//! Coupon commands.

use corner_shop_core::Money;
use corner_shop_storefront::db::CheckoutRepository;
use corner_shop_storefront::models::NewCoupon;

use super::{CommandError, repository};

/// Create a coupon code.
pub async fn create(code: &str, amount: Money) -> Result<(), CommandError> {
    let repo = repository().await?;
    let coupon = repo
        .create_coupon(NewCoupon {
            code: code.trim().to_owned(),
            amount,
        })
        .await?;
    tracing::info!(id = %coupon.id, code = %coupon.code, amount = %coupon.amount, "Coupon created");
    Ok(())
}
