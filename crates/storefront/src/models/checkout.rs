//! Billing address and coupon types.

use serde::{Deserialize, Serialize};

use corner_shop_core::{AddressId, CouponId, Money, UserId};

/// A billing address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingAddress {
    pub id: AddressId,
    pub user_id: UserId,
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub country: String,
    pub zip: String,
}

/// Parameters for saving a billing address.
#[derive(Debug, Clone)]
pub struct NewBillingAddress {
    pub user_id: UserId,
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub country: String,
    pub zip: String,
}

/// Checkout form submission.
///
/// `payment_option` is kept as the raw submitted string; the checkout
/// service decides whether it names a supported payment path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub apartment_address: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub payment_option: String,
}

/// A discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Coupon {
    pub id: CouponId,
    /// Unique code entered by the shopper.
    pub code: String,
    /// Discount amount.
    pub amount: Money,
}

/// Parameters for creating a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub amount: Money,
}
