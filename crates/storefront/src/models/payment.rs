//! Payment records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use corner_shop_core::{OrderItemId, PaymentId, UserId};

/// A successful gateway charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub id: PaymentId,
    /// Charge identifier returned by the gateway.
    pub charge_id: String,
    pub user_id: UserId,
    /// Charged amount in minor units.
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Parameters for recording a payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub charge_id: String,
    pub user_id: UserId,
    pub amount: i64,
    /// The cart lines `amount` was computed from.
    pub lines: Vec<ChargedLine>,
}

/// A cart line as it stood when the card was charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargedLine {
    pub order_item: OrderItemId,
    pub quantity: u32,
}
