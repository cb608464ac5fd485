//! Order and order line types.
//!
//! An [`Order`] with `ordered == false` is the shopper's cart. It becomes a
//! placed order exactly once, when a payment succeeds, and from then on only
//! its refund flags change.

use chrono::{DateTime, Utc};
use serde::Serialize;

use corner_shop_core::{
    AddressId, CouponId, ItemId, Money, OrderId, OrderItemId, PaymentId, UserId,
};

use super::catalog::Item;
use super::checkout::{BillingAddress, Coupon};

/// A cart or placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    /// When the cart was started.
    pub ordered_date: DateTime<Utc>,
    /// `false` while this is the active cart, `true` once paid.
    pub ordered: bool,
    /// Reference code assigned when the order is placed.
    pub ref_code: Option<String>,
    pub billing_address_id: Option<AddressId>,
    pub coupon_id: Option<CouponId>,
    pub payment_id: Option<PaymentId>,
    pub refund_requested: bool,
    pub refund_granted: bool,
}

/// One item in a shopper's cart, with its quantity.
///
/// At most one unordered `OrderItem` exists per (user, item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub user_id: UserId,
    pub item_id: ItemId,
    /// The order this line is linked to, if any.
    pub order_id: Option<OrderId>,
    pub ordered: bool,
    pub quantity: u32,
}

/// An order item joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub order_item: OrderItem,
    pub item: Item,
}

impl OrderLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn total(&self) -> Money {
        self.item.price.times(self.order_item.quantity)
    }
}

/// Everything needed to show an order: lines, coupon and billing address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub coupon: Option<Coupon>,
    pub billing_address: Option<BillingAddress>,
}

impl OrderSummary {
    /// Sum of line totals. The coupon is not deducted.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(OrderLine::total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.order_item.quantity).sum()
    }

    /// Whether the order has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
