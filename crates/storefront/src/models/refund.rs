//! Refund request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use corner_shop_core::{Email, OrderId, RefundId};

/// A shopper's request to refund a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub reason: String,
    pub email: Email,
    /// Set when staff grant the refund.
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

/// Parameters for recording a refund request.
#[derive(Debug, Clone)]
pub struct NewRefund {
    pub reason: String,
    pub email: Email,
}

/// Refund request form submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundRequestForm {
    #[serde(default)]
    pub ref_code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub email: String,
}
