//! Gateway abstraction.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;

use corner_shop_core::CurrencyCode;

/// Identifier of a successful charge, as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChargeId(String);

impl ChargeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChargeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single card charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    /// Amount in minor units (cents).
    pub amount: i64,
    pub currency: CurrencyCode,
    /// Card token produced by the gateway's client-side library.
    pub source: String,
}

/// Details the gateway attaches to a declined card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decline {
    /// Human-readable reason, safe to show to the shopper.
    pub message: String,
    pub code: Option<String>,
    pub decline_code: Option<String>,
    pub param: Option<String>,
}

/// Why a charge failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The card was declined.
    #[error("card declined: {}", .0.message)]
    CardDeclined(Decline),

    /// Too many requests hit the gateway too quickly.
    #[error("rate limited by payment gateway")]
    RateLimited,

    /// The request had invalid parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The gateway rejected our credentials.
    #[error("payment gateway authentication failed")]
    Authentication,

    /// The gateway could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// Any other gateway-side failure.
    #[error("payment gateway error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Charges a card.
#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submit a charge and return the gateway's charge id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] describing why the charge failed. A failed
    /// charge leaves the card uncharged.
    async fn charge(&self, request: ChargeRequest) -> Result<ChargeId, GatewayError>;
}
