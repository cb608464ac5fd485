//! Charging the cart and placing the order.
//!
//! The processor computes the charge from the cart's line items, asks the
//! gateway to charge the card, and only then records the payment and flips
//! the order to placed. A failed charge leaves every row untouched.

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use corner_shop_core::{CurrencyCode, Money, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::{ChargedLine, NewPayment, Order, OrderLine};
use crate::payments::{ChargeRequest, Decline, GatewayError, PaymentGateway};

/// Length of an order reference code.
pub const REF_CODE_LENGTH: usize = 20;

const REF_CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Why a charge attempt did not place the order.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("no active order")]
    NoActiveOrder,

    #[error("order has no items")]
    EmptyOrder,

    #[error("card declined: {}", .0.message)]
    CardDeclined(Decline),

    #[error("rate limited")]
    RateLimited,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("gateway authentication failed")]
    Authentication,

    #[error("network error: {0}")]
    Network(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    /// Anything outside the gateway's own failure categories, including a
    /// local failure after the card was charged.
    #[error("unclassified payment failure: {0}")]
    Unclassified(String),
}

impl From<GatewayError> for PaymentError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::CardDeclined(decline) => Self::CardDeclined(decline),
            GatewayError::RateLimited => Self::RateLimited,
            GatewayError::InvalidRequest(message) => Self::InvalidRequest(message),
            GatewayError::Authentication => Self::Authentication,
            GatewayError::Network(message) => Self::Network(message),
            GatewayError::Api { status, message } => Self::Gateway(format!("{status}: {message}")),
        }
    }
}

impl From<RepositoryError> for PaymentError {
    fn from(error: RepositoryError) -> Self {
        Self::Unclassified(error.to_string())
    }
}

impl PaymentError {
    /// Shopper-facing message. Every category has its own.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoActiveOrder => "You do not have an active order.".to_owned(),
            Self::EmptyOrder => "Your cart is empty.".to_owned(),
            Self::CardDeclined(decline) => decline.message.clone(),
            Self::RateLimited => "Rate limit error.".to_owned(),
            Self::InvalidRequest(_) => "Invalid parameters.".to_owned(),
            Self::Authentication => "Authentication error.".to_owned(),
            Self::Network(_) => "Network error.".to_owned(),
            Self::Gateway(_) => {
                "Something went wrong. You were not charged. Please try again.".to_owned()
            }
            Self::Unclassified(_) => "A system error occurred. We have been notified.".to_owned(),
        }
    }
}

/// Message shown after a successful charge.
pub const PAYMENT_SUCCESS_MESSAGE: &str = "Your order was successful.";

/// Charges a user's cart through the configured gateway.
#[derive(Clone)]
pub struct PaymentProcessor {
    repo: Arc<dyn Repository>,
    gateway: Arc<dyn PaymentGateway>,
    currency: CurrencyCode,
}

impl PaymentProcessor {
    #[must_use]
    pub fn new(
        repo: Arc<dyn Repository>,
        gateway: Arc<dyn PaymentGateway>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            repo,
            gateway,
            currency,
        }
    }

    /// Charge the user's cart with a card token and place the order.
    ///
    /// The amount is the sum of the line totals; an attached coupon is not
    /// deducted. Only the lines that made up the amount are placed. A line
    /// added while the charge is in flight stays in the shopper's next cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`]; no order or payment row changes on error.
    #[instrument(skip(self, token), fields(user = %user))]
    pub async fn charge(&self, user: UserId, token: &str) -> Result<Order, PaymentError> {
        let order = self
            .repo
            .get_active_order(user)
            .await?
            .ok_or(PaymentError::NoActiveOrder)?;

        let lines = self.repo.order_lines(order.id).await?;
        if lines.is_empty() {
            return Err(PaymentError::EmptyOrder);
        }

        let subtotal: Money = lines.iter().map(OrderLine::total).sum();
        let amount = subtotal
            .to_minor_units()
            .map_err(|e| PaymentError::Unclassified(e.to_string()))?;

        let token = token.trim();
        if token.is_empty() {
            return Err(PaymentError::InvalidRequest("missing card token".to_owned()));
        }

        let charge = self
            .gateway
            .charge(ChargeRequest {
                amount,
                currency: self.currency,
                source: token.to_owned(),
            })
            .await
            .inspect_err(|e| warn!(order = %order.id, error = %e, "Charge failed"))?;

        let ref_code = generate_ref_code();
        let payment = NewPayment {
            charge_id: charge.as_str().to_owned(),
            user_id: user,
            amount,
            lines: lines
                .iter()
                .map(|line| ChargedLine {
                    order_item: line.order_item.id,
                    quantity: line.order_item.quantity,
                })
                .collect(),
        };

        let placed = self
            .repo
            .place_order(order.id, payment, &ref_code)
            .await
            .inspect_err(|e| {
                // The card has been charged but the order is still a cart.
                error!(
                    order = %order.id,
                    charge_id = %charge,
                    amount,
                    error = %e,
                    "Charged card but failed to place order"
                );
            })?;

        info!(order = %placed.id, ref_code = %ref_code, amount, "Order placed");
        Ok(placed)
    }
}

/// Generate a random order reference code of lowercase letters and digits.
#[must_use]
pub fn generate_ref_code() -> String {
    let mut rng = rand::rng();
    (0..REF_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..REF_CODE_CHARSET.len());
            REF_CODE_CHARSET.get(idx).copied().map_or('0', char::from)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use corner_shop_core::{Category, ItemId, Label, OrderItemId, PaymentId, Slug};

    use super::*;
    use crate::db::{ItemRepository, MemoryRepository, OrderRepository, PaymentRepository};
    use crate::models::{Item, NewItem};
    use crate::payments::{ChargeId, MockPaymentGateway};

    const USER: UserId = UserId::new(5);

    async fn seed_item(repo: &MemoryRepository, slug: &str, price: &str) -> Item {
        repo.create_item(NewItem {
            slug: Slug::parse(slug).unwrap(),
            title: slug.to_owned(),
            price: price.parse().unwrap(),
            category: Category::SportWear,
            label: Label::Primary,
            description: None,
        })
        .await
        .unwrap()
    }

    /// A cart holding two units at 19.99 and one at 5.00.
    async fn cart(repo: &MemoryRepository) -> Order {
        let order = repo.get_or_create_active_order(USER, Utc::now()).await.unwrap();
        for (slug, price, quantity) in [("tee", "19.99", 2), ("socks", "5.00", 1)] {
            let item = seed_item(repo, slug, price).await;
            let line = repo.get_or_create_order_item(USER, item.id).await.unwrap();
            repo.link_order_item(order.id, line.id).await.unwrap();
            for _ in 1..quantity {
                repo.increment_quantity(line.id).await.unwrap();
            }
        }
        order
    }

    fn processor(repo: Arc<MemoryRepository>, gateway: MockPaymentGateway) -> PaymentProcessor {
        PaymentProcessor::new(repo, Arc::new(gateway), CurrencyCode::USD)
    }

    /// What the shopper does in another tab while the card is being charged.
    enum CartEdit {
        Add(ItemId),
        Increment(OrderItemId),
    }

    /// Approves every charge, applying a cart edit before it answers.
    struct EditingGateway {
        repo: Arc<MemoryRepository>,
        edit: CartEdit,
    }

    #[async_trait]
    impl PaymentGateway for EditingGateway {
        async fn charge(&self, _request: ChargeRequest) -> Result<ChargeId, GatewayError> {
            match self.edit {
                CartEdit::Add(item) => {
                    let order = self.repo.get_active_order(USER).await.unwrap().unwrap();
                    let line = self.repo.get_or_create_order_item(USER, item).await.unwrap();
                    self.repo.link_order_item(order.id, line.id).await.unwrap();
                }
                CartEdit::Increment(line) => {
                    self.repo.increment_quantity(line).await.unwrap();
                }
            }
            Ok(ChargeId::new("ch_edit"))
        }
    }

    fn editing_processor(repo: Arc<MemoryRepository>, edit: CartEdit) -> PaymentProcessor {
        let gateway = EditingGateway {
            repo: repo.clone(),
            edit,
        };
        PaymentProcessor::new(repo, Arc::new(gateway), CurrencyCode::USD)
    }

    #[test]
    fn test_ref_code_shape() {
        let code = generate_ref_code();
        assert_eq!(code.len(), REF_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(code, generate_ref_code());
    }

    #[tokio::test]
    async fn test_successful_charge_places_order() {
        let repo = Arc::new(MemoryRepository::new());
        let order = cart(&repo).await;

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_charge()
            .once()
            .withf(|req| {
                req.amount == 4498 && req.currency == CurrencyCode::USD && req.source == "tok_visa"
            })
            .return_once(|_| Ok(ChargeId::new("ch_123")));

        let placed = processor(repo.clone(), gateway)
            .charge(USER, "tok_visa")
            .await
            .unwrap();

        assert_eq!(placed.id, order.id);
        assert!(placed.ordered);
        let ref_code = placed.ref_code.clone().unwrap();
        assert_eq!(ref_code.len(), REF_CODE_LENGTH);

        let payment = repo
            .get_payment(placed.payment_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.charge_id, "ch_123");
        assert_eq!(payment.amount, 4498);

        let lines = repo.order_lines(order.id).await.unwrap();
        assert!(lines.iter().all(|l| l.order_item.ordered));
        assert!(repo.get_active_order(USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_declined_charge_mutates_nothing() {
        let repo = Arc::new(MemoryRepository::new());
        let order = cart(&repo).await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_charge().once().return_once(|_| {
            Err(GatewayError::CardDeclined(Decline {
                message: "Your card was declined.".to_owned(),
                ..Decline::default()
            }))
        });

        let err = processor(repo.clone(), gateway)
            .charge(USER, "tok_chargeDeclined")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Your card was declined.");

        let still_cart = repo.get_active_order(USER).await.unwrap().unwrap();
        assert_eq!(still_cart, order);
        let lines = repo.order_lines(order.id).await.unwrap();
        assert!(lines.iter().all(|l| !l.order_item.ordered));
    }

    #[tokio::test]
    async fn test_item_added_during_charge_stays_in_next_cart() {
        let repo = Arc::new(MemoryRepository::new());
        let order = cart(&repo).await;
        let coat = seed_item(&repo, "coat", "500.00").await;

        let placed = editing_processor(repo.clone(), CartEdit::Add(coat.id))
            .charge(USER, "tok_visa")
            .await
            .unwrap();
        assert_eq!(placed.id, order.id);

        let payment = repo
            .get_payment(placed.payment_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.amount, 4498);

        let lines = repo.order_lines(order.id).await.unwrap();
        let placed_total: Money = lines.iter().map(OrderLine::total).sum();
        assert_eq!(placed_total.to_minor_units().unwrap(), payment.amount);
        assert!(lines.iter().all(|l| l.order_item.ordered));
        assert!(lines.iter().all(|l| l.order_item.item_id != coat.id));

        // The coat line is still unordered and joins the next cart.
        let coat_line = repo.get_or_create_order_item(USER, coat.id).await.unwrap();
        assert!(!coat_line.ordered);
        assert_eq!(coat_line.order_id, None);
    }

    #[tokio::test]
    async fn test_failed_placement_after_charge_leaves_cart() {
        let repo = Arc::new(MemoryRepository::new());
        let order = cart(&repo).await;
        let lines = repo.order_lines(order.id).await.unwrap();
        let socks = lines.last().unwrap().order_item.id;

        let err = editing_processor(repo.clone(), CartEdit::Increment(socks))
            .charge(USER, "tok_visa")
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Unclassified(_)));
        assert_eq!(
            err.user_message(),
            "A system error occurred. We have been notified."
        );

        let still_cart = repo.get_active_order(USER).await.unwrap().unwrap();
        assert_eq!(still_cart, order);
        assert_eq!(still_cart.payment_id, None);
        let lines = repo.order_lines(order.id).await.unwrap();
        assert!(lines.iter().all(|l| !l.order_item.ordered));

        // Ids are handed out from one sequence, so any payment row would be
        // among the first few.
        for id in 1..=32 {
            assert!(repo.get_payment(PaymentId::new(id)).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_no_active_order_skips_gateway() {
        let repo = Arc::new(MemoryRepository::new());
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_charge().never();

        let err = processor(repo, gateway).charge(USER, "tok_visa").await.unwrap_err();
        assert!(matches!(err, PaymentError::NoActiveOrder));
    }

    #[tokio::test]
    async fn test_empty_cart_skips_gateway() {
        let repo = Arc::new(MemoryRepository::new());
        repo.get_or_create_active_order(USER, Utc::now()).await.unwrap();
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_charge().never();

        let err = processor(repo, gateway).charge(USER, "tok_visa").await.unwrap_err();
        assert!(matches!(err, PaymentError::EmptyOrder));
    }

    #[tokio::test]
    async fn test_blank_token_skips_gateway() {
        let repo = Arc::new(MemoryRepository::new());
        cart(&repo).await;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_charge().never();

        let err = processor(repo, gateway).charge(USER, "  ").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid parameters.");
    }

    #[test]
    fn test_each_gateway_failure_has_its_own_message() {
        let errors = [
            GatewayError::CardDeclined(Decline {
                message: "Insufficient funds.".to_owned(),
                ..Decline::default()
            }),
            GatewayError::RateLimited,
            GatewayError::InvalidRequest("bad".to_owned()),
            GatewayError::Authentication,
            GatewayError::Network("timeout".to_owned()),
            GatewayError::Api {
                status: 500,
                message: "boom".to_owned(),
            },
        ];
        let mut messages: Vec<String> = errors
            .into_iter()
            .map(|e| PaymentError::from(e).user_message())
            .collect();
        messages.push(PaymentError::Unclassified("x".to_owned()).user_message());

        assert_eq!(
            messages,
            [
                "Insufficient funds.",
                "Rate limit error.",
                "Invalid parameters.",
                "Authentication error.",
                "Network error.",
                "Something went wrong. You were not charged. Please try again.",
                "A system error occurred. We have been notified.",
            ]
        );
    }
}
