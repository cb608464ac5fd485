//! Refund requests and grants.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use corner_shop_core::{Email, EmailError};

use crate::db::{Repository, RepositoryError};
use crate::models::{NewRefund, Refund, RefundRequestForm};

/// Message shown once a refund request is stored.
pub const REFUND_RECEIVED_MESSAGE: &str = "Your request was received.";

#[derive(Debug, Error)]
pub enum RefundError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("refund reason is empty")]
    EmptyReason,

    #[error("no order with reference code {0:?}")]
    OrderNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RefundError {
    /// Shopper-facing message for domain errors.
    #[must_use]
    pub const fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::InvalidEmail(_) => Some("Please enter a valid email address."),
            Self::EmptyReason => Some("Please tell us why you want a refund."),
            Self::OrderNotFound(_) => Some("This order does not exist."),
            Self::Repository(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct RefundService {
    repo: Arc<dyn Repository>,
}

impl RefundService {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Record a refund request against a placed order.
    ///
    /// # Errors
    ///
    /// `InvalidEmail`, `EmptyReason`, or `OrderNotFound` for an unknown
    /// reference code. No refund row is stored on error.
    #[instrument(skip(self, form), fields(ref_code = %form.ref_code.trim()))]
    pub async fn request(&self, form: RefundRequestForm) -> Result<Refund, RefundError> {
        let email = Email::parse(&form.email)?;
        let reason = form.message.trim();
        if reason.is_empty() {
            return Err(RefundError::EmptyReason);
        }

        let ref_code = form.ref_code.trim();
        let order = self
            .repo
            .get_order_by_ref_code(ref_code)
            .await?
            .ok_or_else(|| RefundError::OrderNotFound(ref_code.to_owned()))?;

        let refund = self
            .repo
            .request_refund(
                order.id,
                NewRefund {
                    reason: reason.to_owned(),
                    email,
                },
            )
            .await
            .map_err(|e| match e {
                // Only placed orders carry a reference code, but keep the
                // domain error if the row vanished in between.
                RepositoryError::NotFound => RefundError::OrderNotFound(ref_code.to_owned()),
                other => RefundError::Repository(other),
            })?;

        info!(order = %order.id, refund = %refund.id, "Refund requested");
        Ok(refund)
    }

    /// Grant refunds for the given reference codes.
    ///
    /// Returns the number of orders updated; unknown codes are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RefundError::Repository` if the update fails.
    #[instrument(skip(self))]
    pub async fn grant(&self, ref_codes: &[String]) -> Result<u64, RefundError> {
        let updated = self.repo.grant_refunds(ref_codes).await?;
        info!(updated, requested = ref_codes.len(), "Refunds granted");
        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use corner_shop_core::UserId;

    use super::*;
    use crate::db::{MemoryRepository, OrderRepository, PaymentRepository, RefundRepository};
    use crate::models::{NewPayment, Order};

    async fn placed_order(repo: &MemoryRepository, ref_code: &str) -> Order {
        let user = UserId::new(9);
        let order = repo.get_or_create_active_order(user, Utc::now()).await.unwrap();
        repo.place_order(
            order.id,
            NewPayment {
                charge_id: "ch_1".to_owned(),
                user_id: user,
                amount: 1000,
                lines: Vec::new(),
            },
            ref_code,
        )
        .await
        .unwrap()
    }

    fn form(ref_code: &str, message: &str, email: &str) -> RefundRequestForm {
        RefundRequestForm {
            ref_code: ref_code.to_owned(),
            message: message.to_owned(),
            email: email.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_request_flags_order_and_stores_refund() {
        let repo = Arc::new(MemoryRepository::new());
        let order = placed_order(&repo, "abc123").await;
        let service = RefundService::new(repo.clone());

        let refund = service
            .request(form(" abc123 ", "Wrong size", "shopper@example.com"))
            .await
            .unwrap();
        assert_eq!(refund.order_id, order.id);
        assert!(!refund.accepted);

        let order = repo.get_order_by_ref_code("abc123").await.unwrap().unwrap();
        assert!(order.refund_requested);
        assert_eq!(repo.refunds_for_order(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_ref_code_stores_nothing() {
        let repo = Arc::new(MemoryRepository::new());
        let order = placed_order(&repo, "abc123").await;
        let service = RefundService::new(repo.clone());

        let err = service
            .request(form("zzz", "Wrong size", "shopper@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RefundError::OrderNotFound(_)));
        assert!(repo.refunds_for_order(order.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation() {
        let service = RefundService::new(Arc::new(MemoryRepository::new()));

        let err = service
            .request(form("abc123", "Wrong size", "not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, RefundError::InvalidEmail(_)));

        let err = service
            .request(form("abc123", "   ", "shopper@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RefundError::EmptyReason));
    }

    #[tokio::test]
    async fn test_grant() {
        let repo = Arc::new(MemoryRepository::new());
        placed_order(&repo, "abc123").await;
        let service = RefundService::new(repo.clone());
        service
            .request(form("abc123", "Wrong size", "shopper@example.com"))
            .await
            .unwrap();

        let updated = service
            .grant(&["abc123".to_owned(), "unknown".to_owned()])
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let order = repo.get_order_by_ref_code("abc123").await.unwrap().unwrap();
        assert!(order.refund_granted);
        assert!(!order.refund_requested);
        let refunds = repo.refunds_for_order(order.id).await.unwrap();
        assert!(refunds.iter().all(|r| r.accepted));
    }
}
