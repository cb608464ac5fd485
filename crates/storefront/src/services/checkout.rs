//! Checkout: billing address, payment option and coupons.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use corner_shop_core::{PaymentOption, UserId};

use crate::db::{Repository, RepositoryError};
use crate::models::{CheckoutForm, Coupon, NewBillingAddress, Order};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("no active order")]
    NoActiveOrder,

    /// A required address field was blank.
    #[error("missing address field: {0}")]
    InvalidAddress(&'static str),

    #[error("invalid payment option: {0:?}")]
    InvalidPaymentOption(String),

    #[error("coupon not found: {0:?}")]
    CouponNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CheckoutError {
    /// Shopper-facing message for domain errors.
    #[must_use]
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::NoActiveOrder => Some("You do not have an active order.".to_owned()),
            Self::InvalidAddress(field) => Some(format!("Please fill in the {field} field.")),
            Self::InvalidPaymentOption(_) => Some("Invalid payment option selected.".to_owned()),
            Self::CouponNotFound(_) => Some("This coupon does not exist.".to_owned()),
            Self::Repository(_) => None,
        }
    }
}

/// Checkout steps that run before payment.
#[derive(Clone)]
pub struct CheckoutService {
    repo: Arc<dyn Repository>,
}

impl CheckoutService {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    async fn active_order(&self, user: UserId) -> Result<Order, CheckoutError> {
        self.repo
            .get_active_order(user)
            .await?
            .ok_or(CheckoutError::NoActiveOrder)
    }

    /// Save the billing address on the user's cart and pick a payment path.
    ///
    /// The address is attached before the payment option is checked, so an
    /// unsupported option still leaves the address on the order.
    ///
    /// # Errors
    ///
    /// - `NoActiveOrder` when the user has no cart (nothing is saved)
    /// - `InvalidAddress` naming the first blank required field
    /// - `InvalidPaymentOption` for an unrecognised option
    #[instrument(skip(self, form), fields(user = %user))]
    pub async fn submit(
        &self,
        user: UserId,
        form: CheckoutForm,
    ) -> Result<PaymentOption, CheckoutError> {
        let order = self.active_order(user).await?;
        let address = validate_address(user, &form)?;

        let saved = self.repo.add_billing_address(order.id, address).await?;
        info!(order = %order.id, address = %saved.id, "Billing address attached");

        form.payment_option
            .parse::<PaymentOption>()
            .map_err(|_| CheckoutError::InvalidPaymentOption(form.payment_option))
    }

    /// Attach a coupon to the user's cart, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `NoActiveOrder` or `CouponNotFound`.
    #[instrument(skip(self), fields(user = %user))]
    pub async fn apply_coupon(&self, user: UserId, code: &str) -> Result<Coupon, CheckoutError> {
        let order = self.active_order(user).await?;
        let code = code.trim();
        let coupon = self
            .repo
            .get_coupon_by_code(code)
            .await?
            .ok_or_else(|| CheckoutError::CouponNotFound(code.to_owned()))?;

        self.repo.attach_coupon(order.id, coupon.id).await?;
        info!(order = %order.id, coupon = %coupon.code, "Coupon applied");
        Ok(coupon)
    }
}

fn required(value: &str, field: &'static str) -> Result<String, CheckoutError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CheckoutError::InvalidAddress(field));
    }
    Ok(trimmed.to_owned())
}

fn validate_address(user: UserId, form: &CheckoutForm) -> Result<NewBillingAddress, CheckoutError> {
    Ok(NewBillingAddress {
        user_id: user,
        street_address: required(&form.street_address, "street address")?,
        apartment_address: form
            .apartment_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_owned),
        country: required(&form.country, "country")?,
        zip: required(&form.zip, "zip")?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db::{CheckoutRepository, MemoryRepository, OrderRepository};
    use crate::models::NewCoupon;

    const USER: UserId = UserId::new(3);

    fn form(option: &str) -> CheckoutForm {
        CheckoutForm {
            street_address: " 1 Main St ".to_owned(),
            apartment_address: Some("  ".to_owned()),
            country: "US".to_owned(),
            zip: "10001".to_owned(),
            payment_option: option.to_owned(),
        }
    }

    async fn with_cart() -> (CheckoutService, Arc<MemoryRepository>, Order) {
        let repo = Arc::new(MemoryRepository::new());
        let order = repo.get_or_create_active_order(USER, Utc::now()).await.unwrap();
        (CheckoutService::new(repo.clone()), repo, order)
    }

    #[tokio::test]
    async fn test_submit_without_order_saves_nothing() {
        let repo = Arc::new(MemoryRepository::new());
        let service = CheckoutService::new(repo.clone());

        let err = service.submit(USER, form("S")).await.unwrap_err();
        assert!(matches!(err, CheckoutError::NoActiveOrder));
        assert!(repo.get_active_order(USER).await.unwrap().is_none());
        assert!(
            repo.get_billing_address(corner_shop_core::AddressId::new(1))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_submit_attaches_trimmed_address() {
        let (service, repo, _order) = with_cart().await;

        let option = service.submit(USER, form("stripe")).await.unwrap();
        assert_eq!(option, PaymentOption::Stripe);

        let order = repo.get_active_order(USER).await.unwrap().unwrap();
        let address = repo
            .get_billing_address(order.billing_address_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(address.street_address, "1 Main St");
        assert_eq!(address.apartment_address, None);
        assert_eq!(address.user_id, USER);
    }

    #[tokio::test]
    async fn test_submit_blank_field() {
        let (service, repo, _order) = with_cart().await;
        let mut bad = form("S");
        bad.zip = "   ".to_owned();

        let err = service.submit(USER, bad).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidAddress("zip")));
        assert_eq!(err.user_message().unwrap(), "Please fill in the zip field.");
        let order = repo.get_active_order(USER).await.unwrap().unwrap();
        assert!(order.billing_address_id.is_none());
    }

    #[tokio::test]
    async fn test_submit_unknown_option_keeps_address() {
        let (service, repo, _order) = with_cart().await;

        let err = service.submit(USER, form("bitcoin")).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidPaymentOption(ref o) if o == "bitcoin"));
        let order = repo.get_active_order(USER).await.unwrap().unwrap();
        assert!(order.billing_address_id.is_some());
    }

    #[tokio::test]
    async fn test_submit_paypal() {
        let (service, _repo, _order) = with_cart().await;
        assert_eq!(
            service.submit(USER, form("P")).await.unwrap(),
            PaymentOption::PayPal
        );
    }

    #[tokio::test]
    async fn test_apply_coupon() {
        let (service, repo, _order) = with_cart().await;
        repo.create_coupon(NewCoupon {
            code: "SPRING10".to_owned(),
            amount: "10.00".parse().unwrap(),
        })
        .await
        .unwrap();

        let coupon = service.apply_coupon(USER, " SPRING10 ").await.unwrap();
        let attached = repo.get_active_order(USER).await.unwrap().map(|o| o.coupon_id);
        assert_eq!(attached, Some(Some(coupon.id)));

        let err = service.apply_coupon(USER, "NOPE").await.unwrap_err();
        assert!(matches!(err, CheckoutError::CouponNotFound(_)));
    }

    #[tokio::test]
    async fn test_apply_coupon_without_order() {
        let repo = Arc::new(MemoryRepository::new());
        let service = CheckoutService::new(repo);
        assert!(matches!(
            service.apply_coupon(USER, "SPRING10").await,
            Err(CheckoutError::NoActiveOrder)
        ));
    }
}
