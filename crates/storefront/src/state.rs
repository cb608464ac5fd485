//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Repository;
use crate::payments::PaymentGateway;
use crate::services::{CartService, CheckoutService, PaymentProcessor, RefundService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the repository and the services built on it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    repo: Arc<dyn Repository>,
    cart: CartService,
    checkout: CheckoutService,
    payments: PaymentProcessor,
    refunds: RefundService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `repo` - Repository backing every service
    /// * `gateway` - Payment gateway used for card charges
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        repo: Arc<dyn Repository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let payments = PaymentProcessor::new(repo.clone(), gateway, config.payments.currency);

        Self {
            inner: Arc::new(AppStateInner {
                cart: CartService::new(repo.clone()),
                checkout: CheckoutService::new(repo.clone()),
                refunds: RefundService::new(repo.clone()),
                payments,
                repo,
                config,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the repository.
    #[must_use]
    pub fn repo(&self) -> &dyn Repository {
        self.inner.repo.as_ref()
    }

    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    #[must_use]
    pub fn payments(&self) -> &PaymentProcessor {
        &self.inner.payments
    }

    #[must_use]
    pub fn refunds(&self) -> &RefundService {
        &self.inner.refunds
    }
}
