//! Business logic services for the storefront.
//!
//! # Services
//!
//! - [`cart`] - Add, remove and decrement cart lines; cart summary
//! - [`checkout`] - Billing address, payment option and coupon
//! - [`payments`] - Charge the active order and place it
//! - [`refunds`] - Refund requests and staff grants
//!
//! Services hold an `Arc<dyn Repository>` and return a `thiserror` enum per
//! service. Every domain failure carries a shopper-facing message; the HTTP
//! layer turns it into a flash message and a redirect.

pub mod cart;
pub mod checkout;
pub mod payments;
pub mod refunds;

pub use cart::{CartError, CartOutcome, CartService};
pub use checkout::{CheckoutError, CheckoutService};
pub use payments::{PAYMENT_SUCCESS_MESSAGE, PaymentError, PaymentProcessor};
pub use refunds::{REFUND_RECEIVED_MESSAGE, RefundError, RefundService};
