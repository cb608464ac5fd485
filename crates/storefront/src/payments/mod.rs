//! Payment gateway client.
//!
//! The storefront charges cards through a [`PaymentGateway`]. Production uses
//! [`StripeGateway`]; tests use the generated `MockPaymentGateway`.

pub mod gateway;
pub mod stripe;

pub use gateway::{ChargeId, ChargeRequest, Decline, GatewayError, MockPaymentGateway, PaymentGateway};
pub use stripe::StripeGateway;
