//! Domain models for the storefront.
//!
//! These types represent validated domain objects separate from database row
//! handling, which lives in [`crate::db`].

pub mod catalog;
pub mod checkout;
pub mod order;
pub mod payment;
pub mod refund;
pub mod session;
pub mod user;

pub use catalog::{Item, NewItem};
pub use checkout::{BillingAddress, CheckoutForm, Coupon, NewBillingAddress, NewCoupon};
pub use order::{Order, OrderItem, OrderLine, OrderSummary};
pub use payment::{ChargedLine, NewPayment, Payment};
pub use refund::{NewRefund, Refund, RefundRequestForm};
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::User;
