//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Handlers read the session through the [`RequireAuth`] and [`Flash`]
//! extractors.

pub mod auth;
pub mod flash;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, RequireAuth, set_current_user};
pub use flash::Flash;
pub use request_id::{RequestId, make_request_span, request_id_middleware};
pub use session::{create_session_layer, migrate_session_store, session_layer};
