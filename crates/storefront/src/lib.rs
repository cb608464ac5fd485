//! Corner Shop storefront library.
//!
//! Catalog, cart, checkout, card payments and refund requests over axum and
//! `PostgreSQL`. The binary in `main.rs` wires configuration, the database
//! and the Stripe gateway into [`app`]; tests build the same router over a
//! [`db::MemoryRepository`] and a mocked gateway.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use state::AppState;

/// Build the storefront router with sessions, request ids and tracing.
///
/// Layers run outermost first: trace span, request id, session, handler.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes()
        .layer(sessions)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
        .with_state(state)
}
