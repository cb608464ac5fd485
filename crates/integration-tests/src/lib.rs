//! Integration tests for Corner Shop.
//!
//! The storefront router runs in process over a [`MemoryRepository`], a
//! mocked payment gateway and tower-sessions' `MemoryStore`. Requests go
//! through `tower::ServiceExt::oneshot`; [`TestApp`] carries the session
//! cookie between requests like a browser would.
//!
//! A signed-in shopper is simulated with the `x-test-user` header
//! (`<id>:<email>`), which a test-only middleware copies into the session.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p corner-shop-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::Request,
    http::{self, HeaderMap, Method, StatusCode, header},
    middleware::{Next, from_fn},
    response::Response,
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use corner_shop_core::{Category, CurrencyCode, Email, Label, Slug, UserId};
use corner_shop_storefront::config::{PaymentsConfig, StorefrontConfig};
use corner_shop_storefront::db::{CheckoutRepository, ItemRepository, MemoryRepository, UserRepository};
use corner_shop_storefront::middleware::{session_layer, set_current_user};
use corner_shop_storefront::models::{CurrentUser, FlashMessage, Item, NewCoupon, NewItem};
use corner_shop_storefront::payments::MockPaymentGateway;
use corner_shop_storefront::routes;
use corner_shop_storefront::state::AppState;

/// Header naming the simulated signed-in shopper.
pub const TEST_USER_HEADER: &str = "x-test-user";

/// Storefront configuration for tests. Nothing here is contacted.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/corner_shop_test"),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "http://localhost:3000".to_owned(),
        payments: PaymentsConfig {
            secret_key: SecretString::from("sk_test_4eC39HqLyjWDarjtT1zdp7dc"),
            api_base: "http://127.0.0.1:9".to_owned(),
            currency: CurrencyCode::USD,
            timeout: Duration::from_secs(1),
        },
        sentry_dsn: None,
        sentry_environment: "test".to_owned(),
    }
}

/// Copy the `x-test-user` header into the session.
async fn test_login(session: Session, request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get(TEST_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(':'))
        .and_then(|(id, email)| {
            Some(CurrentUser {
                id: UserId::new(id.parse().ok()?),
                email: Email::parse(email).ok()?,
            })
        });

    if let Some(user) = user {
        set_current_user(&session, &user)
            .await
            .expect("session insert");
    }
    next.run(request).await
}

/// A response with its body collected.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// The redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }
}

/// The storefront router with an in-memory backend and a cookie jar of one.
pub struct TestApp {
    router: Router,
    pub repo: Arc<MemoryRepository>,
    cookie: Option<String>,
    user: Option<CurrentUser>,
}

impl TestApp {
    /// Build the app around a configured gateway mock.
    #[must_use]
    pub fn new(gateway: MockPaymentGateway) -> Self {
        let config = test_config();
        let repo = Arc::new(MemoryRepository::new());
        let sessions = session_layer(MemoryStore::default(), &config.base_url);
        let state = AppState::new(config, repo.clone(), Arc::new(gateway));

        let router = routes::routes()
            .layer(from_fn(test_login))
            .layer(sessions)
            .with_state(state);

        Self {
            router,
            repo,
            cookie: None,
            user: None,
        }
    }

    /// Build the app with a gateway that must not be called.
    #[must_use]
    pub fn without_payments() -> Self {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_charge().never();
        Self::new(gateway)
    }

    /// Create a shopper and sign in as them for the following requests.
    pub async fn sign_in(&mut self, email: &str) -> UserId {
        let email = Email::parse(email).expect("valid email");
        let user = self.repo.create_user(&email).await.expect("create user");
        self.user = Some(CurrentUser {
            id: user.id,
            email: user.email,
        });
        user.id
    }

    /// Stop sending the signed-in header.
    pub fn sign_out(&mut self) {
        self.user = None;
    }

    pub async fn seed_item(&self, slug: &str, price: &str) -> Item {
        self.repo
            .create_item(NewItem {
                slug: Slug::parse(slug).expect("valid slug"),
                title: slug.replace('-', " "),
                price: price.parse().expect("valid price"),
                category: Category::Shirt,
                label: Label::Primary,
                description: None,
            })
            .await
            .expect("create item")
    }

    pub async fn seed_coupon(&self, code: &str, amount: &str) {
        self.repo
            .create_coupon(NewCoupon {
                code: code.to_owned(),
                amount: amount.parse().expect("valid amount"),
            })
            .await
            .expect("create coupon");
    }

    async fn send(&mut self, mut request: http::Request<Body>) -> TestResponse {
        let headers = request.headers_mut();
        if let Some(cookie) = &self.cookie {
            headers.insert(header::COOKIE, cookie.parse().expect("cookie header"));
        }
        if let Some(user) = &self.user {
            let value = format!("{}:{}", user.id, user.email);
            headers.insert(TEST_USER_HEADER, value.parse().expect("user header"));
        }

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            let pair = set_cookie.split(';').next().unwrap_or_default();
            self.cookie = Some(pair.to_owned());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    /// GET with `Accept: application/json`.
    pub async fn get_json(&mut self, path: &str) -> TestResponse {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    /// POST an urlencoded form.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = http::Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    /// Drain the queued flash messages.
    pub async fn messages(&mut self) -> Vec<FlashMessage> {
        let response = self.get("/messages").await;
        assert_eq!(response.status, StatusCode::OK);
        serde_json::from_slice(&response.body).expect("flash messages")
    }

    /// Texts of the queued flash messages.
    pub async fn message_texts(&mut self) -> Vec<String> {
        self.messages()
            .await
            .into_iter()
            .map(|m| m.text)
            .collect()
    }
}
