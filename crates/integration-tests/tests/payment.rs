//! Charging the cart through the payment routes.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use corner_shop_core::CurrencyCode;
use corner_shop_integration_tests::TestApp;
use corner_shop_storefront::db::OrderRepository;
use corner_shop_storefront::models::FlashLevel;
use corner_shop_storefront::payments::{ChargeId, Decline, GatewayError, MockPaymentGateway};

async fn checked_out(app: &mut TestApp) {
    app.sign_in("shopper@example.com").await;
    app.seed_item("linen-shirt", "30.00").await;
    app.post_form("/add-to-cart/linen-shirt", &[]).await;
    app.post_form("/add-to-cart/linen-shirt", &[]).await;
    app.post_form(
        "/checkout",
        &[
            ("street_address", "1 Market Street"),
            ("country", "US"),
            ("zip", "94105"),
            ("payment_option", "S"),
        ],
    )
    .await;
    app.messages().await;
}

#[tokio::test]
async fn test_successful_charge_places_order() {
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_charge()
        .once()
        .withf(|req| {
            req.amount == 6000 && req.currency == CurrencyCode::USD && req.source == "tok_visa"
        })
        .return_once(|_| Ok(ChargeId::new("ch_1")));
    let mut app = TestApp::new(gateway);
    checked_out(&mut app).await;

    let response = app
        .post_form("/payment/stripe", &[("stripeToken", "tok_visa")])
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/"));

    let messages = app.messages().await;
    assert_eq!(messages[0].level, FlashLevel::Success);
    assert_eq!(messages[0].text, "Your order was successful.");

    // The cart is gone; the next add starts a fresh one.
    assert_eq!(app.get("/order-summary").await.location(), Some("/"));
    app.messages().await;
    app.post_form("/add-to-cart/linen-shirt", &[]).await;
    let summary = app.get("/order-summary").await.json();
    assert_eq!(summary["lines"][0]["quantity"], 1);
    assert_eq!(summary["has_billing_address"], false);
}

#[tokio::test]
async fn test_declined_card_keeps_cart() {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_charge().once().return_once(|_| {
        Err(GatewayError::CardDeclined(Decline {
            message: "Your card was declined.".to_owned(),
            code: Some("card_declined".to_owned()),
            ..Decline::default()
        }))
    });
    let mut app = TestApp::new(gateway);
    checked_out(&mut app).await;

    let response = app
        .post_form("/payment/stripe", &[("stripeToken", "tok_chargeDeclined")])
        .await;
    assert_eq!(response.location(), Some("/"));

    let messages = app.messages().await;
    assert_eq!(messages[0].level, FlashLevel::Error);
    assert_eq!(messages[0].text, "Your card was declined.");

    let summary = app.get("/order-summary").await.json();
    assert_eq!(summary["lines"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_each_gateway_failure_has_its_own_message() {
    let cases = [
        (GatewayError::RateLimited, "Rate limit error."),
        (
            GatewayError::InvalidRequest("No such token".to_owned()),
            "Invalid parameters.",
        ),
        (GatewayError::Authentication, "Authentication error."),
        (
            GatewayError::Network("connection refused".to_owned()),
            "Network error.",
        ),
        (
            GatewayError::Api {
                status: 500,
                message: "boom".to_owned(),
            },
            "Something went wrong. You were not charged. Please try again.",
        ),
    ];

    for (error, expected) in cases {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_charge().once().return_once(move |_| Err(error));
        let mut app = TestApp::new(gateway);
        checked_out(&mut app).await;

        app.post_form("/payment/stripe", &[("stripeToken", "tok_visa")])
            .await;
        assert_eq!(app.message_texts().await, vec![expected]);
    }
}

#[tokio::test]
async fn test_charge_without_cart_skips_gateway() {
    let mut app = TestApp::without_payments();
    let user = app.sign_in("shopper@example.com").await;

    let response = app
        .post_form("/payment/stripe", &[("stripeToken", "tok_visa")])
        .await;
    assert_eq!(response.location(), Some("/"));
    assert_eq!(
        app.message_texts().await,
        vec!["You do not have an active order."]
    );
    assert!(app.repo.get_active_order(user).await.unwrap().is_none());
}

#[tokio::test]
async fn test_paypal_charge_is_unavailable() {
    let mut app = TestApp::without_payments();
    checked_out(&mut app).await;

    let response = app
        .post_form("/payment/paypal", &[("stripeToken", "tok_visa")])
        .await;
    assert_eq!(response.location(), Some("/"));
    let messages = app.messages().await;
    assert_eq!(messages[0].level, FlashLevel::Warning);
}
