//! Refund requests over HTTP and the grant action.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::StatusCode;

use corner_shop_core::CurrencyCode;
use corner_shop_integration_tests::TestApp;
use corner_shop_storefront::db::{OrderRepository, RefundRepository};
use corner_shop_storefront::models::Order;
use corner_shop_storefront::payments::{ChargeId, MockPaymentGateway};
use corner_shop_storefront::services::{PaymentProcessor, RefundService};

/// Put an item in the cart over HTTP, then place the order directly.
async fn placed_order(app: &mut TestApp) -> Order {
    let user = app.sign_in("shopper@example.com").await;
    app.seed_item("linen-shirt", "30.00").await;
    app.post_form("/add-to-cart/linen-shirt", &[]).await;
    app.messages().await;

    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_charge()
        .return_once(|_| Ok(ChargeId::new("ch_refund")));
    PaymentProcessor::new(app.repo.clone(), Arc::new(gateway), CurrencyCode::USD)
        .charge(user, "tok_visa")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_refund_form_is_public() {
    let mut app = TestApp::without_payments();

    let response = app.get("/request-refund").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.json()["fields"],
        serde_json::json!(["ref_code", "message", "email"])
    );
}

#[tokio::test]
async fn test_unknown_ref_code() {
    let mut app = TestApp::without_payments();

    let response = app
        .post_form(
            "/request-refund",
            &[
                ("ref_code", "doesnotexist00000000"),
                ("message", "Wrong size"),
                ("email", "shopper@example.com"),
            ],
        )
        .await;
    assert_eq!(response.location(), Some("/request-refund"));
    assert_eq!(app.message_texts().await, vec!["This order does not exist."]);
}

#[tokio::test]
async fn test_invalid_email() {
    let mut app = TestApp::without_payments();
    let order = placed_order(&mut app).await;
    let ref_code = order.ref_code.unwrap();

    app.post_form(
        "/request-refund",
        &[
            ("ref_code", ref_code.as_str()),
            ("message", "Wrong size"),
            ("email", "not-an-email"),
        ],
    )
    .await;
    assert_eq!(
        app.message_texts().await,
        vec!["Please enter a valid email address."]
    );
    assert!(app.repo.refunds_for_order(order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_then_grant() {
    let mut app = TestApp::without_payments();
    let order = placed_order(&mut app).await;
    let ref_code = order.ref_code.clone().unwrap();

    let response = app
        .post_form(
            "/request-refund",
            &[
                ("ref_code", ref_code.as_str()),
                ("message", "Wrong size"),
                ("email", "shopper@example.com"),
            ],
        )
        .await;
    assert_eq!(response.location(), Some("/request-refund"));
    assert_eq!(app.message_texts().await, vec!["Your request was received."]);

    let requested = app
        .repo
        .get_order_by_ref_code(&ref_code)
        .await
        .unwrap()
        .unwrap();
    assert!(requested.refund_requested);
    assert!(!requested.refund_granted);
    let refunds = app.repo.refunds_for_order(order.id).await.unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0].reason, "Wrong size");

    let granted = RefundService::new(app.repo.clone())
        .grant(&[ref_code.clone(), "unknown".to_owned()])
        .await
        .unwrap();
    assert_eq!(granted, 1);

    let order = app
        .repo
        .get_order_by_ref_code(&ref_code)
        .await
        .unwrap()
        .unwrap();
    assert!(order.refund_granted);
    assert!(!order.refund_requested);
    assert!(
        app.repo
            .refunds_for_order(order.id)
            .await
            .unwrap()
            .iter()
            .all(|r| r.accepted)
    );
}
