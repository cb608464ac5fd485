//! Checkout and coupon routes.

use axum::http::StatusCode;

use corner_shop_integration_tests::TestApp;

const ADDRESS: [(&str, &str); 4] = [
    ("street_address", "1 Market Street"),
    ("apartment_address", ""),
    ("country", "US"),
    ("zip", "94105"),
];

fn form_with(option: &str) -> Vec<(&str, &str)> {
    let mut fields = ADDRESS.to_vec();
    fields.push(("payment_option", option));
    fields
}

async fn app_with_cart() -> TestApp {
    let mut app = TestApp::without_payments();
    app.sign_in("shopper@example.com").await;
    app.seed_item("linen-shirt", "30.00").await;
    app.post_form("/add-to-cart/linen-shirt", &[]).await;
    app.messages().await;
    app
}

#[tokio::test]
async fn test_checkout_without_cart() {
    let mut app = TestApp::without_payments();
    app.sign_in("shopper@example.com").await;

    let response = app.post_form("/checkout", &form_with("S")).await;
    assert_eq!(response.location(), Some("/order-summary"));
    assert_eq!(
        app.message_texts().await,
        vec!["You do not have an active order."]
    );

    let view = app.get("/checkout").await;
    assert_eq!(view.location(), Some("/"));
}

#[tokio::test]
async fn test_checkout_page_describes_form() {
    let mut app = app_with_cart().await;

    let view = app.get("/checkout").await;
    assert_eq!(view.status, StatusCode::OK);
    let body = view.json();
    assert_eq!(body["fields"].as_array().map(Vec::len), Some(5));
    assert_eq!(body["payment_options"][0]["value"], "S");
    assert_eq!(body["order"]["has_billing_address"], false);
}

#[tokio::test]
async fn test_checkout_success_goes_to_payment() {
    let mut app = app_with_cart().await;

    let response = app.post_form("/checkout", &form_with("S")).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/payment/stripe"));

    let response = app.post_form("/checkout", &form_with("paypal")).await;
    assert_eq!(response.location(), Some("/payment/paypal"));

    let body = app.get("/checkout").await.json();
    assert_eq!(body["order"]["has_billing_address"], true);
}

#[tokio::test]
async fn test_checkout_names_missing_field() {
    let mut app = app_with_cart().await;

    let fields = [
        ("street_address", "1 Market Street"),
        ("country", "US"),
        ("zip", "  "),
        ("payment_option", "S"),
    ];
    let response = app.post_form("/checkout", &fields).await;
    assert_eq!(response.location(), Some("/checkout"));
    assert_eq!(
        app.message_texts().await,
        vec!["Please fill in the zip field."]
    );
}

#[tokio::test]
async fn test_invalid_payment_option_keeps_address() {
    let mut app = app_with_cart().await;

    let response = app.post_form("/checkout", &form_with("bitcoin")).await;
    assert_eq!(response.location(), Some("/checkout"));

    let body = app.get("/checkout").await.json();
    assert_eq!(body["messages"][0]["text"], "Invalid payment option selected.");
    assert_eq!(body["order"]["has_billing_address"], true);
}

#[tokio::test]
async fn test_apply_coupon() {
    let mut app = app_with_cart().await;
    app.seed_coupon("SPRING", "5.00").await;

    let response = app.post_form("/add-coupon", &[("code", " SPRING ")]).await;
    assert_eq!(response.location(), Some("/checkout"));

    let body = app.get("/checkout").await.json();
    assert_eq!(body["messages"][0]["text"], "Successfully added coupon.");
    assert_eq!(body["order"]["coupon"]["code"], "SPRING");
}

#[tokio::test]
async fn test_unknown_coupon_is_not_fatal() {
    let mut app = app_with_cart().await;

    let response = app.post_form("/add-coupon", &[("code", "NOPE")]).await;
    assert_eq!(response.location(), Some("/checkout"));

    let messages = app.messages().await;
    assert_eq!(messages[0].text, "This coupon does not exist.");

    let body = app.get("/checkout").await.json();
    assert_eq!(body["order"]["coupon"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_payment_page_requires_billing_address() {
    let mut app = app_with_cart().await;

    let response = app.get("/payment/stripe").await;
    assert_eq!(response.location(), Some("/checkout"));
    assert_eq!(
        app.message_texts().await,
        vec!["You have not added a billing address."]
    );

    app.post_form("/checkout", &form_with("S")).await;
    let page = app.get("/payment/stripe").await;
    assert_eq!(page.status, StatusCode::OK);
    let body = page.json();
    assert_eq!(body["option"], "stripe");
    assert_eq!(body["order"]["lines"][0]["slug"], "linen-shirt");
}

#[tokio::test]
async fn test_payment_page_options() {
    let mut app = app_with_cart().await;

    let paypal = app.get("/payment/paypal").await;
    assert_eq!(paypal.location(), Some("/checkout"));

    let unknown = app.get("/payment/bitcoin").await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
