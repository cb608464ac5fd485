//! Catalog and health endpoints.

use axum::http::StatusCode;

use corner_shop_integration_tests::TestApp;

#[tokio::test]
async fn test_health_and_readiness() {
    let mut app = TestApp::without_payments();

    let live = app.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(&live.body[..], b"ok");

    let ready = app.get("/health/ready").await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_index_lists_items_with_links() {
    let mut app = TestApp::without_payments();
    app.seed_item("linen-shirt", "30.00").await;
    app.seed_item("running-tee", "19.99").await;

    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    let items = body["items"].as_array().expect("items array");
    assert_eq!(items.len(), 2);
    assert_eq!(body["messages"], serde_json::json!([]));

    let shirt = items
        .iter()
        .find(|i| i["slug"] == "linen-shirt")
        .expect("linen-shirt listed");
    assert_eq!(shirt["url"], "/product/linen-shirt");
    assert_eq!(shirt["add_to_cart_url"], "/add-to-cart/linen-shirt");
    assert_eq!(shirt["category"], "shirt");
}

#[tokio::test]
async fn test_product_detail() {
    let mut app = TestApp::without_payments();
    app.seed_item("linen-shirt", "30.00").await;

    let response = app.get("/product/linen-shirt").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["item"]["title"], "linen shirt");
}

#[tokio::test]
async fn test_unknown_or_malformed_slug_is_404() {
    let mut app = TestApp::without_payments();

    assert_eq!(app.get("/product/missing").await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get("/product/Not%20A%20Slug").await.status,
        StatusCode::NOT_FOUND
    );
}
