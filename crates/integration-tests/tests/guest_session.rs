//! A guest shopping session over HTTP: the cart and lens selection live in
//! the session, so none of this needs a database.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::json;

use eyeric_core::LensKind;
use eyeric_integration_tests::{TestClient, catalog_app, frame, json_body, lens, text_body};

async fn app() -> axum::Router {
    let mut sunglasses = frame(2, "Wayfarer Shade", 1799);
    sunglasses.type_category = vec!["Sunglasses".to_string()];

    catalog_app(
        vec![frame(1, "Aviator Gold", 2499), sunglasses],
        vec![
            lens(3, LensKind::SingleVision, 800),
            lens(4, LensKind::ZeroPower, 500),
        ],
    )
    .await
}

async fn client() -> TestClient {
    TestClient::new(app().await)
}

async fn cart_count(client: &mut TestClient) -> serde_json::Value {
    let response = client.get("/cart/count").await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["count"].clone()
}

#[tokio::test]
async fn test_guest_cart_lives_in_the_session() {
    let mut client = client().await;

    let response = client
        .post_form("/cart/add", "product_id=2&quantity=2&return_to=/cart")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart");
    assert_eq!(cart_count(&mut client).await, 2);

    // Same frame again merges into the existing line.
    client.post_form("/cart/add", "product_id=2").await;
    assert_eq!(cart_count(&mut client).await, 3);

    let page = text_body(client.get("/cart").await).await;
    assert!(page.contains("Wayfarer Shade"));

    client.post_form("/cart/update", "index=0&quantity=1").await;
    assert_eq!(cart_count(&mut client).await, 1);

    client.post_form("/cart/clear", "").await;
    assert_eq!(cart_count(&mut client).await, 0);
}

#[tokio::test]
async fn test_guest_carts_are_not_shared() {
    let app = app().await;
    let mut first = TestClient::new(app.clone());
    let mut second = TestClient::new(app);

    first.post_form("/cart/add", "product_id=2").await;
    assert_eq!(cart_count(&mut first).await, 1);
    assert_eq!(cart_count(&mut second).await, 0);
}

#[tokio::test]
async fn test_adding_unknown_product_is_not_found() {
    let mut client = client().await;

    let response = client.post_form("/cart/add", "product_id=99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(cart_count(&mut client).await, 0);
}

#[tokio::test]
async fn test_completed_lens_flow_lands_in_the_cart() {
    let mut client = client().await;

    let response = client
        .post_json("/api/lens-flow/start", &json!({ "product_id": 1 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["step"], "choosing lens category");
    assert_eq!(
        body["kinds"],
        json!(["single vision", "zero power", "frame only"])
    );

    let body = json_body(
        client
            .post_json(
                "/api/lens-flow/event",
                &json!({ "type": "select_category", "kind": "single vision" }),
            )
            .await,
    )
    .await;
    assert_eq!(body["step"], "choosing lens");
    assert_eq!(body["lenses"].as_array().unwrap().len(), 1);
    assert_eq!(body["lenses"][0]["id"], 3);

    let body = json_body(
        client
            .post_json(
                "/api/lens-flow/event",
                &json!({ "type": "select_lens", "lens_id": 3 }),
            )
            .await,
    )
    .await;
    assert_eq!(body["step"], "choosing power method");

    let response = client
        .post_json(
            "/api/lens-flow/event",
            &json!({ "type": "choose_power_method", "method": "submit-later" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["step"], "done");
    assert_eq!(body["cart_count"], 1);

    // The finished flow is cleared and the line shows on the product page.
    assert_eq!(json_body(client.get("/api/lens-flow").await).await["step"], "idle");
    assert_eq!(cart_count(&mut client).await, 1);
    let page = text_body(client.get("/product/1").await).await;
    assert!(page.contains("This frame is in your cart"));
}

#[tokio::test]
async fn test_lens_of_another_kind_is_rejected() {
    let mut client = client().await;
    client
        .post_json("/api/lens-flow/start", &json!({ "product_id": 1 }))
        .await;
    client
        .post_json(
            "/api/lens-flow/event",
            &json!({ "type": "select_category", "kind": "single vision" }),
        )
        .await;

    let response = client
        .post_json(
            "/api/lens-flow/event",
            &json!({ "type": "select_lens", "lens_id": 4 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(client.get("/api/lens-flow").await).await;
    assert_eq!(body["step"], "choosing lens");
    assert_eq!(cart_count(&mut client).await, 0);
}

#[tokio::test]
async fn test_sunglasses_go_straight_to_the_cart() {
    let mut client = client().await;

    let body = json_body(
        client
            .post_json("/api/lens-flow/start", &json!({ "product_id": 2 }))
            .await,
    )
    .await;
    assert_eq!(body["step"], "done");
    assert_eq!(body["cart_count"], 1);

    let page = text_body(client.get("/product/1").await).await;
    assert!(!page.contains("This frame is in your cart"));
}

#[tokio::test]
async fn test_tampered_session_cookie_starts_a_new_session() {
    let mut client = client().await;
    client.post_form("/cart/add", "product_id=2").await;
    assert_eq!(cart_count(&mut client).await, 1);

    let cookie = client.cookie().unwrap().to_string();
    assert!(cookie.starts_with("eyeric_session="));

    // Change the last character of the signed value.
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    client.set_cookie(&tampered);

    assert_eq!(cart_count(&mut client).await, 0);
}
