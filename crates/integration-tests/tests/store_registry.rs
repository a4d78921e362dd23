//! Connecting, listing and disconnecting stores.

use axum::http::{Method, StatusCode};
use serde_json::json;

use shopseo_integration_tests::{FakeShopify, TestApp};
use shopseo_server::services::ServiceError;

#[tokio::test]
async fn test_bare_shop_name_gets_myshopify_suffix() {
    let app = TestApp::new().await;

    let store = app
        .state
        .stores()
        .connect(app.user.id, "  https://Acme/admin  ", FakeShopify::VALID_TOKEN)
        .await
        .unwrap();

    assert_eq!(store.store_url.as_str(), "acme.myshopify.com");
    assert_eq!(store.store_name.as_deref(), Some("Acme Outfitters"));
    assert_eq!(store.store_owner.as_deref(), Some("Robin Reyes"));
}

#[tokio::test]
async fn test_suffixed_url_is_kept() {
    let app = TestApp::new().await;

    let store = app
        .state
        .stores()
        .connect(app.user.id, "outfitters-co.myshopify.com", FakeShopify::VALID_TOKEN)
        .await
        .unwrap();

    assert_eq!(store.store_url.as_str(), "outfitters-co.myshopify.com");
}

#[tokio::test]
async fn test_rejected_token_is_invalid_credentials() {
    let app = TestApp::new().await;

    let result = app
        .state
        .stores()
        .connect(app.user.id, "acme", "shpat_wrong")
        .await;

    assert!(matches!(result, Err(ServiceError::InvalidCredentials)));
    assert!(app.state.stores().list(app.user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_over_http() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/stores",
            Some(json!({ "store_url": "acme", "access_token": FakeShopify::VALID_TOKEN })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["store_url"], "acme.myshopify.com");
    assert!(body.get("access_token").is_none());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/stores",
            Some(json!({ "store_url": "acme.myshopify.com", "access_token": FakeShopify::VALID_TOKEN })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .request(
            Method::POST,
            "/api/stores",
            Some(json!({ "store_url": "-bad-", "access_token": FakeShopify::VALID_TOKEN })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app
        .request(
            Method::POST,
            "/api/stores",
            Some(json!({ "store_url": "other-shop", "access_token": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_disconnect_removes_store_and_its_analyses() {
    let app = TestApp::new().await;
    app.shopify
        .add_product(shopseo_integration_tests::product(1, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;
    app.state
        .analysis()
        .analyze(app.user.id, store.id, 1)
        .await
        .unwrap();

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/stores/{}", store.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, stores) = app.request(Method::GET, "/api/stores", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stores, json!([]));

    let result = app.state.analysis().list(app.user.id, store.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/stores/{}", store.id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stores_are_private_to_their_owner() {
    let app = TestApp::new().await;
    let store = app.connect_store().await;

    let other = app
        .state
        .profiles()
        .create_user("someone@else.test")
        .await
        .unwrap();

    let listed = app.state.stores().list(other.profile.id).await.unwrap();
    assert!(listed.is_empty());

    let result = app.state.stores().disconnect(other.profile.id, store.id).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}
