//! Applying, bulk-applying and reverting optimizations.

use axum::http::{Method, StatusCode};
use serde_json::json;

use shopseo_core::EntityType;
use shopseo_core::seo::{IssueType, OptimizationField};
use shopseo_integration_tests::{TestApp, product};
use shopseo_server::services::{ApplyRequest, ServiceError};
use shopseo_server::shopify::{Page, SeoMetafields};

fn meta_description(product_id: i64, suggestion: &str) -> ApplyRequest {
    ApplyRequest {
        entity_type: EntityType::Product,
        entity_id: product_id,
        field: OptimizationField::MetaDescription,
        suggestion: suggestion.to_string(),
        optimization_type: IssueType::Description,
    }
}

#[tokio::test]
async fn test_apply_records_one_history_entry() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(5, "Organic Cotton Tee Shirt"));
    app.shopify.set_seo(
        EntityType::Product,
        5,
        SeoMetafields {
            title_tag: None,
            description_tag: Some("Cotton tee.".to_string()),
        },
    );
    let store = app.connect_store().await;
    let request = meta_description(5, "Breathable organic cotton tee with a relaxed fit.");

    let record = app
        .state
        .optimizer()
        .apply(app.user.id, store.id, &request)
        .await
        .unwrap();

    assert_eq!(record.new_value, request.suggestion);
    assert_eq!(record.original_value, "Cotton tee.");
    assert_eq!(record.applied_by, app.user.id);
    assert!(record.reverted_at.is_none());
    assert_eq!(
        app.shopify
            .seo(EntityType::Product, 5)
            .description_tag
            .as_deref(),
        Some(request.suggestion.as_str())
    );

    let history = app.state.history().list(app.user.id, store.id).await.unwrap();
    assert_eq!(history, vec![record]);
}

#[tokio::test]
async fn test_duplicate_apply_is_rejected_without_remote_write() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(5, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;
    let request = meta_description(5, "Breathable organic cotton tee with a relaxed fit.");

    app.state
        .optimizer()
        .apply(app.user.id, store.id, &request)
        .await
        .unwrap();
    let second = app
        .state
        .optimizer()
        .apply(app.user.id, store.id, &request)
        .await;

    assert!(matches!(second, Err(ServiceError::DuplicateState(_))));
    assert_eq!(app.shopify.writes().len(), 1);
    assert_eq!(
        app.state
            .history()
            .list(app.user.id, store.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_revert_restores_remote_value_once() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(5, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;
    let analysis = app
        .state
        .analysis()
        .analyze(app.user.id, store.id, 5)
        .await
        .unwrap();
    let optimization = analysis
        .result
        .optimizations
        .iter()
        .find(|o| o.field == OptimizationField::ImageAlt { image_id: 50 })
        .unwrap()
        .clone();

    let (status, applied) = app
        .request(
            Method::POST,
            &format!("/api/stores/{}/optimizations", store.id),
            Some(json!({
                "entity_id": 5,
                "field": "image_alt:50",
                "original": "not what the store holds",
                "suggestion": optimization.suggestion,
                "optimization_type": "image"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{applied}");
    assert_eq!(applied["original_value"], optimization.original);
    assert_eq!(
        app.shopify.product(5).unwrap().images[0].alt.as_deref(),
        Some(optimization.suggestion.as_str())
    );

    let stored = app.state.analysis().list(app.user.id, store.id).await.unwrap();
    assert!(
        stored[0]
            .result
            .find(optimization.field, &optimization.suggestion)
            .unwrap()
            .applied
    );

    let revert_uri = format!("/api/history/{}/revert", applied["id"]);
    let (status, reverted) = app.request(Method::POST, &revert_uri, None).await;
    assert_eq!(status, StatusCode::OK, "{reverted}");
    assert!(!reverted["reverted_at"].is_null());
    assert_eq!(reverted["new_value"], applied["new_value"]);
    assert_eq!(reverted["applied_at"], applied["applied_at"]);
    assert_eq!(app.shopify.product(5).unwrap().images[0].alt, None);

    let (status, _) = app.request(Method::POST, &revert_uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(app.shopify.writes().len(), 2);

    // The suggestion can be applied again after a revert.
    let stored = app.state.analysis().list(app.user.id, store.id).await.unwrap();
    assert!(
        !stored[0]
            .result
            .find(optimization.field, &optimization.suggestion)
            .unwrap()
            .applied
    );
    let (status, _) = app
        .request(
            Method::POST,
            &format!("/api/stores/{}/optimizations", store.id),
            Some(json!({
                "entity_id": 5,
                "field": "image_alt:50",
                "suggestion": optimization.suggestion,
                "optimization_type": "image"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, history) = app
        .request(Method::GET, &format!("/api/stores/{}/history", store.id), None)
        .await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_revert_without_analysis_restores_live_title() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(5, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;

    let (status, applied) = app
        .request(
            Method::POST,
            &format!("/api/stores/{}/optimizations", store.id),
            Some(json!({
                "entity_id": 5,
                "field": "title",
                "suggestion": "Organic Cotton Tee Shirt - Apparel",
                "optimization_type": "title"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{applied}");
    assert_eq!(applied["original_value"], "Organic Cotton Tee Shirt");
    assert_eq!(
        app.shopify.product(5).unwrap().title,
        "Organic Cotton Tee Shirt - Apparel"
    );

    let (status, reverted) = app
        .request(
            Method::POST,
            &format!("/api/history/{}/revert", applied["id"]),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{reverted}");
    assert_eq!(app.shopify.product(5).unwrap().title, "Organic Cotton Tee Shirt");
}

#[tokio::test]
async fn test_apply_to_unknown_page_is_not_found_without_write() {
    let app = TestApp::new().await;
    app.shopify.add_page(Page {
        id: 7,
        title: "About".to_string(),
        handle: "about".to_string(),
        body_html: None,
    });
    let store = app.connect_store().await;
    let request = ApplyRequest {
        entity_type: EntityType::Page,
        entity_id: 8,
        field: OptimizationField::Title,
        suggestion: "About Acme Outfitters".to_string(),
        optimization_type: IssueType::Title,
    };

    let result = app.state.optimizer().apply(app.user.id, store.id, &request).await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert!(app.shopify.writes().is_empty());
    assert!(app.state.history().list(app.user.id, store.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_remote_write_leaves_no_history() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(5, "Organic Cotton Tee Shirt"));
    app.shopify.fail_writes_to(5);
    let store = app.connect_store().await;

    let result = app
        .state
        .optimizer()
        .apply(app.user.id, store.id, &meta_description(5, "New copy for the tee."))
        .await;

    assert!(matches!(result, Err(ServiceError::RemoteApi(_))));
    assert!(app.state.history().list(app.user.id, store.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_isolates_failing_product() {
    let app = TestApp::new().await;
    for id in 1..=3 {
        app.shopify.add_product(product(id, &format!("Organic Cotton Tee No {id}")));
    }
    app.shopify.fail_writes_to(2);
    let store = app.connect_store().await;
    for id in 1..=3 {
        app.state
            .analysis()
            .analyze(app.user.id, store.id, id)
            .await
            .unwrap();
    }

    let (status, report) = app
        .request(
            Method::POST,
            &format!("/api/stores/{}/optimizations/bulk", store.id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total"], 3);

    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    for result in results {
        if result["product_id"] == 2 {
            assert_eq!(result["success"], false);
            assert!(result["error"].as_str().unwrap().contains("422"));
        } else {
            assert_eq!(result["success"], true, "{result}");
            assert!(result.get("error").is_none());
        }
    }

    // Products 1 and 3 have nothing pending left, product 2 still does.
    let report = app
        .state
        .optimizer()
        .bulk_optimize(app.user.id, store.id)
        .await
        .unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.results[0].product_id, 2);
}

#[tokio::test]
async fn test_revert_of_someone_elses_record_is_not_found() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(5, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;
    let record = app
        .state
        .optimizer()
        .apply(app.user.id, store.id, &meta_description(5, "New copy for the tee."))
        .await
        .unwrap();

    let other = app
        .state
        .profiles()
        .create_user("intruder@else.test")
        .await
        .unwrap();
    let result = app.state.history().revert(other.profile.id, record.id).await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
    assert_eq!(app.shopify.writes().len(), 1);
}

#[tokio::test]
async fn test_revert_during_storage_outage_is_not_reported_missing() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(5, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;
    let record = app
        .state
        .optimizer()
        .apply(app.user.id, store.id, &meta_description(5, "New copy for the tee."))
        .await
        .unwrap();

    app.repo.take_stores_offline();
    let result = app.state.history().revert(app.user.id, record.id).await;

    assert!(matches!(result, Err(ServiceError::Database(_))));
    assert_eq!(app.shopify.writes().len(), 1);
}
