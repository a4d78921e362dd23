//! Website audits and payload schema upgrades.

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use shopseo_core::AuditId;
use shopseo_core::audit::AUDIT_SCHEMA_VERSION;
use shopseo_integration_tests::{TestApp, product};
use shopseo_server::db::AuditRepository;
use shopseo_server::models::StoredAudit;
use shopseo_server::services::upgrade_stored_audits;
use shopseo_server::shopify::{Blog, Page};

fn v1_payload() -> Value {
    json!({
        "score": 64,
        "issues": [
            {"category": "meta", "severity": "high", "title": "Missing descriptions",
             "description": "Products have no meta description", "impact_score": 20}
        ],
        "optimizations": [
            {"category": "meta", "title": "Write descriptions",
             "description": "Add a meta description to every product", "impact_score": 20}
        ],
        "meta": {"pages_count": 2, "blogs_count": 1, "articles_count": 4, "products_count": 12}
    })
}

fn seeded_audit(id: i32, store_id: shopseo_core::StoreId) -> StoredAudit {
    StoredAudit {
        id: AuditId::new(id),
        store_id,
        created_at: Utc::now() - Duration::days(1),
        payload: v1_payload(),
        schema_version: 1,
    }
}

#[tokio::test]
async fn test_run_audit_stores_current_schema() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(1, "Organic Cotton Tee Shirt"));
    app.shopify.add_page(Page {
        id: 10,
        title: "About".to_string(),
        handle: "about".to_string(),
        body_html: Some("<p>We make shirts.</p>".to_string()),
    });
    app.shopify.add_blog(
        Blog {
            id: 20,
            title: "News".to_string(),
            handle: "news".to_string(),
        },
        3,
    );
    let store = app.connect_store().await;

    let (status, audit) = app
        .request(Method::POST, &format!("/api/stores/{}/audits", store.id), None)
        .await;

    assert_eq!(status, StatusCode::CREATED, "{audit}");
    assert_eq!(audit["schema_version"], AUDIT_SCHEMA_VERSION);
    assert_eq!(audit["meta"]["products_count"], 1);
    assert_eq!(audit["meta"]["pages_count"], 1);
    assert_eq!(audit["meta"]["blogs_count"], 1);
    assert_eq!(audit["meta"]["articles_count"], 3);
    let score = audit["score"].as_u64().unwrap();
    assert!(score <= 100);
    for issue in audit["issues"].as_array().unwrap() {
        assert!(issue["id"].is_string());
    }
}

#[tokio::test]
async fn test_history_upgrades_old_rows_once() {
    let app = TestApp::new().await;
    let store = app.connect_store().await;
    app.repo.put_raw_audit(seeded_audit(99, store.id));

    let first = app.state.audits().history(app.user.id, store.id).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].schema_version, AUDIT_SCHEMA_VERSION);
    assert_eq!(first[0].score, 64);
    assert_eq!(first[0].meta.articles_count, 4);

    // Ids assigned on the first read are persisted and stay stable.
    assert!(
        app.repo
            .list_audits_below_version(AUDIT_SCHEMA_VERSION)
            .await
            .unwrap()
            .is_empty()
    );
    let second = app.state.audits().history(app.user.id, store.id).await.unwrap();
    assert_eq!(second[0].issues[0].id, first[0].issues[0].id);
    assert_eq!(second[0].optimizations[0].id, first[0].optimizations[0].id);
}

#[tokio::test]
async fn test_bulk_upgrade_rewrites_only_old_rows() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(1, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;
    app.state.audits().run(app.user.id, store.id).await.unwrap();
    app.repo.put_raw_audit(seeded_audit(98, store.id));
    app.repo.put_raw_audit(seeded_audit(99, store.id));

    let upgraded = upgrade_stored_audits(app.repo.as_ref()).await.unwrap();
    assert_eq!(upgraded, 2);
    assert_eq!(upgrade_stored_audits(app.repo.as_ref()).await.unwrap(), 0);

    let (status, history) = app
        .request(Method::GET, &format!("/api/stores/{}/audits", store.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 3);
    // Newest first: the audit run just now precedes the seeded ones.
    assert_eq!(history[0]["meta"]["products_count"], 1);
}

#[tokio::test]
async fn test_history_skips_unreadable_row() {
    let app = TestApp::new().await;
    app.shopify.add_product(product(1, "Organic Cotton Tee Shirt"));
    let store = app.connect_store().await;
    app.state.audits().run(app.user.id, store.id).await.unwrap();

    // Claims the current schema but its issues never got ids.
    let mut broken = seeded_audit(99, store.id);
    broken.schema_version = AUDIT_SCHEMA_VERSION;
    app.repo.put_raw_audit(broken);

    let (status, history) = app
        .request(Method::GET, &format!("/api/stores/{}/audits", store.id), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{history}");
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["meta"]["products_count"], 1);
}
