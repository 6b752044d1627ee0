//! Admin API over the in-process router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use tenant_router::admin::{setup_admin_router, AdminState};
use tenant_router::routing::TenantRegistry;

mod common;

const KEY: &str = "test-admin-key";

fn app(registry: Arc<TenantRegistry>) -> axum::Router {
    setup_admin_router(AdminState {
        registry,
        api_key: Arc::from(KEY),
    })
}

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", KEY))
        .body(Body::empty())
        .unwrap()
}

async fn json(response: axum::response::Response) -> Value {
    serde_json::from_str(&common::body_string(response).await).unwrap()
}

#[tokio::test]
async fn rejects_missing_or_wrong_key() {
    let app = app(common::registry_with(vec![]));

    let response = app
        .clone()
        .oneshot(Request::get("/admin/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::get("/admin/status")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn status_counts_active_tenants() {
    let registry = common::registry_with(vec![
        common::tenant_settings("blog", "blog", 80),
        common::tenant_settings("shop", "shop", 80),
    ]);
    registry.disable("shop");

    let response = app(registry).oneshot(authed("GET", "/admin/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body["tenants"], 2);
    assert_eq!(body["active_tenants"], 1);
}

#[tokio::test]
async fn lists_tenants_in_registry_order() {
    let registry = common::registry_with(vec![
        common::tenant_settings("blog", "blog", 80),
        common::tenant_settings("shop", "shop", 8080),
    ]);

    let response = app(registry).oneshot(authed("GET", "/admin/tenants")).await.unwrap();
    let body = json(response).await;
    let tenants = body.as_array().unwrap();
    assert_eq!(tenants.len(), 2);
    assert_eq!(tenants[0]["name"], "blog");
    assert_eq!(tenants[1]["port"], 8080);
    assert_eq!(tenants[1]["hosts"][0], "shop");
    assert_eq!(tenants[1]["active"], true);
}

#[tokio::test]
async fn enable_and_disable_flip_active() {
    let registry = common::registry_with(vec![common::tenant_settings("blog", "blog", 80)]);
    let app = app(Arc::clone(&registry));

    let response = app
        .clone()
        .oneshot(authed("POST", "/admin/tenants/blog/disable"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["active"], false);
    assert!(!registry.get("blog").unwrap().is_active());

    let response = app
        .oneshot(authed("POST", "/admin/tenants/blog/enable"))
        .await
        .unwrap();
    assert_eq!(json(response).await["active"], true);
    assert!(registry.get("blog").unwrap().is_active());
}

#[tokio::test]
async fn unknown_tenant_is_404() {
    let app = app(common::registry_with(vec![]));
    let response = app
        .oneshot(authed("POST", "/admin/tenants/ghost/enable"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
