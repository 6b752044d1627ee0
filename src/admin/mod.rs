//! Admin API.
//!
//! Read tenant state and flip tenants on or off at runtime. Every route
//! requires `Authorization: Bearer <api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::routing::TenantRegistry;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<TenantRegistry>,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/tenants", get(get_tenants))
        .route("/admin/tenants/{name}/enable", post(enable_tenant))
        .route("/admin/tenants/{name}/disable", post(disable_tenant))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
