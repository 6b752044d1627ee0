//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use tenant_router::config::TenantSettings;
use tenant_router::http::LifecyclePhase;
use tenant_router::routing::{EnvDefaults, Tenant, TenantRegistry};

/// Settings for a tenant bound to `host` on `port`.
pub fn tenant_settings(name: &str, host: &str, port: u16) -> TenantSettings {
    TenantSettings {
        host: Some(host.into()),
        port: Some(port.into()),
        ..TenantSettings::named(name)
    }
}

/// A registry with fixed env defaults holding `tenants` in order.
pub fn registry_with(tenants: Vec<TenantSettings>) -> Arc<TenantRegistry> {
    let registry = Arc::new(TenantRegistry::new(EnvDefaults::default()));
    for settings in tenants {
        registry
            .load(settings, &TenantSettings::default())
            .unwrap();
    }
    registry
}

/// Answer every request with `<tenant> <url>` and a debug marker.
pub fn echo(tenant: &Tenant) {
    tenant.hooks().on(LifecyclePhase::HandleRequest, |ctx| {
        let marker = if ctx.request().is_debug() { " debug" } else { "" };
        let line = format!("{} {}{}", ctx.tenant().name(), ctx.request().url(), marker);
        ctx.response_mut().text(line);
        Ok(())
    });
}

/// Attach [`echo`] to every registered tenant.
pub fn echo_all(registry: &TenantRegistry) {
    for tenant in registry.snapshot().iter() {
        echo(tenant);
    }
}

pub fn get(host: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, host)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Write `<root>/<name>/settings.toml`.
pub fn write_tenant(root: &Path, name: &str, toml: &str) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("settings.toml"), toml).unwrap();
}
