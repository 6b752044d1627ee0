use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::routing::tenant::{Port, Tenant};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub tenants: usize,
    pub active_tenants: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantStatus {
    pub name: String,
    pub display_name: String,
    pub hosts: Vec<String>,
    pub debug_hosts: Vec<String>,
    pub port: Port,
    pub path: Option<String>,
    pub active: bool,
    pub debug: bool,
}

impl From<&Tenant> for TenantStatus {
    fn from(tenant: &Tenant) -> Self {
        Self {
            name: tenant.name().to_string(),
            display_name: tenant.display_name().to_string(),
            hosts: tenant.hosts().to_vec(),
            debug_hosts: tenant.debug_hosts().to_vec(),
            port: tenant.port(),
            path: tenant.path().map(str::to_string),
            active: tenant.is_active(),
            debug: tenant.is_debug(),
        }
    }
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let tenants = state.registry.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        tenants: tenants.len(),
        active_tenants: tenants.iter().filter(|t| t.is_active()).count(),
    })
}

pub async fn get_tenants(State(state): State<AdminState>) -> Json<Vec<TenantStatus>> {
    let tenants = state.registry.snapshot();
    Json(tenants.iter().map(|t| TenantStatus::from(t.as_ref())).collect())
}

pub async fn enable_tenant(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<TenantStatus>, StatusCode> {
    set_active(&state, &name, true)
}

pub async fn disable_tenant(
    State(state): State<AdminState>,
    Path(name): Path<String>,
) -> Result<Json<TenantStatus>, StatusCode> {
    set_active(&state, &name, false)
}

fn set_active(state: &AdminState, name: &str, active: bool) -> Result<Json<TenantStatus>, StatusCode> {
    let changed = if active {
        state.registry.enable(name)
    } else {
        state.registry.disable(name)
    };
    if !changed {
        return Err(StatusCode::NOT_FOUND);
    }

    state
        .registry
        .get(name)
        .map(|t| Json(TenantStatus::from(t.as_ref())))
        .ok_or(StatusCode::NOT_FOUND)
}
