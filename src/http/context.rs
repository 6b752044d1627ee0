//! Per-request context shared by every lifecycle notification.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};

use crate::http::request::TenantRequest;
use crate::http::response::TenantResponse;
use crate::routing::tenant::Tenant;

/// Where a request is in its lifecycle.
///
/// ```text
/// Resolved → Started → Handling → Ended → Complete
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Resolved,
    Started,
    Handling,
    Ended,
    Complete,
}

/// The resolved tenant, the request and the response under construction.
#[derive(Debug)]
pub struct RequestContext {
    tenant: Arc<Tenant>,
    request: TenantRequest,
    response: TenantResponse,
    state: LifecycleState,
}

impl RequestContext {
    pub fn new(tenant: Arc<Tenant>, request: TenantRequest, response: TenantResponse) -> Self {
        Self {
            tenant,
            request,
            response,
            state: LifecycleState::Resolved,
        }
    }

    pub fn tenant(&self) -> &Arc<Tenant> {
        &self.tenant
    }

    pub fn request(&self) -> &TenantRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut TenantRequest {
        &mut self.request
    }

    pub fn response(&self) -> &TenantResponse {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut TenantResponse {
        &mut self.response
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: LifecycleState) {
        debug_assert!(next > self.state, "lifecycle moved backwards");
        self.state = next;
    }

    pub fn into_parts(self) -> (Arc<Tenant>, TenantRequest, TenantResponse) {
        (self.tenant, self.request, self.response)
    }
}

impl IntoResponse for RequestContext {
    fn into_response(self) -> Response {
        self.response.into_response()
    }
}
