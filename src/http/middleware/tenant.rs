//! Tenant middleware.
//!
//! Mounts a single tenant in front of an existing axum stack: requests the
//! tenant's binding accepts run through its lifecycle, everything else goes
//! to the next layer with its body intact. Bodies are buffered up to
//! `max_body_bytes` before matching, for passed-through requests too.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::dispatch;
use crate::http::request::TenantRequest;
use crate::http::response::TenantResponse;
use crate::routing::tenant::Tenant;

/// State for [`tenant_middleware`].
#[derive(Clone)]
pub struct TenantLayerState {
    pub tenant: Arc<Tenant>,
    pub max_body_bytes: usize,
}

enum Outcome {
    Handled(Response),
    Passed(TenantRequest),
}

pub async fn tenant_middleware(
    State(state): State<TenantLayerState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
    };

    let outcome = dispatch::middleware(
        &state.tenant,
        TenantRequest::new(parts, body),
        TenantResponse::new(),
        |request, _| Outcome::Passed(request),
        |ctx| Outcome::Handled(ctx.into_response()),
    );

    match outcome {
        Ok(Outcome::Handled(response)) => response,
        Ok(Outcome::Passed(request)) => {
            let (parts, body) = request.into_parts();
            next.run(Request::from_parts(parts, Body::from(body))).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Tenant lifecycle failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
