//! Request lifecycle dispatch.
//!
//! # Data Flow
//! ```text
//! Resolved tenant + request + response
//!     → start-request subscribers
//!     → handle-request subscribers (write the response)
//!     → end-request subscribers
//!     → request teardown hook (if any)
//!     → access log + metrics
//!     → completion callback
//! ```
//!
//! # Design Decisions
//! - Fully synchronous: one request's phases never interleave
//! - Subscriber failures are returned, not caught; the embedding listener
//!   decides how to answer
//! - A failure skips every later step, including the completion callback

use std::sync::Arc;
use std::time::Instant;

use crate::http::context::{LifecycleState, RequestContext};
use crate::http::events::{HandlerError, LifecyclePhase};
use crate::http::request::TenantRequest;
use crate::http::response::TenantResponse;
use crate::observability::metrics;
use crate::routing::tenant::Tenant;

/// A lifecycle subscriber failed while handling a request.
#[derive(Debug, thiserror::Error)]
#[error("tenant {tenant} failed during {phase}: {source}")]
pub struct DispatchError {
    pub tenant: String,
    pub phase: LifecyclePhase,
    #[source]
    pub source: HandlerError,
}

fn entered(phase: LifecyclePhase) -> LifecycleState {
    match phase {
        LifecyclePhase::StartRequest => LifecycleState::Started,
        LifecyclePhase::HandleRequest => LifecycleState::Handling,
        LifecyclePhase::EndRequest => LifecycleState::Ended,
    }
}

/// Run the full lifecycle for a resolved request, then hand the context to
/// `completion`.
pub fn handle_request<F, T>(
    tenant: &Arc<Tenant>,
    request: TenantRequest,
    response: TenantResponse,
    completion: F,
) -> Result<T, DispatchError>
where
    F: FnOnce(RequestContext) -> T,
{
    let start_time = Instant::now();
    let mut ctx = RequestContext::new(Arc::clone(tenant), request, response);

    for phase in LifecyclePhase::ALL {
        ctx.advance(entered(phase));
        if let Err(source) = tenant.hooks().emit(phase, &mut ctx) {
            metrics::record_dispatch_failure(tenant.name(), phase);
            return Err(DispatchError {
                tenant: tenant.name().to_string(),
                phase,
                source,
            });
        }
    }

    ctx.request_mut().teardown();

    let status = ctx.response().status().as_u16();
    tracing::info!(
        tenant = %tenant.name(),
        url = %ctx.request().url(),
        status,
        debug = ctx.request().is_debug(),
        request_id = ctx.request().request_id().unwrap_or("-"),
        "Request handled"
    );
    metrics::record_request(tenant.name(), status, start_time);

    ctx.advance(LifecycleState::Complete);
    Ok(completion(ctx))
}

/// Run the lifecycle and return the finished context.
pub fn dispatch(
    tenant: &Arc<Tenant>,
    request: TenantRequest,
    response: TenantResponse,
) -> Result<RequestContext, DispatchError> {
    handle_request(tenant, request, response, |ctx| ctx)
}

/// Chain-friendly variant: requests the tenant's binding rejects go to
/// `next` untouched; everything else is dispatched.
pub fn middleware<N, F, T>(
    tenant: &Arc<Tenant>,
    mut request: TenantRequest,
    response: TenantResponse,
    next: N,
    completion: F,
) -> Result<T, DispatchError>
where
    N: FnOnce(TenantRequest, TenantResponse) -> T,
    F: FnOnce(RequestContext) -> T,
{
    let Some(matched) = tenant.can_handle(&request.target()) else {
        return Ok(next(request, response));
    };
    request.set_debug(matched.is_debug());
    handle_request(tenant, request, response, completion)
}
