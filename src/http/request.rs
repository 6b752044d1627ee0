//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract routing-relevant information (host, URL)
//! - Carry the buffered request through the tenant lifecycle
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body is buffered before dispatch so subscribers stay synchronous
//! - The debug flag is per request; the tenant only mirrors the last match

use axum::body::Bytes;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::matcher::RequestTarget;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a fresh UUID v4 for every request lacking an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Host a request is addressed to: `Host` header, else the URI authority.
pub fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> &'a str {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("")
}

/// Path and query of a request URI.
pub fn request_url(uri: &Uri) -> &str {
    uri.path_and_query().map_or("/", |pq| pq.as_str())
}

type Teardown = Box<dyn FnOnce() + Send>;

/// An inbound request as seen by lifecycle subscribers.
pub struct TenantRequest {
    parts: Parts,
    body: Bytes,
    debug: bool,
    teardown: Option<Teardown>,
}

impl TenantRequest {
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body,
            debug: false,
            teardown: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Extensions inserted by middleware (request ID, connection info).
    pub fn extensions(&self) -> &axum::http::Extensions {
        &self.parts.extensions
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn host(&self) -> &str {
        request_host(&self.parts.headers, &self.parts.uri)
    }

    pub fn url(&self) -> &str {
        request_url(&self.parts.uri)
    }

    pub fn target(&self) -> RequestTarget<'_> {
        RequestTarget::new(self.host(), self.url())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }

    /// Set when the request matched one of the tenant's debug hosts.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Register a hook run once after the end-request phase.
    ///
    /// A later registration replaces an earlier one.
    pub fn on_teardown<F>(&mut self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.teardown = Some(Box::new(hook));
    }

    pub(crate) fn teardown(&mut self) {
        if let Some(hook) = self.teardown.take() {
            hook();
        }
    }

    pub fn into_parts(self) -> (Parts, Bytes) {
        (self.parts, self.body)
    }

    #[cfg(test)]
    pub(crate) fn test(host: &str, url: &str) -> Self {
        Request::builder()
            .uri(url)
            .header(header::HOST, host)
            .body(Bytes::new())
            .unwrap()
            .into()
    }
}

impl From<Request<Bytes>> for TenantRequest {
    fn from(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body)
    }
}

impl std::fmt::Debug for TenantRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantRequest")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("body_len", &self.body.len())
            .field("debug", &self.debug)
            .field("teardown", &self.teardown.is_some())
            .finish()
    }
}
