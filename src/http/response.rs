//! Response handling.
//!
//! # Responsibilities
//! - Accumulate status, headers and body written by subscribers
//! - Convert the finished response into an axum response
//!
//! # Design Decisions
//! - Body is buffered; subscribers write synchronously
//! - Defaults to 200 with an empty body when nobody writes

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// Outgoing response under construction.
#[derive(Debug, Clone, Default)]
pub struct TenantResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TenantResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Append to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.body.extend_from_slice(chunk.as_ref());
    }

    /// Replace the body with text and set a plain-text content type.
    pub fn text(&mut self, body: impl Into<String>) {
        self.body = body.into().into_bytes();
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl IntoResponse for TenantResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_empty_ok() {
        let response = TenantResponse::new();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.body().is_empty());
    }

    #[test]
    fn write_appends_and_text_replaces() {
        let mut response = TenantResponse::new();
        response.write("hello ");
        response.write(b"world");
        assert_eq!(response.body(), b"hello world");

        response.text("bye");
        assert_eq!(response.body(), b"bye");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn converts_into_axum_response() {
        let mut response = TenantResponse::new();
        response.set_status(StatusCode::CREATED);
        response.insert_header(HeaderName::from_static("x-tenant"), HeaderValue::from_static("a"));

        let converted = response.into_response();
        assert_eq!(converted.status(), StatusCode::CREATED);
        assert_eq!(converted.headers().get("x-tenant").unwrap(), "a");
    }
}
