//! Axum middleware for embedding tenants in an existing stack.

pub mod tenant;

pub use tenant::{tenant_middleware, TenantLayerState};
