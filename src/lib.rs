//! Host-based multi-tenant request router.
//!
//! Tenants are discovered from per-directory settings files, matched against
//! each request's host, port and path, and given the request through a
//! three-phase lifecycle of subscriber callbacks.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Tenant, TenantRegistry};
