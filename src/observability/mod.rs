//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatch.rs, server.rs, registry.rs
//!     → logging.rs (one access line per completed request, state changes)
//!     → metrics.rs (per-tenant request counts, latency, misses, failures)
//!
//! Sinks:
//!     → stdout (pretty for terminals, JSON for collectors)
//!     → Prometheus scrape endpoint (only when enabled)
//! ```
//!
//! # Design Decisions
//! - Access lines carry tenant, url, status, debug and request ID as fields
//! - No exporter installed means metric calls do nothing

pub mod logging;
pub mod metrics;
