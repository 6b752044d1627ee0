//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (requests, latency, misses, failures)
//! - Expose Prometheus-compatible metrics endpoint
//! - Track per-tenant and aggregate metrics
//!
//! # Metrics
//! - `tenant_requests_total` (counter): completed requests by tenant, status
//! - `tenant_request_duration_seconds` (histogram): dispatch latency by tenant
//! - `tenant_resolution_misses_total` (counter): requests no tenant accepted
//! - `tenant_dispatch_failures_total` (counter): subscriber failures by tenant, phase
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Labels for tenant, status code, lifecycle phase

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::events::LifecyclePhase;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(tenant: &str, status: u16, start_time: Instant) {
    counter!(
        "tenant_requests_total",
        "tenant" => tenant.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("tenant_request_duration_seconds", "tenant" => tenant.to_string())
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_resolution_miss() {
    counter!("tenant_resolution_misses_total").increment(1);
}

pub fn record_dispatch_failure(tenant: &str, phase: LifecyclePhase) {
    counter!(
        "tenant_dispatch_failures_total",
        "tenant" => tenant.to_string(),
        "phase" => phase.as_str()
    )
    .increment(1);
}
