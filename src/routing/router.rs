//! Tenant resolution.
//!
//! # Responsibilities
//! - Walk tenants in registry order and return the first binding match
//! - Fall back to the only active tenant when nothing matches
//! - Return an explicit no-match when several tenants are active
//!
//! # Design Decisions
//! - Disabled tenants are skipped entirely (not counted, not matched)
//! - An exact match always wins over the sole-active fallback
//! - No match is `None`, never an error

use std::sync::Arc;

use crate::routing::matcher::{HostMatch, RequestTarget};
use crate::routing::tenant::Tenant;

/// How a tenant was selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// Matched one of the tenant's production hosts.
    Host,
    /// Matched one of the tenant's debug hosts.
    DebugHost,
    /// No binding matched; this was the only active tenant.
    SoleActive,
}

/// A resolved tenant together with how it was found.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tenant: Arc<Tenant>,
    pub kind: ResolutionKind,
}

impl Resolution {
    /// Whether the request should run in debug mode.
    pub fn is_debug(&self) -> bool {
        self.kind == ResolutionKind::DebugHost
    }
}

/// Select the tenant that should serve `target`.
pub fn resolve(tenants: &[Arc<Tenant>], target: &RequestTarget<'_>) -> Option<Resolution> {
    let mut active_seen = 0usize;
    let mut sole_active: Option<&Arc<Tenant>> = None;

    for tenant in tenants {
        if !tenant.is_active() {
            continue;
        }

        active_seen += 1;
        // A second active tenant makes the fallback ambiguous.
        sole_active = if active_seen == 1 { Some(tenant) } else { None };

        if let Some(matched) = tenant.can_handle(target) {
            let kind = match matched {
                HostMatch::Production => ResolutionKind::Host,
                HostMatch::Debug => ResolutionKind::DebugHost,
            };
            return Some(Resolution {
                tenant: Arc::clone(tenant),
                kind,
            });
        }
    }

    sole_active.map(|tenant| Resolution {
        tenant: Arc::clone(tenant),
        kind: ResolutionKind::SoleActive,
    })
}
