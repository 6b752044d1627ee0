//! Listener planning.
//!
//! # Responsibilities
//! - Derive the set of ports the process must listen on from the registry
//! - Decide plain vs. TLS per port
//! - Report tenants whose TLS settings disagree on a shared port
//!
//! # Design Decisions
//! - One listener per distinct numeric port; wildcard ports need none
//! - Inactive tenants are planned too, so enabling one later needs no rebind
//! - First tenant in registry order decides a port's TLS material

use std::collections::btree_map::{BTreeMap, Entry};
use std::sync::Arc;

use crate::routing::tenant::{Port, Tenant, TlsMaterial};

/// A port to bind and the tenants expecting traffic on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerBinding {
    pub port: u16,
    /// `Some` when the port serves TLS.
    pub tls: Option<TlsMaterial>,
    pub tenants: Vec<String>,
}

/// Plan listeners for every tenant, sorted by port.
pub fn plan_bindings(tenants: &[Arc<Tenant>]) -> Vec<ListenerBinding> {
    let mut planned: BTreeMap<u16, ListenerBinding> = BTreeMap::new();

    for tenant in tenants {
        let mut wanted = vec![(tenant.port(), tenant.uses_tls(), tenant.tls_material())];
        if let Some(debug_port) = tenant.debug_port() {
            wanted.push((debug_port, tenant.debug_uses_tls(), tenant.debug_tls_material()));
        }

        for (port, uses_tls, material) in wanted {
            let Port::Fixed(number) = port else {
                tracing::debug!(tenant = %tenant.name(), "Wildcard port, no listener planned");
                continue;
            };
            let number = number.get();
            let tls = uses_tls.then(|| material.clone());

            match planned.entry(number) {
                Entry::Vacant(slot) => {
                    slot.insert(ListenerBinding {
                        port: number,
                        tls,
                        tenants: vec![tenant.name().to_string()],
                    });
                }
                Entry::Occupied(mut slot) => {
                    let binding = slot.get_mut();
                    if binding.tls != tls {
                        tracing::warn!(
                            port = number,
                            tenant = %tenant.name(),
                            kept = %binding.tenants[0],
                            "Conflicting TLS settings on shared port; keeping the first"
                        );
                    }
                    if !binding.tenants.iter().any(|t| t == tenant.name()) {
                        binding.tenants.push(tenant.name().to_string());
                    }
                }
            }
        }
    }

    planned.into_values().collect()
}
