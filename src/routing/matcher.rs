//! Tenant binding matching.
//!
//! # Responsibilities
//! - Match the Host header against production then debug hosts
//! - Match the request URL against an optional path prefix
//! - Report which host list produced the match
//!
//! # Design Decisions
//! - Host matching is exact (case-sensitive)
//! - Path matching is a plain prefix test on path-and-query
//! - Production hosts are tried before debug hosts; first match wins
//! - No regex to guarantee O(n) matching

use crate::routing::tenant::{Port, Tenant};

/// The parts of a request that tenant matching looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    /// Raw Host header, possibly with a `:port` suffix.
    pub host: &'a str,
    /// Request URL (path and query).
    pub url: &'a str,
}

impl<'a> RequestTarget<'a> {
    pub fn new(host: &'a str, url: &'a str) -> Self {
        Self { host, url }
    }
}

/// Which host list a successful match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMatch {
    Production,
    Debug,
}

impl HostMatch {
    pub fn is_debug(&self) -> bool {
        matches!(self, HostMatch::Debug)
    }
}

/// Host/port/path binding of a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    hosts: Vec<String>,
    debug_hosts: Vec<String>,
    port: Port,
    uses_tls: bool,
    path: Option<String>,
}

impl Binding {
    pub fn new(
        hosts: Vec<String>,
        debug_hosts: Vec<String>,
        port: Port,
        uses_tls: bool,
        path: Option<String>,
    ) -> Self {
        Self {
            hosts,
            debug_hosts,
            port,
            uses_tls,
            path,
        }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn debug_hosts(&self) -> &[String] {
        &self.debug_hosts
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn uses_tls(&self) -> bool {
        self.uses_tls
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Match a request against this binding. Pure.
    pub fn matches(&self, target: &RequestTarget<'_>) -> Option<HostMatch> {
        if !self.path_matches(target.url) {
            return None;
        }

        if self.hosts.iter().any(|h| self.host_matches(h, target.host)) {
            return Some(HostMatch::Production);
        }
        if self.debug_hosts.iter().any(|h| self.host_matches(h, target.host)) {
            return Some(HostMatch::Debug);
        }
        None
    }

    fn path_matches(&self, url: &str) -> bool {
        self.path
            .as_deref()
            .map_or(true, |prefix| url.starts_with(prefix))
    }

    fn host_matches(&self, candidate: &str, header: &str) -> bool {
        // Bare host header: default ports, or any port when wildcarded.
        let default_port = match self.port {
            Port::Wildcard => true,
            Port::Fixed(port) => port.get() == 80 || (port.get() == 443 && self.uses_tls),
        };
        if default_port && header == candidate {
            return true;
        }

        match self.port {
            Port::Wildcard => header.starts_with(candidate),
            Port::Fixed(port) => header
                .strip_prefix(candidate)
                .and_then(|rest| rest.strip_prefix(':'))
                .is_some_and(|suffix| suffix == port.to_string()),
        }
    }
}

impl Tenant {
    /// Whether this tenant's binding accepts the request.
    ///
    /// Also mirrors the outcome into the tenant-wide debug flag.
    pub fn can_handle(&self, target: &RequestTarget<'_>) -> Option<HostMatch> {
        let matched = self.binding().matches(target)?;
        self.set_debug(matched.is_debug());
        Some(matched)
    }
}
