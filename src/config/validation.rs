//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation of tenant settings (serde handles syntactic)
//! - Validate value ranges (ports in 1-65535 or the wildcard)
//! - Reject empty host bindings and relative path prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: &TenantSettings → Result<(), Vec<ValidationError>>
//! - Runs after defaults are merged, before a tenant is constructed

use crate::config::schema::{HostSetting, PortSetting, TenantSettings};
use crate::routing::tenant::Port;

/// A single semantic problem in a tenant's settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("tenant name is missing")]
    MissingName,

    #[error("tenant name is empty")]
    EmptyName,

    #[error("{field} must list at least one host")]
    EmptyHostList { field: &'static str },

    #[error("{field} contains an empty host")]
    EmptyHost { field: &'static str },

    #[error("{field} {value} is not a port in 1-65535 or \"*\"")]
    InvalidPort { field: &'static str, value: String },

    #[error("path {path:?} must start with '/'")]
    RelativePath { path: String },
}

/// Validate merged tenant settings.
pub fn validate_tenant(settings: &TenantSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match settings.name.as_deref() {
        None => errors.push(ValidationError::MissingName),
        Some(name) if name.trim().is_empty() => errors.push(ValidationError::EmptyName),
        Some(_) => {}
    }

    check_hosts("host", settings.host.as_ref(), &mut errors);
    check_hosts("debugHost", settings.debug_host.as_ref(), &mut errors);
    check_port("port", settings.port.as_ref(), &mut errors);
    check_port("debugPort", settings.debug_port.as_ref(), &mut errors);

    if let Some(path) = &settings.path {
        if !path.starts_with('/') {
            errors.push(ValidationError::RelativePath { path: path.clone() });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_hosts(field: &'static str, hosts: Option<&HostSetting>, errors: &mut Vec<ValidationError>) {
    let Some(hosts) = hosts else { return };
    let hosts = hosts.as_slice();
    if hosts.is_empty() {
        errors.push(ValidationError::EmptyHostList { field });
    } else if hosts.iter().any(|h| h.is_empty()) {
        errors.push(ValidationError::EmptyHost { field });
    }
}

fn check_port(field: &'static str, port: Option<&PortSetting>, errors: &mut Vec<ValidationError>) {
    if let Some(setting) = port {
        if Port::try_from(setting).is_err() {
            errors.push(ValidationError::InvalidPort {
                field,
                value: setting.to_string(),
            });
        }
    }
}
