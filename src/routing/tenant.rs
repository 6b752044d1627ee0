//! Tenant definition.
//!
//! # Responsibilities
//! - Normalize a merged `TenantSettings` record into an immutable binding
//! - Hold the two mutable flags (`active`, `debug`)
//! - Own the tenant's lifecycle subscriber lists
//!
//! # Design Decisions
//! - Host bindings are always non-empty lists after construction
//! - Ports are either a fixed non-zero port or the wildcard, never anything else
//! - `active` and `debug` are relaxed atomics: last write wins, no isolation

use std::num::NonZeroU16;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Serialize, Serializer};

use crate::config::loader::ConfigError;
use crate::config::schema::{PortSetting, TenantSettings};
use crate::config::validation::validate_tenant;
use crate::http::events::LifecycleHooks;
use crate::routing::matcher::Binding;

/// Environment variable consulted for the default host.
pub const HOST_ENV: &str = "TENANT_ROUTER_HOST";
/// Environment variable consulted for the default port.
pub const PORT_ENV: &str = "TENANT_ROUTER_PORT";

/// Debug host used when a tenant declares none.
pub const DEFAULT_DEBUG_HOST: &str = "localhost";

/// Port a tenant binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    Fixed(NonZeroU16),
    /// Matches any port (`"*"`).
    Wildcard,
}

impl Port {
    pub const HTTP: Port = Port::Fixed(match NonZeroU16::new(80) {
        Some(port) => port,
        None => unreachable!(),
    });

    pub fn fixed(port: u16) -> Option<Port> {
        NonZeroU16::new(port).map(Port::Fixed)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Port::Wildcard)
    }

    /// The numeric port, if not the wildcard.
    pub fn number(&self) -> Option<u16> {
        match self {
            Port::Fixed(port) => Some(port.get()),
            Port::Wildcard => None,
        }
    }
}

impl std::fmt::Display for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Port::Fixed(port) => write!(f, "{}", port),
            Port::Wildcard => f.write_str("*"),
        }
    }
}

impl TryFrom<&PortSetting> for Port {
    type Error = String;

    fn try_from(setting: &PortSetting) -> Result<Self, Self::Error> {
        let number = match setting {
            PortSetting::Number(n) => *n,
            PortSetting::Text(text) if text == "*" => return Ok(Port::Wildcard),
            PortSetting::Text(text) => text.parse::<i64>().map_err(|_| setting.to_string())?,
        };
        u16::try_from(number)
            .ok()
            .and_then(Port::fixed)
            .ok_or_else(|| setting.to_string())
    }
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Port::Fixed(port) => serializer.serialize_u16(port.get()),
            Port::Wildcard => serializer.serialize_str("*"),
        }
    }
}

/// Certificate material handed to listener setup. Opaque to matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TlsMaterial {
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub pfx: Option<PathBuf>,
}

impl TlsMaterial {
    pub fn is_empty(&self) -> bool {
        self.cert.is_none() && self.key.is_none() && self.pfx.is_none()
    }
}

/// Process-level defaults used when a setting is absent after merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDefaults {
    pub host: String,
    pub port: Port,
}

impl EnvDefaults {
    /// Read `TENANT_ROUTER_HOST` / `TENANT_ROUTER_PORT`.
    pub fn from_env() -> Self {
        let mut defaults = Self::default();

        if let Ok(host) = std::env::var(HOST_ENV) {
            if !host.is_empty() {
                defaults.host = host;
            }
        }

        if let Ok(raw) = std::env::var(PORT_ENV) {
            match Port::try_from(&PortSetting::Text(raw.clone())) {
                Ok(port) => defaults.port = port,
                Err(_) => tracing::warn!(
                    variable = PORT_ENV,
                    value = %raw,
                    "Ignoring invalid default port"
                ),
            }
        }

        defaults
    }
}

impl Default for EnvDefaults {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: Port::HTTP,
        }
    }
}

/// A configured tenant.
pub struct Tenant {
    name: String,
    display_name: String,
    binding: Binding,
    debug_port: Option<Port>,
    debug_uses_tls: bool,
    tls: TlsMaterial,
    debug_tls: TlsMaterial,
    features: serde_json::Map<String, serde_json::Value>,
    active: AtomicBool,
    debug: AtomicBool,
    hooks: LifecycleHooks,
}

impl Tenant {
    /// Build a tenant from settings that already had defaults merged in.
    pub fn from_settings(settings: TenantSettings, env: &EnvDefaults) -> Result<Self, ConfigError> {
        validate_tenant(&settings).map_err(ConfigError::Validation)?;

        let TenantSettings {
            name,
            display_name,
            host,
            debug_host,
            port,
            debug_port,
            https,
            debug_https,
            cert,
            key,
            pfx,
            debug_cert,
            debug_key,
            debug_pfx,
            active,
            features,
            path,
        } = settings;

        // Validation guarantees a name and well-formed ports.
        let name = name.unwrap_or_default();
        let port = port_or(port.as_ref(), env.port);
        let debug_port = debug_port.as_ref().and_then(|p| Port::try_from(p).ok());
        let uses_tls = https.unwrap_or(false);

        let hosts = host
            .map(|h| h.into_list())
            .unwrap_or_else(|| vec![env.host.clone()]);
        let debug_hosts = debug_host
            .map(|h| h.into_list())
            .unwrap_or_else(|| vec![DEFAULT_DEBUG_HOST.to_string()]);

        Ok(Self {
            display_name: display_name.unwrap_or_else(|| name.clone()),
            name,
            binding: Binding::new(hosts, debug_hosts, port, uses_tls, path),
            debug_port,
            debug_uses_tls: debug_https.unwrap_or(uses_tls),
            tls: TlsMaterial { cert, key, pfx },
            debug_tls: TlsMaterial {
                cert: debug_cert,
                key: debug_key,
                pfx: debug_pfx,
            },
            features: features.unwrap_or_default(),
            active: AtomicBool::new(active.unwrap_or(true)),
            debug: AtomicBool::new(false),
            hooks: LifecycleHooks::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn hosts(&self) -> &[String] {
        self.binding.hosts()
    }

    pub fn debug_hosts(&self) -> &[String] {
        self.binding.debug_hosts()
    }

    pub fn port(&self) -> Port {
        self.binding.port()
    }

    pub fn path(&self) -> Option<&str> {
        self.binding.path()
    }

    pub fn uses_tls(&self) -> bool {
        self.binding.uses_tls()
    }

    pub fn debug_port(&self) -> Option<Port> {
        self.debug_port
    }

    pub fn debug_uses_tls(&self) -> bool {
        self.debug_uses_tls
    }

    pub fn tls_material(&self) -> &TlsMaterial {
        &self.tls
    }

    pub fn debug_tls_material(&self) -> &TlsMaterial {
        &self.debug_tls
    }

    pub fn features(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.features
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn enable(&self) {
        self.active.store(true, Ordering::Relaxed);
    }

    pub fn disable(&self) {
        self.active.store(false, Ordering::Relaxed);
    }

    /// Whether the most recent match against this tenant used a debug host.
    ///
    /// Tenant-wide, last match wins. Per-request code should read
    /// `TenantRequest::is_debug` instead.
    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub(crate) fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    /// Lifecycle subscribers for this tenant.
    pub fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }
}

fn port_or(setting: Option<&PortSetting>, fallback: Port) -> Port {
    setting
        .and_then(|p| Port::try_from(p).ok())
        .unwrap_or(fallback)
}

impl std::fmt::Debug for Tenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tenant")
            .field("name", &self.name)
            .field("binding", &self.binding)
            .field("active", &self.is_active())
            .field("debug", &self.is_debug())
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::HostSetting;

    fn build(settings: TenantSettings) -> Tenant {
        Tenant::from_settings(settings, &EnvDefaults::default()).unwrap()
    }

    #[test]
    fn applies_builtin_defaults() {
        let tenant = build(TenantSettings::named("site1"));

        assert_eq!(tenant.name(), "site1");
        assert_eq!(tenant.display_name(), "site1");
        assert_eq!(tenant.hosts(), ["localhost"]);
        assert_eq!(tenant.debug_hosts(), ["localhost"]);
        assert_eq!(tenant.port(), Port::HTTP);
        assert_eq!(tenant.path(), None);
        assert!(!tenant.uses_tls());
        assert!(tenant.is_active());
        assert!(!tenant.is_debug());
        assert!(tenant.features().is_empty());
    }

    #[test]
    fn env_defaults_supply_host_and_port() {
        let env = EnvDefaults {
            host: "box.internal".into(),
            port: Port::fixed(3000).unwrap(),
        };
        let tenant = Tenant::from_settings(TenantSettings::named("a"), &env).unwrap();

        assert_eq!(tenant.hosts(), ["box.internal"]);
        assert_eq!(tenant.port(), Port::fixed(3000).unwrap());
    }

    #[test]
    fn scalar_hosts_become_lists() {
        let tenant = build(TenantSettings {
            host: Some("production".into()),
            debug_host: Some(HostSetting::Many(vec!["debug".into(), "dbg".into()])),
            ..TenantSettings::named("site1")
        });

        assert_eq!(tenant.hosts(), ["production"]);
        assert_eq!(tenant.debug_hosts(), ["debug", "dbg"]);
    }

    #[test]
    fn parses_port_forms() {
        let wildcard = build(TenantSettings {
            port: Some("*".into()),
            ..TenantSettings::named("a")
        });
        assert!(wildcard.port().is_wildcard());

        let text = build(TenantSettings {
            port: Some("8443".into()),
            ..TenantSettings::named("a")
        });
        assert_eq!(text.port().number(), Some(8443));
    }

    #[test]
    fn rejects_invalid_settings() {
        let err = Tenant::from_settings(
            TenantSettings {
                port: Some(PortSetting::Number(0)),
                ..TenantSettings::named("a")
            },
            &EnvDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn debug_tls_follows_production_unless_set() {
        let inherited = build(TenantSettings {
            https: Some(true),
            ..TenantSettings::named("a")
        });
        assert!(inherited.debug_uses_tls());

        let overridden = build(TenantSettings {
            https: Some(true),
            debug_https: Some(false),
            ..TenantSettings::named("a")
        });
        assert!(!overridden.debug_uses_tls());
    }

    #[test]
    fn enable_and_disable_flip_active() {
        let tenant = build(TenantSettings {
            active: Some(false),
            ..TenantSettings::named("a")
        });
        assert!(!tenant.is_active());

        tenant.enable();
        assert!(tenant.is_active());

        tenant.disable();
        assert!(!tenant.is_active());
    }

    #[test]
    fn port_serializes_as_number_or_star() {
        assert_eq!(serde_json::to_string(&Port::HTTP).unwrap(), "80");
        assert_eq!(serde_json::to_string(&Port::Wildcard).unwrap(), "\"*\"");
    }
}
