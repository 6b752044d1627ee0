//! Configuration schema definitions.
//!
//! This module defines the server configuration file and the per-tenant
//! settings record. All types derive Serde traits for deserialization from
//! config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the tenant router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Root directory scanned for tenant subdirectories.
    pub tenants_dir: Option<PathBuf>,

    /// Re-discover tenants when the tenants directory changes.
    pub watch: bool,

    /// Settings merged into every tenant for fields the tenant leaves out.
    pub defaults: TenantSettings,

    /// Inline tenants, loaded before discovery in file order.
    pub tenants: Vec<TenantSettings>,

    /// Listener configuration (bind interface, body limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Settings record for a single tenant.
///
/// Every field is optional so that "absent" stays distinguishable from any
/// concrete value until defaults are merged in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TenantSettings {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub host: Option<HostSetting>,
    pub debug_host: Option<HostSetting>,
    pub port: Option<PortSetting>,
    pub debug_port: Option<PortSetting>,
    pub https: Option<bool>,
    pub debug_https: Option<bool>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
    pub pfx: Option<PathBuf>,
    pub debug_cert: Option<PathBuf>,
    pub debug_key: Option<PathBuf>,
    pub debug_pfx: Option<PathBuf>,
    pub active: Option<bool>,
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
    pub path: Option<String>,
}

impl TenantSettings {
    /// Settings carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Fill every absent field from `defaults`.
    ///
    /// Shallow and per-key: a field already present is never overwritten.
    pub fn with_defaults(mut self, defaults: &TenantSettings) -> Self {
        macro_rules! fill {
            ($($field:ident),* $(,)?) => {
                $(
                    if self.$field.is_none() {
                        self.$field = defaults.$field.clone();
                    }
                )*
            };
        }

        fill!(
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
        );
        self
    }
}

/// A host binding given either as a single string or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HostSetting {
    One(String),
    Many(Vec<String>),
}

impl HostSetting {
    /// Normalize into a list.
    pub fn into_list(self) -> Vec<String> {
        match self {
            HostSetting::One(host) => vec![host],
            HostSetting::Many(hosts) => hosts,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            HostSetting::One(host) => std::slice::from_ref(host),
            HostSetting::Many(hosts) => hosts,
        }
    }
}

impl From<&str> for HostSetting {
    fn from(host: &str) -> Self {
        HostSetting::One(host.to_string())
    }
}

impl From<Vec<&str>> for HostSetting {
    fn from(hosts: Vec<&str>) -> Self {
        HostSetting::Many(hosts.into_iter().map(str::to_string).collect())
    }
}

/// A port given as a number or as a string (`"*"` or decimal digits).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PortSetting {
    Number(i64),
    Text(String),
}

impl From<u16> for PortSetting {
    fn from(port: u16) -> Self {
        PortSetting::Number(i64::from(port))
    }
}

impl From<&str> for PortSetting {
    fn from(port: &str) -> Self {
        PortSetting::Text(port.to_string())
    }
}

impl std::fmt::Display for PortSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortSetting::Number(n) => write!(f, "{}", n),
            PortSetting::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface every tenant port is bound on (e.g., "0.0.0.0").
    pub bind_address: String,

    /// Largest request body buffered before dispatch.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Time in-flight requests get to finish once shutdown starts.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_grace_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Console output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_only_absent_fields() {
        let defaults = TenantSettings {
            name: Some("Default".into()),
            host: Some("fallback-host".into()),
            port: Some(8080u16.into()),
            ..TenantSettings::default()
        };

        let merged = TenantSettings::named("A").with_defaults(&defaults);
        assert_eq!(merged.name.as_deref(), Some("A"));
        assert_eq!(merged.host, Some(HostSetting::One("fallback-host".into())));
        assert_eq!(merged.port, Some(PortSetting::Number(8080)));
    }

    #[test]
    fn defaults_never_overwrite_present_fields() {
        let settings = TenantSettings {
            name: Some("A".into()),
            active: Some(false),
            https: Some(false),
            ..TenantSettings::default()
        };
        let defaults = TenantSettings {
            active: Some(true),
            https: Some(true),
            ..TenantSettings::default()
        };

        let merged = settings.with_defaults(&defaults);
        assert_eq!(merged.active, Some(false));
        assert_eq!(merged.https, Some(false));
    }

    #[test]
    fn host_accepts_scalar_or_list() {
        let single: TenantSettings = toml::from_str(r#"host = "a.example""#).unwrap();
        assert_eq!(single.host.unwrap().into_list(), vec!["a.example"]);

        let many: TenantSettings = toml::from_str(r#"host = ["a", "b"]"#).unwrap();
        assert_eq!(many.host.unwrap().into_list(), vec!["a", "b"]);
    }

    #[test]
    fn port_accepts_number_or_wildcard() {
        let numeric: TenantSettings = toml::from_str("port = 8080").unwrap();
        assert_eq!(numeric.port, Some(PortSetting::Number(8080)));

        let wildcard: TenantSettings = toml::from_str(r#"port = "*""#).unwrap();
        assert_eq!(wildcard.port, Some(PortSetting::Text("*".into())));
    }

    #[test]
    fn camel_case_field_names() {
        let settings: TenantSettings = serde_json::from_str(
            r#"{"displayName": "Site", "debugHost": ["dbg"], "debugHttps": true}"#,
        )
        .unwrap();
        assert_eq!(settings.display_name.as_deref(), Some("Site"));
        assert_eq!(settings.debug_host, Some(HostSetting::Many(vec!["dbg".into()])));
        assert_eq!(settings.debug_https, Some(true));
    }
}
