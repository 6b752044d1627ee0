//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{ServerConfig, TenantSettings};
use crate::config::validation::ValidationError;

/// Settings resources looked up in a tenant directory, in order.
pub const SETTINGS_FILES: [&str; 2] = ["settings.toml", "settings.json"];

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Parse error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No settings file ({}) in {}", SETTINGS_FILES.join(" or "), .dir.display())]
    MissingSettings { dir: PathBuf },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Tenant discovery failed at {}: {source}", .dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Attach the tenant directory that produced this error.
    pub fn in_dir(self, dir: &Path) -> Self {
        ConfigError::Discovery {
            dir: dir.to_path_buf(),
            source: Box::new(self),
        }
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load server configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = read(path)?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the settings resource of a tenant directory.
///
/// `settings.toml` is preferred over `settings.json` when both exist.
pub fn load_settings(dir: &Path) -> Result<TenantSettings, ConfigError> {
    let toml_path = dir.join(SETTINGS_FILES[0]);
    if toml_path.is_file() {
        let content = read(&toml_path)?;
        return toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: toml_path,
            source,
        });
    }

    let json_path = dir.join(SETTINGS_FILES[1]);
    if json_path.is_file() {
        let content = read(&json_path)?;
        return serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: json_path,
            source,
        });
    }

    Err(ConfigError::MissingSettings {
        dir: dir.to_path_buf(),
    })
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{HostSetting, LogFormat, PortSetting};

    #[test]
    fn parses_full_server_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        fs::write(
            &path,
            r#"
tenants_dir = "sites"
watch = true

[defaults]
host = "fallback-host"
port = 8080

[[tenants]]
name = "default"
port = "*"

[listener]
bind_address = "127.0.0.1"

[observability]
log_format = "json"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.tenants_dir, Some(PathBuf::from("sites")));
        assert!(config.watch);
        assert_eq!(config.defaults.host, Some(HostSetting::One("fallback-host".into())));
        assert_eq!(config.tenants.len(), 1);
        assert_eq!(config.tenants[0].port, Some(PortSetting::Text("*".into())));
        assert_eq!(config.listener.bind_address, "127.0.0.1");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn prefers_toml_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.toml"), r#"name = "from-toml""#).unwrap();
        fs::write(dir.path().join("settings.json"), r#"{"name": "from-json"}"#).unwrap();

        let settings = load_settings(dir.path()).unwrap();
        assert_eq!(settings.name.as_deref(), Some("from-toml"));
    }

    #[test]
    fn falls_back_to_json_settings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), r#"{"host": ["a", "b"]}"#).unwrap();

        let settings = load_settings(dir.path()).unwrap();
        assert_eq!(settings.host.unwrap().into_list(), vec!["a", "b"]);
    }

    #[test]
    fn missing_settings_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSettings { .. }));
    }

    #[test]
    fn malformed_settings_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

        let err = load_settings(dir.path()).unwrap_err();
        assert!(err.to_string().contains("settings.json"));
    }
}
