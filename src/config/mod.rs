//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! tenant-router.toml
//!     → loader.rs (parse & deserialize)
//!     → ServerConfig (listener, timeouts, observability, admin, inline tenants)
//!
//! <tenants_dir>/<name>/settings.toml | settings.json
//!     → loader.rs (parse)
//!     → schema.rs (fill absent fields from defaults)
//!     → validation.rs (semantic checks)
//!     → routing::Tenant
//!
//! On change:
//!     watcher.rs detects change
//!     → caller re-runs discovery
//!     → registry replaces tenants by name
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Validation reports every problem at once

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_settings, ConfigError};
pub use schema::{HostSetting, PortSetting, ServerConfig, TenantSettings};
pub use watcher::{reload_on_change, reload_tenants, TenantWatcher};
