//! Tenant registry.
//!
//! # Responsibilities
//! - Hold tenants in a deterministic, insertion-ordered list
//! - Load tenants from in-memory settings or a directory tree
//! - Enable/disable tenants by name
//! - Resolve requests against the current snapshot
//!
//! # Design Decisions
//! - Snapshot published through `ArcSwap`: readers never block writers
//! - Re-loading a name replaces the tenant in place (order unchanged)
//! - A replaced tenant keeps its runtime `active` flag unless the new
//!   settings set `active` explicitly
//! - Initializers run before a tenant is published, never after
//! - No removal: tenants are disabled, not deleted
//! - Discovery reads and validates everything before inserting anything

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::loader::{load_settings, ConfigError};
use crate::config::schema::TenantSettings;
use crate::routing::matcher::RequestTarget;
use crate::routing::router::{self, Resolution};
use crate::routing::tenant::{EnvDefaults, Tenant};

/// A tenant built from settings, not yet published.
struct Built {
    tenant: Arc<Tenant>,
    /// Whether the merged settings set `active` themselves.
    explicit_active: bool,
}

/// Ordered collection of tenants keyed by name.
pub struct TenantRegistry {
    tenants: ArcSwap<Vec<Arc<Tenant>>>,
    env: EnvDefaults,
}

impl TenantRegistry {
    /// Create an empty registry with explicit process defaults.
    pub fn new(env: EnvDefaults) -> Self {
        Self {
            tenants: ArcSwap::from_pointee(Vec::new()),
            env,
        }
    }

    /// Create an empty registry using defaults from the environment.
    pub fn from_env() -> Self {
        Self::new(EnvDefaults::from_env())
    }

    pub fn env_defaults(&self) -> &EnvDefaults {
        &self.env
    }

    /// Merge `defaults` into `settings`, build the tenant and register it.
    pub fn load(
        &self,
        settings: TenantSettings,
        defaults: &TenantSettings,
    ) -> Result<Arc<Tenant>, ConfigError> {
        self.load_with(settings, defaults, |_| {})
    }

    /// Like [`load`](Self::load), running `init` on the tenant before it
    /// becomes visible to `resolve`.
    pub fn load_with<F>(
        &self,
        settings: TenantSettings,
        defaults: &TenantSettings,
        init: F,
    ) -> Result<Arc<Tenant>, ConfigError>
    where
        F: Fn(&Tenant),
    {
        let built = self.build(settings, defaults)?;
        init(&built.tenant);
        self.insert(&built);
        Ok(built.tenant)
    }

    /// Load one tenant per non-hidden subdirectory of `root`.
    ///
    /// Subdirectories are visited in name order. The directory name is used
    /// as the tenant name when the settings leave it out. Any failure aborts
    /// the whole discovery before a single tenant is registered.
    pub fn discover(
        &self,
        defaults: &TenantSettings,
        root: &Path,
    ) -> Result<Vec<Arc<Tenant>>, ConfigError> {
        self.discover_with(defaults, root, |_| {})
    }

    /// Like [`discover`](Self::discover), running `init` on every tenant
    /// before any of them is published.
    pub fn discover_with<F>(
        &self,
        defaults: &TenantSettings,
        root: &Path,
        init: F,
    ) -> Result<Vec<Arc<Tenant>>, ConfigError>
    where
        F: Fn(&Tenant),
    {
        let dirs = tenant_dirs(root)?;

        let mut built = Vec::with_capacity(dirs.len());
        for (dir_name, dir) in dirs {
            let mut settings = load_settings(&dir).map_err(|e| e.in_dir(&dir))?;
            if settings.name.is_none() {
                settings.name = Some(dir_name);
            }
            built.push(self.build(settings, defaults).map_err(|e| e.in_dir(&dir))?);
        }

        for entry in &built {
            init(&entry.tenant);
        }
        for entry in &built {
            self.insert(entry);
        }

        tracing::info!(
            root = %root.display(),
            count = built.len(),
            "Tenants discovered"
        );
        Ok(built.into_iter().map(|entry| entry.tenant).collect())
    }

    fn build(&self, settings: TenantSettings, defaults: &TenantSettings) -> Result<Built, ConfigError> {
        let merged = settings.with_defaults(defaults);
        let explicit_active = merged.active.is_some();
        let tenant = Tenant::from_settings(merged, &self.env).map(Arc::new)?;
        Ok(Built {
            tenant,
            explicit_active,
        })
    }

    fn insert(&self, built: &Built) {
        let tenant = &built.tenant;
        let name = tenant.name().to_string();

        // Runtime enable/disable survives a reload unless the settings say otherwise.
        if !built.explicit_active {
            if let Some(previous) = self.get(&name) {
                if previous.is_active() {
                    tenant.enable();
                } else {
                    tenant.disable();
                }
            }
        }

        self.tenants.rcu(|current| {
            let mut next = Vec::clone(current);
            match next.iter().position(|t| t.name() == name) {
                Some(index) => next[index] = Arc::clone(tenant),
                None => next.push(Arc::clone(tenant)),
            }
            next
        });

        tracing::debug!(
            tenant = %name,
            hosts = ?tenant.hosts(),
            port = %tenant.port(),
            active = tenant.is_active(),
            "Tenant loaded"
        );
    }

    /// Look up a tenant by name.
    pub fn get(&self, name: &str) -> Option<Arc<Tenant>> {
        self.tenants
            .load()
            .iter()
            .find(|t| t.name() == name)
            .cloned()
    }

    /// Tenant names in resolution order.
    pub fn names(&self) -> Vec<String> {
        self.tenants
            .load()
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    /// Current tenant list in resolution order.
    pub fn snapshot(&self) -> Arc<Vec<Arc<Tenant>>> {
        self.tenants.load_full()
    }

    pub fn len(&self) -> usize {
        self.tenants.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mark a tenant active. Returns false for an unknown name.
    pub fn enable(&self, name: &str) -> bool {
        self.set_active(name, true)
    }

    /// Mark a tenant inactive. Returns false for an unknown name.
    pub fn disable(&self, name: &str) -> bool {
        self.set_active(name, false)
    }

    fn set_active(&self, name: &str, active: bool) -> bool {
        match self.get(name) {
            Some(tenant) => {
                if active {
                    tenant.enable();
                } else {
                    tenant.disable();
                }
                tracing::info!(tenant = %name, active, "Tenant state changed");
                true
            }
            None => false,
        }
    }

    /// Select the tenant that should serve a request.
    pub fn resolve(&self, target: &RequestTarget<'_>) -> Option<Resolution> {
        router::resolve(&self.tenants.load(), target)
    }
}

impl Default for TenantRegistry {
    fn default() -> Self {
        Self::new(EnvDefaults::default())
    }
}

impl std::fmt::Debug for TenantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantRegistry")
            .field("tenants", &self.names())
            .field("env", &self.env)
            .finish()
    }
}

/// Non-hidden subdirectories of `root`, sorted by name.
fn tenant_dirs(root: &Path) -> Result<Vec<(String, PathBuf)>, ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: root.to_path_buf(),
        source,
    };

    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().map_err(io_err)?.is_dir() {
            dirs.push((name, entry.path()));
        }
    }

    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}
