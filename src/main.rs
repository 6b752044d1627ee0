//! tenant-router
//!
//! Serves many tenants from one process, choosing the tenant for each
//! request by its host, port and path.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net listener ──▶ http server ──▶ registry.resolve
//!                                                           │
//!                                                           ▼
//!     Client Response                               tenant lifecycle
//!     ◀────────────── http response ◀── start / handle / end subscribers
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use tenant_router::config::{
    load_config, reload_on_change, ServerConfig, TenantSettings, TenantWatcher,
};
use tenant_router::http::{HttpServer, LifecyclePhase};
use tenant_router::lifecycle::Shutdown;
use tenant_router::observability::{logging, metrics};
use tenant_router::routing::{Tenant, TenantRegistry};

#[derive(Parser)]
#[command(name = "tenant-router")]
#[command(about = "Host-based multi-tenant request router", long_about = None)]
struct Cli {
    /// Server configuration file
    #[arg(short, long, default_value = "tenant-router.toml")]
    config: PathBuf,

    /// Directory with one subdirectory per tenant (overrides the config file)
    #[arg(short, long)]
    tenants_dir: Option<PathBuf>,

    /// Re-discover tenants when the tenants directory changes
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let mut config = if config_found {
        load_config(&cli.config)?
    } else {
        ServerConfig::default()
    };
    if cli.tenants_dir.is_some() {
        config.tenants_dir = cli.tenants_dir;
    }
    config.watch |= cli.watch;

    logging::init_tracing(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tenant-router starting");
    if !config_found {
        tracing::info!(path = %cli.config.display(), "No config file, using defaults");
    }

    let registry = Arc::new(TenantRegistry::from_env());
    for settings in &config.tenants {
        registry.load_with(settings.clone(), &config.defaults, attach_banner)?;
    }
    if let Some(dir) = &config.tenants_dir {
        registry.discover_with(&config.defaults, dir, attach_banner)?;
    }

    tracing::info!(
        tenants = ?registry.names(),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    // Held for the lifetime of the server; dropping it stops the watch.
    let _watcher = match (&config.tenants_dir, config.watch) {
        (Some(dir), true) => Some(spawn_reload(
            dir,
            config.defaults.clone(),
            Arc::clone(&registry),
            shutdown.clone(),
        )?),
        _ => None,
    };

    let server = HttpServer::new(config, registry);
    server.run(server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Default `handle-request` subscriber: a plain-text banner naming the tenant.
fn attach_banner(tenant: &Tenant) {
    tenant.hooks().on(LifecyclePhase::HandleRequest, |ctx| {
        let banner = if ctx.request().is_debug() {
            format!("{} [debug]\n", ctx.tenant().display_name())
        } else {
            format!("{}\n", ctx.tenant().display_name())
        };
        ctx.response_mut().text(banner);
        Ok(())
    });
}

fn spawn_reload(
    dir: &Path,
    defaults: TenantSettings,
    registry: Arc<TenantRegistry>,
    shutdown: Shutdown,
) -> Result<notify::RecommendedWatcher, notify::Error> {
    let (watcher, changes) = TenantWatcher::new(dir);
    let handle = watcher.run()?;

    tokio::spawn(reload_on_change(
        registry,
        defaults,
        dir.to_path_buf(),
        changes,
        shutdown.subscribe(),
        attach_banner,
    ));

    Ok(handle)
}
