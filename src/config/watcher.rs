//! Tenants directory watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event → TenantWatcher → change signal
//!     → reload_on_change (debounce, drain the burst)
//!     → reload_tenants (discover + initialize before publish)
//!     → registry swaps tenants in place, or keeps the old ones on error
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::config::loader::ConfigError;
use crate::config::schema::TenantSettings;
use crate::routing::registry::TenantRegistry;
use crate::routing::tenant::Tenant;

/// Quiet period after a change before discovery re-runs.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(250);

/// Monitors a tenants directory and reports that something changed.
///
/// The watcher does not reload anything itself; the receiver decides
/// when to re-run discovery.
pub struct TenantWatcher {
    root: PathBuf,
    change_tx: mpsc::UnboundedSender<()>,
}

impl TenantWatcher {
    /// Returns the watcher and a receiver that yields once per relevant event.
    pub fn new(root: &Path) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        (
            Self {
                root: root.to_path_buf(),
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching in notify's background thread. Dropping the returned
    /// handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_relevant(&event) => {
                    tracing::debug!(paths = ?event.paths, "Tenant settings change detected");
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Tenant watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(path = ?self.root, "Tenant watcher started");
        Ok(watcher)
    }
}

/// Re-run discovery of `root`, running `init` on every tenant before it is
/// published. On failure the registry keeps its current tenants.
pub fn reload_tenants<F>(
    registry: &TenantRegistry,
    defaults: &TenantSettings,
    root: &Path,
    init: F,
) -> Result<Vec<Arc<Tenant>>, ConfigError>
where
    F: Fn(&Tenant),
{
    match registry.discover_with(defaults, root, init) {
        Ok(reloaded) => {
            tracing::info!(
                count = reloaded.len(),
                "Tenants reloaded; new ports need a restart to be served"
            );
            Ok(reloaded)
        }
        Err(e) => {
            tracing::error!(error = %e, "Tenant reload failed, keeping current tenants");
            Err(e)
        }
    }
}

/// Reload tenants from `root` whenever `changes` fires, until `stop` fires
/// or the change channel closes.
pub async fn reload_on_change<F>(
    registry: Arc<TenantRegistry>,
    defaults: TenantSettings,
    root: PathBuf,
    mut changes: mpsc::UnboundedReceiver<()>,
    mut stop: broadcast::Receiver<()>,
    init: F,
) where
    F: Fn(&Tenant) + Send + 'static,
{
    loop {
        tokio::select! {
            _ = stop.recv() => break,
            changed = changes.recv() => {
                if changed.is_none() {
                    break;
                }
            }
        }

        // Editors fire bursts of events for one save.
        tokio::time::sleep(RELOAD_DEBOUNCE).await;
        while changes.try_recv().is_ok() {}

        let _ = reload_tenants(&registry, &defaults, &root, &init);
    }

    tracing::debug!(path = ?root, "Tenant reload loop stopped");
}

fn is_relevant(event: &Event) -> bool {
    event.kind.is_create() || event.kind.is_modify() || event.kind.is_remove()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::events::LifecyclePhase;
    use notify::event::{AccessKind, CreateKind, EventKind};

    fn write_tenant(root: &Path, name: &str, content: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("settings.toml"), content).unwrap();
    }

    fn greet(tenant: &Tenant) {
        tenant.hooks().on(LifecyclePhase::HandleRequest, |ctx| {
            let name = ctx.tenant().display_name().to_string();
            ctx.response_mut().text(name);
            Ok(())
        });
    }

    fn seeded() -> (tempfile::TempDir, Arc<TenantRegistry>) {
        let root = tempfile::tempdir().unwrap();
        write_tenant(root.path(), "alpha", "host = \"alpha.test\"\n");
        write_tenant(root.path(), "beta", "host = \"beta.test\"\n");

        let registry = Arc::new(TenantRegistry::default());
        registry
            .discover_with(&TenantSettings::default(), root.path(), greet)
            .unwrap();
        (root, registry)
    }

    #[tokio::test]
    async fn change_reloads_with_handlers_and_runtime_state() {
        let (root, registry) = seeded();
        assert!(registry.disable("beta"));

        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let reloader = tokio::spawn(reload_on_change(
            Arc::clone(&registry),
            TenantSettings::default(),
            root.path().to_path_buf(),
            change_rx,
            stop_rx,
            greet,
        ));

        write_tenant(
            root.path(),
            "alpha",
            "displayName = \"Alpha v2\"\nhost = \"alpha.test\"\n",
        );
        change_tx.send(()).unwrap();

        let reloaded = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let alpha = registry.get("alpha").unwrap();
                if alpha.display_name() == "Alpha v2" {
                    return alpha;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(reloaded.hooks().count(LifecyclePhase::HandleRequest), 1);
        let beta = registry.get("beta").unwrap();
        assert!(!beta.is_active());
        assert_eq!(beta.hooks().count(LifecyclePhase::HandleRequest), 1);

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), reloader)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn failed_reload_keeps_current_tenants() {
        let (root, registry) = seeded();
        let alpha = registry.get("alpha").unwrap();
        write_tenant(root.path(), "beta", "port = 0\n");

        let err = reload_tenants(&registry, &TenantSettings::default(), root.path(), greet)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Discovery { .. }));
        assert!(Arc::ptr_eq(&alpha, &registry.get("alpha").unwrap()));
        assert_eq!(registry.get("beta").unwrap().hosts(), ["beta.test"]);
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let (root, registry) = seeded();
        let (_change_tx, change_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = broadcast::channel(1);
        let reloader = tokio::spawn(reload_on_change(
            registry,
            TenantSettings::default(),
            root.path().to_path_buf(),
            change_rx,
            stop_rx,
            greet,
        ));

        stop_tx.send(()).unwrap();
        let stopped = tokio::time::timeout(Duration::from_secs(5), reloader).await;
        assert!(matches!(stopped, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn closed_change_channel_stops_the_loop() {
        let (root, registry) = seeded();
        let (change_tx, change_rx) = mpsc::unbounded_channel::<()>();
        let (_stop_tx, stop_rx) = broadcast::channel(1);
        let reloader = tokio::spawn(reload_on_change(
            registry,
            TenantSettings::default(),
            root.path().to_path_buf(),
            change_rx,
            stop_rx,
            greet,
        ));

        drop(change_tx);
        let stopped = tokio::time::timeout(Duration::from_secs(5), reloader).await;
        assert!(matches!(stopped, Ok(Ok(()))));
    }

    #[test]
    fn access_events_are_ignored() {
        let access = Event::new(EventKind::Access(AccessKind::Any));
        let create = Event::new(EventKind::Create(CreateKind::File));
        assert!(!is_relevant(&access));
        assert!(is_relevant(&create));
    }
}
