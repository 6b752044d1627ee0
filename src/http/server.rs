//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the tenant handler
//! - Wire up middleware (request ID, tracing, panic isolation, timeout, body limit)
//! - Bind one listener per planned port, plain or TLS
//! - Resolve each request to a tenant and run its lifecycle
//! - Serve the admin API when enabled
//! - Drain in-flight requests on shutdown
//!
//! # Design Decisions
//! - All listeners share one `axum_server::Handle`, so one shutdown stops all
//! - A failing or panicking tenant only fails its own request (500)
//! - A listener exiting early stops the whole server

use std::any::Any;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::Handle;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::schema::ServerConfig;
use crate::http::dispatch::handle_request;
use crate::http::request::{request_host, request_url, MakeRequestUuidV4, TenantRequest};
use crate::http::response::TenantResponse;
use crate::net::listener::plan_bindings;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::routing::matcher::RequestTarget;
use crate::routing::TenantRegistry;

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid bind address {value:?}: {source}")]
    Address {
        value: String,
        #[source]
        source: AddrParseError,
    },

    #[error("listener on {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup for port {port} failed: {source}")]
    Tls {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("no tenant declares a numeric port; nothing to listen on")]
    NoBindings,

    #[error("listener task failed: {0}")]
    Task(#[from] JoinError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TenantRegistry>,
    pub max_body_bytes: usize,
}

/// HTTP server routing requests to registered tenants.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    registry: Arc<TenantRegistry>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, registry: Arc<TenantRegistry>) -> Self {
        let state = AppState {
            registry: Arc::clone(&registry),
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost first: request ID, trace, catch-panic, timeout,
    /// body limit, handler.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(tenant_handler))
            .route("/{*path}", any(tenant_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The assembled router, for serving in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }

    /// Bind every planned listener and serve until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        let bind_address = &self.config.listener.bind_address;
        let ip: IpAddr = bind_address.parse().map_err(|source| ServerError::Address {
            value: bind_address.clone(),
            source,
        })?;

        let bindings = plan_bindings(&self.registry.snapshot());
        if bindings.is_empty() {
            return Err(ServerError::NoBindings);
        }

        let handle = Handle::new();
        let mut listeners: JoinSet<Result<(), ServerError>> = JoinSet::new();

        for binding in bindings {
            let addr = SocketAddr::new(ip, binding.port);
            let app = self.router.clone();
            let handle = handle.clone();
            tracing::info!(
                address = %addr,
                tls = binding.tls.is_some(),
                tenants = ?binding.tenants,
                "Listener starting"
            );

            match binding.tls {
                Some(material) => {
                    let tls = load_tls_config(&material)
                        .await
                        .map_err(|source| ServerError::Tls {
                            port: binding.port,
                            source,
                        })?;
                    listeners.spawn(async move {
                        axum_server::bind_rustls(addr, tls)
                            .handle(handle)
                            .serve(app.into_make_service())
                            .await
                            .map_err(|source| ServerError::Bind { addr, source })
                    });
                }
                None => {
                    listeners.spawn(async move {
                        axum_server::bind(addr)
                            .handle(handle)
                            .serve(app.into_make_service())
                            .await
                            .map_err(|source| ServerError::Bind { addr, source })
                    });
                }
            }
        }

        if self.config.admin.enabled {
            let admin = &self.config.admin;
            let addr: SocketAddr =
                admin.bind_address.parse().map_err(|source| ServerError::Address {
                    value: admin.bind_address.clone(),
                    source,
                })?;
            let app = setup_admin_router(AdminState {
                registry: Arc::clone(&self.registry),
                api_key: Arc::from(admin.api_key.as_str()),
            });
            let handle = handle.clone();
            tracing::info!(address = %addr, "Admin API starting");
            listeners.spawn(async move {
                axum_server::bind(addr)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
                    .map_err(|source| ServerError::Bind { addr, source })
            });
        }

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        let outcome = tokio::select! {
            _ = shutdown.recv() => {
                tracing::info!(grace_secs = grace.as_secs(), "Shutdown requested, draining connections");
                handle.graceful_shutdown(Some(grace));
                Ok(())
            }
            Some(joined) = listeners.join_next() => {
                handle.shutdown();
                match joined {
                    Ok(result) => result,
                    Err(e) => Err(ServerError::Task(e)),
                }
            }
        };

        while let Some(joined) = listeners.join_next().await {
            match joined {
                Ok(Err(e)) => tracing::warn!(error = %e, "Listener failed while stopping"),
                Err(e) if !e.is_cancelled() => tracing::warn!(error = %e, "Listener task failed while stopping"),
                _ => {}
            }
        }

        tracing::info!("HTTP server stopped");
        outcome
    }
}

/// Resolve, buffer, dispatch.
async fn tenant_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let resolution = {
        let target = RequestTarget::new(
            request_host(request.headers(), request.uri()),
            request_url(request.uri()),
        );
        let resolution = state.registry.resolve(&target);
        if resolution.is_none() {
            tracing::debug!(host = %target.host, url = %target.url, "No tenant for request");
        }
        resolution
    };

    let Some(resolution) = resolution else {
        metrics::record_resolution_miss();
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(tenant = %resolution.tenant.name(), error = %e, "Request body rejected");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut request = TenantRequest::new(parts, body);
    request.set_debug(resolution.is_debug());

    match handle_request(&resolution.tenant, request, TenantResponse::new(), |ctx| {
        ctx.into_response()
    }) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                tenant = %e.tenant,
                phase = %e.phase,
                error = %e.source,
                "Tenant lifecycle failed"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Tenant handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::tenant::EnvDefaults;

    #[tokio::test]
    async fn empty_registry_has_nothing_to_bind() {
        let registry = Arc::new(TenantRegistry::new(EnvDefaults::default()));
        let server = HttpServer::new(ServerConfig::default(), registry);
        let (_tx, rx) = broadcast::channel(1);

        let err = server.run(rx).await.unwrap_err();
        assert!(matches!(err, ServerError::NoBindings));
    }

    #[tokio::test]
    async fn bad_bind_address_is_reported() {
        let registry = Arc::new(TenantRegistry::new(EnvDefaults::default()));
        let mut config = ServerConfig::default();
        config.listener.bind_address = "not-an-ip".into();
        let server = HttpServer::new(config, registry);
        let (_tx, rx) = broadcast::channel(1);

        let err = server.run(rx).await.unwrap_err();
        assert!(matches!(err, ServerError::Address { .. }));
    }
}
