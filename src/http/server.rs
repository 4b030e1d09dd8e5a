//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all API routes
//! - Wire up middleware (tracing, concurrency cap, timeout, request ID,
//!   rate limiting)
//! - Assemble shared state from injected collaborators
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api;
use crate::audit::AuditLogger;
use crate::config::AppConfig;
use crate::http::request::RequestIdLayer;
use crate::lifecycle::signals;
use crate::notify::PushSender;
use crate::security::rate_limit::{rate_limit_middleware, MemoryCounterStore, RateLimiter};
use crate::security::rbac::{PermissionChecker, SessionResolver};
use crate::store::Database;

/// External collaborators injected into the server.
pub struct Collaborators {
    pub db: Arc<dyn Database>,
    pub sessions: Arc<dyn SessionResolver>,
    pub push: Arc<dyn PushSender>,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Arc<dyn Database>,
    pub auth: Arc<PermissionChecker>,
    pub limiter: Arc<RateLimiter>,
    pub audit: AuditLogger,
    pub push: Arc<dyn PushSender>,
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Assemble state and routes. Must run inside a Tokio runtime (the
    /// audit writer task is spawned here).
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let audit = if config.audit.enabled {
            AuditLogger::spawn(collaborators.db.clone())
        } else {
            AuditLogger::disabled()
        };

        let state = AppState {
            config: Arc::new(config.clone()),
            auth: Arc::new(PermissionChecker::new(
                collaborators.sessions,
                collaborators.db.clone(),
            )),
            limiter: Arc::new(RateLimiter::new(Arc::new(MemoryCounterStore::new()))),
            db: collaborators.db,
            audit,
            push: collaborators.push,
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/health", get(api::health::health_check))
            .route(
                "/api/accounts",
                get(api::accounts::list_accounts).post(api::accounts::create_account),
            )
            .route("/api/accounts/bulk", post(api::accounts::bulk_accounts))
            .route(
                "/api/glosas",
                get(api::glosas::list_glosas).post(api::glosas::create_glosa),
            )
            .route("/api/dashboard/stats", get(api::dashboard::stats))
            .route("/api/audit-logs", get(api::audit_logs::list_audit_logs))
            .route(
                "/api/notifications/push-subscribe",
                post(api::notifications::subscribe).delete(api::notifications::unsubscribe),
            )
            .with_state(state.clone())
            .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
            // Backpressure: excess requests queue on a shared semaphore
            // instead of piling onto the store.
            .layer(GlobalConcurrencyLimitLayer::new(
                config.listener.max_connections,
            ))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => {},
                    _ = signals::shutdown_signal() => {},
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
