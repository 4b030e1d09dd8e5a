//! Hospital Financial Management API (hospfin)
//!
//! Multi-tenant HTTP JSON API for hospital/health-insurer billing:
//! accounts, glosas (claim denials), dashboards, audit trails, and push
//! subscriptions.
//!
//! # Request Pipeline
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                  API SERVER                    │
//!                        │                                                │
//!     Client Request     │  ┌──────────┐   ┌──────────┐   ┌───────────┐  │
//!     ───────────────────┼─▶│   rate   │──▶│   rbac   │──▶│ validate  │  │
//!                        │  │  limit   │   │  check   │   │  input    │  │
//!                        │  └──────────┘   └──────────┘   └─────┬─────┘  │
//!                        │                                      ▼        │
//!                        │  ┌──────────┐   ┌──────────┐   ┌───────────┐  │
//!     Client Response    │  │ envelope │◀──│   pii    │◀──│  execute  │  │
//!     ◀──────────────────┼──│ respond  │   │  mask    │   │  (store)  │  │
//!                        │  └──────────┘   └──────────┘   └─────┬─────┘  │
//!                        │                                      │        │
//!                        │                     fire-and-forget  ▼        │
//!                        │                                ┌───────────┐  │
//!                        │                                │   audit   │  │
//!                        │                                │  writer   │  │
//!                        │                                └───────────┘  │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hospfin::config::{load_config, AppConfig};
use hospfin::http::{Collaborators, HttpServer};
use hospfin::lifecycle::Shutdown;
use hospfin::notify::LoggingPushSender;
use hospfin::store::memory::{seed_demo, MemorySessions};
use hospfin::store::MemoryDatabase;

#[derive(Parser)]
#[command(name = "hospfin", version)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hospfin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("hospfin v{} starting", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit = config.rate_limit.limit,
        rate_window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            hospfin::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Collaborators. Production deployments swap in the relational store
    // and the real session resolver here.
    let db = Arc::new(MemoryDatabase::new());
    let sessions = Arc::new(MemorySessions::new());

    if config.dev.seed_demo_data {
        let seed = seed_demo(&db, &sessions);
        tracing::info!(
            organization_id = %seed.organization_id,
            admin_token = %seed.admin_token,
            operator_token = %seed.operator_token,
            viewer_token = %seed.viewer_token,
            "Demo data seeded"
        );
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(
        config,
        Collaborators {
            db,
            sessions,
            push: Arc::new(LoggingPushSender),
        },
    );
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
