//! Ticket ledger HTTP server.
//!
//! This binary:
//! - Loads configuration from the environment (and `.env`)
//! - Installs the Prometheus exporter
//! - Connects to `PostgreSQL` and applies migrations
//! - Serves the ledger API until Ctrl+C / SIGTERM
//!
//! # Usage
//!
//! ```bash
//! LEDGER_ADMIN_IDENTITY=admin DATABASE_URL=postgres://localhost/ticket_ledger \
//!     cargo run --bin server
//! ```

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use ticket_ledger_core::table::Table;
use ticket_ledger_postgres::{PostgresTable, connect, migrate};
use ticketing::{
    Config, LedgerTables, TicketService, TicketingEnvironment,
    metrics::register_ledger_metrics,
    server::{AppState, build_router, shutdown_signal},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        profile = %config.ledger.access_profile,
        "Configuration loaded"
    );

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.server.metrics_port))
        .install()
        .context("Failed to install Prometheus exporter")?;
    register_ledger_metrics();
    tracing::info!(
        port = config.server.metrics_port,
        "Prometheus metrics available at /metrics"
    );

    let pool = connect(&config.postgres.url, &config.postgres.pool_settings()).await?;
    migrate(&pool).await?;
    let tables = LedgerTables::open_with(|name| {
        Ok(Arc::new(PostgresTable::new(pool.clone(), name)?) as Arc<dyn Table>)
    })?;
    tracing::info!(?tables, "Ledger tables ready");

    let service = TicketService::new(
        config.ledger.admin()?,
        tables,
        TicketingEnvironment::production(),
        config.ledger.policy(),
    );
    let app = build_router(AppState::new(Arc::new(service)));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {addr}");

    // Graceful shutdown, bounded by SHUTDOWN_TIMEOUT once the signal arrives.
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .into_future(),
    );

    tokio::select! {
        result = &mut server => result??,
        _ = signalled_rx => {
            let grace = Duration::from_secs(config.server.shutdown_timeout);
            if let Ok(result) = tokio::time::timeout(grace, &mut server).await {
                result??;
            } else {
                tracing::warn!(?grace, "Shutdown timed out, dropping open connections");
                server.abort();
            }
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}
