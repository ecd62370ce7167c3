use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use courier_node::config::Cli;
use courier_node::store::{MemoryStore, PostgresStore, ShipmentStore};
use courier_node::{router, AppState};
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    let config = cli.service_config();

    let store: Arc<dyn ShipmentStore> = match &cli.database_url {
        Some(url) => Arc::new(
            PostgresStore::connect(url)
                .await
                .context("connecting to PostgreSQL")?,
        ),
        None => {
            tracing::warn!("no database configured, shipments are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    let backend = store.backend_tag();
    let app = router(AppState::new(store, &config));

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    tracing::info!(
        addr = %cli.bind,
        backend,
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        "courier node listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;
    Ok(())
}
