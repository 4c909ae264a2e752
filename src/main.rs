use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use trade_rollup::api::{router, AppState};
use trade_rollup::{MySqlLedger, RollupService, Settings};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(flatten)]
    settings: Settings,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trade_rollup=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let settings = Args::parse().settings;
    settings.validate()?;

    info!("Starting trade rollup server");
    info!("Ledger: {}:{}/{}", settings.db_host, settings.db_port, settings.ledger_schema);
    info!("Snapshots: {:?}", settings.parquet_dir);
    info!("Exports: {:?}", settings.public_export_dir);

    let settings = Arc::new(settings);
    let ledger = Arc::new(MySqlLedger::new(&settings));
    let state = Arc::new(AppState {
        service: RollupService::new(settings.clone(), ledger),
    });

    let app = router(state);

    let addr = settings.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
