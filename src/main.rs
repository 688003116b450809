//! Binsight - fill forecasting and route prioritization for smart e-waste bins.
//!
//! # API Endpoints
//!
//! - `POST /deposits` - Record a recycling transaction
//! - `GET  /admin/stats` - Full dashboard report
//! - `GET  /admin/predictions` - Ranked bin-fill predictions
//! - `GET  /admin/route` - Prioritized collection route
//! - `GET  /admin/bins` - List bins (optional status filter)
//! - `POST /admin/bins` - Register a bin
//! - `PATCH /admin/bins/{id}` - Update a bin
//! - `POST /admin/bins/{id}/empty` - Mark a bin as emptied
//! - `GET  /health` - Health check

use std::env;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use binsight::api::{AppState, router};
use binsight::storage::Storage;

/// Default port if not specified via environment variable.
const DEFAULT_PORT: u16 = 3000;

/// Default database path if not specified via environment variable.
const DEFAULT_DB_PATH: &str = "sqlite:binsight.db?mode=rwc";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("binsight=info".parse()?))
        .init();

    // Load configuration from environment
    let port: u16 = env::var("BINSIGHT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let db_url = env::var("BINSIGHT_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    info!(port, db_url = %db_url, "Starting Binsight server");

    // Initialize storage
    let storage = Storage::new(&db_url).await?;
    info!("Database initialized");

    let app = router(AppState { storage });

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Binsight is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
