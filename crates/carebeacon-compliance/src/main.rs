// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Carebeacon compliance worker binary.
//!
//! Connects to PostgreSQL, applies migrations, then runs the periodic
//! compliance check worker until interrupted.

use tracing::{info, warn};

use carebeacon_compliance::config::Config;
use carebeacon_compliance::worker::{ComplianceWorker, ComplianceWorkerConfig};
use carebeacon_compliance::{db, migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carebeacon_compliance=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    // Connect to database
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database");

    migrations::run(&pool).await?;
    info!("Database schema up to date");

    db::health_check(&pool).await?;

    // Start the periodic check worker
    let worker_config = ComplianceWorkerConfig::from_env();
    let worker = ComplianceWorker::new(pool, worker_config);
    let shutdown = worker.shutdown_handle();
    let worker_handle = tokio::spawn(worker.run());

    info!("Carebeacon compliance engine ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Graceful shutdown
    shutdown.notify_one();
    worker_handle.await?;

    info!("Carebeacon compliance engine shut down");

    Ok(())
}
