// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Background worker that runs compliance checks on a schedule.
//!
//! Each cycle walks every active organisation and runs the full rule set.
//! Underlying conditions persist until fixed, so there is no catch-up
//! logic: a missed cycle simply means the alert fires on the next one.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::db;
use crate::error::Result;
use crate::orchestrator;

/// Configuration for the compliance check worker.
#[derive(Debug, Clone)]
pub struct ComplianceWorkerConfig {
    /// Whether the periodic worker is enabled.
    pub enabled: bool,
    /// How often to run the checks.
    pub poll_interval: Duration,
}

impl Default for ComplianceWorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: Duration::from_secs(3600), // 1 hour
        }
    }
}

impl ComplianceWorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CAREBEACON_CHECKS_ENABLED`: "false" or "0" to disable (default: true)
    /// - `CAREBEACON_CHECKS_POLL_INTERVAL_SECS`: seconds between runs (default: 3600)
    pub fn from_env() -> Self {
        let enabled = std::env::var("CAREBEACON_CHECKS_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let poll_interval_secs = std::env::var("CAREBEACON_CHECKS_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        Self {
            enabled,
            poll_interval: Duration::from_secs(poll_interval_secs),
        }
    }
}

/// Background worker that periodically evaluates compliance rules.
pub struct ComplianceWorker {
    pool: PgPool,
    config: ComplianceWorkerConfig,
    shutdown: Arc<Notify>,
}

impl ComplianceWorker {
    /// Create a new compliance worker.
    pub fn new(pool: PgPool, config: ComplianceWorkerConfig) -> Self {
        Self {
            pool,
            config,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a handle that can be used to signal shutdown.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    /// Run the worker loop.
    ///
    /// The loop exits when the shutdown signal is received.
    pub async fn run(self) {
        if !self.config.enabled {
            info!("Compliance check worker disabled");
            return;
        }

        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "Compliance check worker started"
        );

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    info!("Compliance check worker received shutdown signal");
                    break;
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {
                    if let Err(e) = self.run_cycle().await {
                        error!(error = %e, "Compliance check cycle failed");
                    }
                }
            }
        }

        info!("Compliance check worker stopped");
    }

    /// Run the full rule set for every active organisation.
    async fn run_cycle(&self) -> Result<()> {
        let organisations = db::list_active_organisations(&self.pool).await?;

        if organisations.is_empty() {
            debug!("No active organisations to check");
            return Ok(());
        }

        let mut total_created = 0u64;
        for org in &organisations {
            let summary = orchestrator::run_all_checks(&self.pool, Utc::now(), org.id).await;
            total_created += summary.total_created();

            if !summary.is_fully_successful() {
                match serde_json::to_string(&summary) {
                    Ok(json) => warn!(
                        organisation_id = %org.id,
                        summary = %json,
                        "Check run completed with failures"
                    ),
                    Err(e) => warn!(
                        organisation_id = %org.id,
                        error = %e,
                        "Failed to serialize check run summary"
                    ),
                }
            }
        }

        info!(
            organisations = organisations.len(),
            total_created, "Compliance check cycle completed"
        );

        Ok(())
    }
}
