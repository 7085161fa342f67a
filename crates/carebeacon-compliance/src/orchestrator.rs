// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Orchestration of a full compliance check run.
//!
//! The eight rule evaluators run concurrently against the shared pool and
//! each branch's outcome is captured individually, so one failing rule
//! never hides another's result. The caller always receives a summary,
//! never an error; evaluator failures are logged and reported per rule.
//!
//! No retries, no cancellation, no per-branch timeout: underlying
//! conditions persist until fixed, so a failed or missed run simply means
//! the alert fires on a later run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::rules::{self, RuleKind};

/// Outcome of one rule evaluator within a check run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The evaluator completed.
    Completed {
        /// Notifications inserted after deduplication.
        created: u64,
    },
    /// The evaluator failed. Sibling evaluators were unaffected.
    Failed {
        /// The failure message.
        error: String,
    },
}

/// Per-rule result within a check run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RuleResult {
    /// The rule that was evaluated.
    pub rule: RuleKind,
    /// Its individual outcome.
    #[serde(flatten)]
    pub outcome: RuleOutcome,
}

/// Summary of one orchestrated check run for one organisation.
#[derive(Debug, Clone, Serialize)]
pub struct CheckRunSummary {
    /// Organisation the run covered.
    pub organisation_id: Uuid,
    /// Evaluation time the rule thresholds were derived from.
    pub evaluated_at: DateTime<Utc>,
    /// One entry per rule, in [`RuleKind::ALL`] order.
    pub results: Vec<RuleResult>,
}

impl CheckRunSummary {
    /// Total notifications inserted across all completed rules.
    pub fn total_created(&self) -> u64 {
        self.results
            .iter()
            .map(|r| match r.outcome {
                RuleOutcome::Completed { created } => created,
                RuleOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Number of rules that failed.
    pub fn failure_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RuleOutcome::Failed { .. }))
            .count()
    }

    /// Whether every rule completed.
    pub fn is_fully_successful(&self) -> bool {
        self.failure_count() == 0
    }

    /// The outcome recorded for one rule, if present.
    pub fn outcome_for(&self, rule: RuleKind) -> Option<&RuleOutcome> {
        self.results
            .iter()
            .find(|r| r.rule == rule)
            .map(|r| &r.outcome)
    }
}

/// Run every compliance rule for one organisation.
///
/// Thresholds are derived from the injected `now`, which makes runs
/// deterministic under test. The evaluators are independent and run
/// concurrently; completion order is unspecified and does not affect the
/// summary, which reports rules in [`RuleKind::ALL`] order.
pub async fn run_all_checks(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> CheckRunSummary {
    // Join order must match RuleKind::ALL.
    let (pvg, registrations, training, plans, reviews, policies, equipment, incidents) = tokio::join!(
        rules::check_pvg_renewals(pool, now, organisation_id),
        rules::check_registration_expiries(pool, now, organisation_id),
        rules::check_training_expiries(pool, now, organisation_id),
        rules::check_personal_plan_reviews(pool, now, organisation_id),
        rules::check_annual_reviews(pool, now, organisation_id),
        rules::check_policy_reviews(pool, now, organisation_id),
        rules::check_equipment_checks(pool, now, organisation_id),
        rules::check_stale_incidents(pool, now, organisation_id),
    );

    let outcomes = [
        pvg,
        registrations,
        training,
        plans,
        reviews,
        policies,
        equipment,
        incidents,
    ];

    let results: Vec<RuleResult> = RuleKind::ALL
        .into_iter()
        .zip(outcomes)
        .map(|(rule, outcome)| {
            let outcome = match outcome {
                Ok(created) => RuleOutcome::Completed { created },
                Err(e) => {
                    error!(
                        rule = rule.as_str(),
                        organisation_id = %organisation_id,
                        error = %e,
                        "Rule evaluator failed"
                    );
                    RuleOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            RuleResult { rule, outcome }
        })
        .collect();

    let summary = CheckRunSummary {
        organisation_id,
        evaluated_at: now,
        results,
    };

    info!(
        organisation_id = %organisation_id,
        created = summary.total_created(),
        failures = summary.failure_count(),
        "Compliance check run completed"
    );

    summary
}
