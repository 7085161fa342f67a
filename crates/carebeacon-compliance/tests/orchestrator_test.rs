// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Orchestrator tests.
//!
//! Verifies the concurrent check run: per-rule counts, and isolation of a
//! failing evaluator from its siblings.
//!
//! Requires TEST_DATABASE_URL; tests skip when it is not set.

mod common;

use std::str::FromStr;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

use carebeacon_compliance::orchestrator::{self, RuleOutcome};
use carebeacon_compliance::rules::RuleKind;
use common::TestContext;

fn assert_completed(summary: &orchestrator::CheckRunSummary, rule: RuleKind, expected: u64) {
    match summary.outcome_for(rule) {
        Some(RuleOutcome::Completed { created }) => {
            assert_eq!(*created, expected, "rule {} count", rule)
        }
        other => panic!("Expected completed outcome for {}, got {:?}", rule, other),
    }
}

#[tokio::test]
async fn test_run_all_checks_reports_every_rule() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set");
        return;
    };

    let org = ctx.create_organisation().await;
    ctx.create_manager(org).await;

    let now = Utc::now();
    let today = now.date_naive();

    // One violation in three categories; the other five rules find nothing.
    ctx.create_staff_member(org, "Paula", "Quinn", true, Some(today + Duration::days(10)))
        .await;
    ctx.create_policy(org, "Infection Control Policy", true, Some(today - Duration::days(2)))
        .await;
    ctx.create_equipment_check(org, "Bath Hoist", today - Duration::days(1))
        .await;

    let summary = orchestrator::run_all_checks(&ctx.pool, now, org).await;

    assert_eq!(summary.results.len(), 8);
    assert!(summary.is_fully_successful());
    assert_eq!(summary.total_created(), 3);
    assert_eq!(summary.organisation_id, org);
    assert_eq!(summary.evaluated_at, now);

    assert_completed(&summary, RuleKind::PvgRenewal, 1);
    assert_completed(&summary, RuleKind::PolicyReview, 1);
    assert_completed(&summary, RuleKind::EquipmentCheck, 1);
    assert_completed(&summary, RuleKind::RegistrationExpiry, 0);
    assert_completed(&summary, RuleKind::TrainingExpiry, 0);
    assert_completed(&summary, RuleKind::PersonalPlanReview, 0);
    assert_completed(&summary, RuleKind::AnnualReview, 0);
    assert_completed(&summary, RuleKind::StaleIncident, 0);
}

#[tokio::test]
async fn test_run_all_checks_on_quiet_organisation() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set");
        return;
    };

    let org = ctx.create_organisation().await;
    ctx.create_manager(org).await;

    let summary = orchestrator::run_all_checks(&ctx.pool, Utc::now(), org).await;

    assert!(summary.is_fully_successful());
    assert_eq!(summary.total_created(), 0);
    for rule in RuleKind::ALL {
        assert_completed(&summary, rule, 0);
    }
}

#[tokio::test]
async fn test_rerun_is_fully_deduplicated() {
    let Some(ctx) = TestContext::new().await else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set");
        return;
    };

    let org = ctx.create_organisation().await;
    ctx.create_manager(org).await;

    let now = Utc::now();
    ctx.create_equipment_check(org, "Stand Aid", now.date_naive() - Duration::days(7))
        .await;

    let first = orchestrator::run_all_checks(&ctx.pool, now, org).await;
    assert_eq!(first.total_created(), 1);

    let second = orchestrator::run_all_checks(&ctx.pool, now, org).await;
    assert_eq!(second.total_created(), 0);
    assert!(second.is_fully_successful());
    assert_eq!(ctx.count_notifications(org).await, 1);
}

/// A failing evaluator must not abort its siblings or surface as an error
/// from run_all_checks.
///
/// The failure is induced in a dedicated schema: migrations are applied
/// there, then one rule's table is dropped so only that evaluator errors.
#[tokio::test]
async fn test_evaluator_failure_does_not_abort_siblings() {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("Skipping test: TEST_DATABASE_URL not set");
        return;
    };

    let base_pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let schema = format!("iso_{}", Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE SCHEMA \"{}\"", schema))
        .execute(&base_pool)
        .await
        .expect("Failed to create schema");

    let options = PgConnectOptions::from_str(&database_url)
        .expect("Failed to parse database url")
        .options([("search_path", schema.as_str())]);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to connect scoped pool");

    carebeacon_compliance::migrations::run(&pool)
        .await
        .expect("Failed to run migrations in schema");

    let ctx = TestContext::with_pool(pool.clone());
    let org = ctx.create_organisation().await;
    ctx.create_manager(org).await;

    let now = Utc::now();
    ctx.create_staff_member(org, "Rona", "Sim", true, Some(now.date_naive() + Duration::days(10)))
        .await;

    sqlx::query(&format!("DROP TABLE \"{}\".equipment_checks", schema))
        .execute(&base_pool)
        .await
        .expect("Failed to drop table");

    let summary = orchestrator::run_all_checks(&pool, now, org).await;

    assert_eq!(summary.results.len(), 8);
    assert_eq!(summary.failure_count(), 1);
    assert!(!summary.is_fully_successful());

    match summary.outcome_for(RuleKind::EquipmentCheck) {
        Some(RuleOutcome::Failed { error }) => {
            assert!(!error.is_empty(), "failure should carry a message")
        }
        other => panic!("Expected failure for equipment_check, got {:?}", other),
    }

    // Siblings still completed; the PVG rule still alerted.
    assert_completed(&summary, RuleKind::PvgRenewal, 1);
    assert_completed(&summary, RuleKind::AnnualReview, 0);
    assert_completed(&summary, RuleKind::StaleIncident, 0);

    sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", schema))
        .execute(&base_pool)
        .await
        .ok();
}
