// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Compliance rule evaluators.
//!
//! Each evaluator scans one category of compliance state for an
//! organisation and raises notifications through the deduplicating
//! notifier. They share a shape: derive a threshold from the injected
//! evaluation time, query for records on the alerting side of it, and
//! notify the manager tier once per finding. The returned count is the
//! number of notifications actually inserted after deduplication.
//!
//! Evaluators do not retry and do not absorb their own failures. A
//! datastore error propagates to the orchestrator, which records it without
//! aborting sibling evaluators. Findings are processed sequentially within
//! an evaluator, in the order the query returned them.

use chrono::{DateTime, Duration, Months, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::entity::EntityKind;
use crate::error::Result;
use crate::notifier::{self, Violation};

/// Days ahead that PVG renewals start alerting.
pub const PVG_RENEWAL_WINDOW_DAYS: i64 = 90;

/// Days ahead that SSSC registration expiries start alerting.
pub const REGISTRATION_EXPIRY_WINDOW_DAYS: i64 = 90;

/// Days ahead that mandatory training expiries start alerting.
pub const TRAINING_EXPIRY_WINDOW_DAYS: i64 = 90;

/// Grace period, in days, after a personal plan's review date before it
/// alerts.
pub const PLAN_REVIEW_GRACE_DAYS: i64 = 28;

/// Months after which a client's most recent review counts as stale.
pub const ANNUAL_REVIEW_MONTHS: u32 = 12;

/// Days an incident may stay open before it alerts.
pub const STALE_INCIDENT_DAYS: i64 = 14;

/// The compliance rules evaluated on every check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// PVG scheme renewal approaching.
    PvgRenewal,
    /// SSSC registration approaching expiry.
    RegistrationExpiry,
    /// Mandatory training approaching expiry.
    TrainingExpiry,
    /// Personal plan review window missed.
    PersonalPlanReview,
    /// Annual client review stale or missing.
    AnnualReview,
    /// Policy review date passed.
    PolicyReview,
    /// Equipment check date passed.
    EquipmentCheck,
    /// Incident open past the staleness window.
    StaleIncident,
}

impl RuleKind {
    /// Every rule, in the order the orchestrator runs and reports them.
    pub const ALL: [RuleKind; 8] = [
        RuleKind::PvgRenewal,
        RuleKind::RegistrationExpiry,
        RuleKind::TrainingExpiry,
        RuleKind::PersonalPlanReview,
        RuleKind::AnnualReview,
        RuleKind::PolicyReview,
        RuleKind::EquipmentCheck,
        RuleKind::StaleIncident,
    ];

    /// Stable tag used in summaries and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::PvgRenewal => "pvg_renewal",
            RuleKind::RegistrationExpiry => "registration_expiry",
            RuleKind::TrainingExpiry => "training_expiry",
            RuleKind::PersonalPlanReview => "personal_plan_review",
            RuleKind::AnnualReview => "annual_review",
            RuleKind::PolicyReview => "policy_review",
            RuleKind::EquipmentCheck => "equipment_check",
            RuleKind::StaleIncident => "stale_incident",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// PVG renewals falling due within the next 90 days for active staff.
pub async fn check_pvg_renewals(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let today = now.date_naive();
    let until = today + Duration::days(PVG_RENEWAL_WINDOW_DAYS);
    let due = db::staff_with_pvg_renewal_due(pool, organisation_id, today, until).await?;

    let mut created = 0;
    for staff in due {
        let violation = Violation {
            title: format!(
                "PVG renewal due for {} {}",
                staff.first_name, staff.last_name
            ),
            message: format!(
                "The PVG scheme record for {} {} is due for renewal on {}.",
                staff.first_name,
                staff.last_name,
                staff.pvg_renewal_date.format("%-d %B %Y")
            ),
            entity_kind: EntityKind::StaffMember,
            entity_id: staff.id.to_string(),
            link: format!("/staff/{}", staff.id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}

/// SSSC registrations expiring within the next 90 days for active staff.
pub async fn check_registration_expiries(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let today = now.date_naive();
    let until = today + Duration::days(REGISTRATION_EXPIRY_WINDOW_DAYS);
    let expiring = db::sssc_registrations_expiring(pool, organisation_id, today, until).await?;

    let mut created = 0;
    for registration in expiring {
        let violation = Violation {
            title: format!(
                "SSSC registration expiring for {} {}",
                registration.first_name, registration.last_name
            ),
            message: format!(
                "The SSSC registration for {} {} expires on {}.",
                registration.first_name,
                registration.last_name,
                registration.expiry_date.format("%-d %B %Y")
            ),
            entity_kind: EntityKind::StaffMember,
            entity_id: registration.staff_member_id.to_string(),
            link: format!("/staff/{}", registration.staff_member_id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}

/// Mandatory training expiring within the next 90 days for active staff.
pub async fn check_training_expiries(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let today = now.date_naive();
    let until = today + Duration::days(TRAINING_EXPIRY_WINDOW_DAYS);
    let expiring = db::mandatory_training_expiring(pool, organisation_id, today, until).await?;

    let mut created = 0;
    for record in expiring {
        let violation = Violation {
            title: format!(
                "Mandatory training expiring for {} {}: {}",
                record.first_name, record.last_name, record.course_name
            ),
            message: format!(
                "{} training for {} {} expires on {}.",
                record.course_name,
                record.first_name,
                record.last_name,
                record.expiry_date.format("%-d %B %Y")
            ),
            entity_kind: EntityKind::TrainingRecord,
            entity_id: record.id.to_string(),
            link: format!("/staff/{}/training", record.staff_member_id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}

/// Active personal plans whose review date passed more than 28 days ago.
pub async fn check_personal_plan_reviews(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let cutoff = now.date_naive() - Duration::days(PLAN_REVIEW_GRACE_DAYS);
    let overdue = db::personal_plans_overdue(pool, organisation_id, cutoff).await?;

    let mut created = 0;
    for plan in overdue {
        let violation = Violation {
            title: format!(
                "Personal plan review overdue for {} {}",
                plan.first_name, plan.last_name
            ),
            message: format!(
                "The personal plan for {} {} was due for review on {}.",
                plan.first_name,
                plan.last_name,
                plan.next_review_date.format("%-d %B %Y")
            ),
            entity_kind: EntityKind::PersonalPlan,
            entity_id: plan.id.to_string(),
            link: format!("/clients/{}/personal-plan", plan.client_id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}

/// Active clients whose most recent annual review is older than 12 months,
/// or who have never been reviewed at all.
pub async fn check_annual_reviews(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let cutoff = now.date_naive() - Months::new(ANNUAL_REVIEW_MONTHS);
    let overdue = db::clients_with_annual_review_overdue(pool, organisation_id, cutoff).await?;

    let mut created = 0;
    for client in overdue {
        let message = match client.last_review_date {
            Some(last) => format!(
                "The last annual review for {} {} was on {}.",
                client.first_name,
                client.last_name,
                last.format("%-d %B %Y")
            ),
            None => format!(
                "No annual review has been recorded for {} {}.",
                client.first_name, client.last_name
            ),
        };
        let violation = Violation {
            title: format!(
                "Annual review overdue for {} {}",
                client.first_name, client.last_name
            ),
            message,
            entity_kind: EntityKind::Client,
            entity_id: client.id.to_string(),
            link: format!("/clients/{}", client.id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}

/// Active policies whose next review date has passed.
pub async fn check_policy_reviews(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let today = now.date_naive();
    let overdue = db::policies_overdue(pool, organisation_id, today).await?;

    let mut created = 0;
    for policy in overdue {
        let violation = Violation {
            title: format!("Policy review overdue: {}", policy.name),
            message: format!(
                "The policy \"{}\" was due for review on {}.",
                policy.name,
                policy.next_review_date.format("%-d %B %Y")
            ),
            entity_kind: EntityKind::Policy,
            entity_id: policy.id.to_string(),
            link: format!("/policies/{}", policy.id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}

/// Equipment checks whose next check date has passed.
pub async fn check_equipment_checks(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let today = now.date_naive();
    let overdue = db::equipment_checks_overdue(pool, organisation_id, today).await?;

    let mut created = 0;
    for check in overdue {
        let violation = Violation {
            title: format!("Equipment check overdue: {}", check.equipment_name),
            message: format!(
                "The check for {} was due on {}.",
                check.equipment_name,
                check.next_check_date.format("%-d %B %Y")
            ),
            entity_kind: EntityKind::EquipmentCheck,
            entity_id: check.id.to_string(),
            link: format!("/equipment/{}", check.id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}

/// Incidents still open more than 14 days after they occurred.
pub async fn check_stale_incidents(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
) -> Result<u64> {
    let cutoff = now.date_naive() - Duration::days(STALE_INCIDENT_DAYS);
    let stale = db::stale_open_incidents(pool, organisation_id, cutoff).await?;

    let mut created = 0;
    for incident in stale {
        let violation = Violation {
            title: format!("Incident {} still open", incident.reference),
            message: format!(
                "Incident {} ({}) dated {} has been open for more than {} days.",
                incident.reference,
                incident.category,
                incident.incident_date.format("%-d %B %Y"),
                STALE_INCIDENT_DAYS
            ),
            entity_kind: EntityKind::Incident,
            entity_id: incident.id.to_string(),
            link: format!("/incidents/{}", incident.id),
        };
        created += notifier::notify_audience(pool, now, organisation_id, &violation).await?;
    }

    Ok(created)
}
