// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Database queries feeding the compliance rule evaluators.
//!
//! The wider Carebeacon product owns the entity tables (staff, clients,
//! policies, incidents, ...); this module reads them to find records on the
//! alerting side of each rule's threshold. Queries that compare a nullable
//! date column filter on `IS NOT NULL`, so records without the date never
//! reach a comparison and are simply excluded from that rule's result set.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

/// Organisation record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Organisation {
    /// Unique identifier for the organisation.
    pub id: Uuid,
    /// Display name.
    pub name: String,
}

/// List organisations whose compliance state should be checked.
pub async fn list_active_organisations(pool: &PgPool) -> Result<Vec<Organisation>, sqlx::Error> {
    sqlx::query_as::<_, Organisation>(
        r#"
        SELECT id, name
        FROM organisations
        WHERE is_active
        ORDER BY created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Staff member whose PVG renewal falls inside the warning window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaffPvgDue {
    /// Staff member identifier.
    pub id: Uuid,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// When the PVG scheme record is due for renewal.
    pub pvg_renewal_date: NaiveDate,
}

/// Active staff whose PVG renewal date lies between `from` and `until`
/// inclusive. Staff without a renewal date are excluded by the filter.
pub async fn staff_with_pvg_renewal_due(
    pool: &PgPool,
    organisation_id: Uuid,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<StaffPvgDue>, sqlx::Error> {
    sqlx::query_as::<_, StaffPvgDue>(
        r#"
        SELECT id, first_name, last_name, pvg_renewal_date
        FROM staff_members
        WHERE organisation_id = $1
          AND is_active
          AND pvg_renewal_date IS NOT NULL
          AND pvg_renewal_date >= $2
          AND pvg_renewal_date <= $3
        ORDER BY pvg_renewal_date ASC
        "#,
    )
    .bind(organisation_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// Professional registration approaching expiry, joined to its staff member.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RegistrationExpiring {
    /// Registration record identifier.
    pub id: Uuid,
    /// Staff member the registration belongs to.
    pub staff_member_id: Uuid,
    /// Staff member's first name.
    pub first_name: String,
    /// Staff member's last name.
    pub last_name: String,
    /// When the registration expires.
    pub expiry_date: NaiveDate,
}

/// SSSC registrations for active staff expiring between `from` and `until`.
pub async fn sssc_registrations_expiring(
    pool: &PgPool,
    organisation_id: Uuid,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<RegistrationExpiring>, sqlx::Error> {
    sqlx::query_as::<_, RegistrationExpiring>(
        r#"
        SELECT r.id, r.staff_member_id, s.first_name, s.last_name, r.expiry_date
        FROM staff_registrations r
        JOIN staff_members s ON s.id = r.staff_member_id
        WHERE r.organisation_id = $1
          AND s.is_active
          AND r.registration_type = 'sssc'
          AND r.expiry_date >= $2
          AND r.expiry_date <= $3
        ORDER BY r.expiry_date ASC
        "#,
    )
    .bind(organisation_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// Mandatory training record approaching expiry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrainingExpiring {
    /// Training record identifier.
    pub id: Uuid,
    /// Staff member the record belongs to.
    pub staff_member_id: Uuid,
    /// Staff member's first name.
    pub first_name: String,
    /// Staff member's last name.
    pub last_name: String,
    /// Course the record covers.
    pub course_name: String,
    /// When the training expires.
    pub expiry_date: NaiveDate,
}

/// Mandatory training for active staff expiring between `from` and `until`.
/// Records without an expiry date are excluded by the filter.
pub async fn mandatory_training_expiring(
    pool: &PgPool,
    organisation_id: Uuid,
    from: NaiveDate,
    until: NaiveDate,
) -> Result<Vec<TrainingExpiring>, sqlx::Error> {
    sqlx::query_as::<_, TrainingExpiring>(
        r#"
        SELECT t.id, t.staff_member_id, s.first_name, s.last_name,
               t.course_name, t.expiry_date
        FROM training_records t
        JOIN staff_members s ON s.id = t.staff_member_id
        WHERE t.organisation_id = $1
          AND s.is_active
          AND t.is_mandatory
          AND t.expiry_date IS NOT NULL
          AND t.expiry_date >= $2
          AND t.expiry_date <= $3
        ORDER BY t.expiry_date ASC
        "#,
    )
    .bind(organisation_id)
    .bind(from)
    .bind(until)
    .fetch_all(pool)
    .await
}

/// Personal plan whose review window has been missed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanOverdue {
    /// Plan identifier.
    pub id: Uuid,
    /// Client the plan belongs to.
    pub client_id: Uuid,
    /// Client's first name.
    pub first_name: String,
    /// Client's last name.
    pub last_name: String,
    /// The review date that was missed.
    pub next_review_date: NaiveDate,
}

/// Active personal plans whose next review date fell before `cutoff`.
pub async fn personal_plans_overdue(
    pool: &PgPool,
    organisation_id: Uuid,
    cutoff: NaiveDate,
) -> Result<Vec<PlanOverdue>, sqlx::Error> {
    sqlx::query_as::<_, PlanOverdue>(
        r#"
        SELECT p.id, p.client_id, c.first_name, c.last_name, p.next_review_date
        FROM personal_plans p
        JOIN clients c ON c.id = p.client_id
        WHERE p.organisation_id = $1
          AND p.status = 'active'
          AND p.next_review_date IS NOT NULL
          AND p.next_review_date < $2
        ORDER BY p.next_review_date ASC
        "#,
    )
    .bind(organisation_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// Client whose most recent annual review is stale, or who has none at all.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientReviewOverdue {
    /// Client identifier.
    pub id: Uuid,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Date of the most recent review, if any exists.
    pub last_review_date: Option<NaiveDate>,
}

/// Active clients whose newest review predates `cutoff`.
///
/// Clients with zero reviews are included (NULL `last_review_date`), not
/// silently skipped: a client who has never been reviewed is overdue.
pub async fn clients_with_annual_review_overdue(
    pool: &PgPool,
    organisation_id: Uuid,
    cutoff: NaiveDate,
) -> Result<Vec<ClientReviewOverdue>, sqlx::Error> {
    sqlx::query_as::<_, ClientReviewOverdue>(
        r#"
        SELECT c.id, c.first_name, c.last_name, MAX(r.review_date) AS last_review_date
        FROM clients c
        LEFT JOIN client_reviews r ON r.client_id = c.id
        WHERE c.organisation_id = $1
          AND c.is_active
        GROUP BY c.id, c.first_name, c.last_name
        HAVING MAX(r.review_date) IS NULL OR MAX(r.review_date) < $2
        ORDER BY c.id
        "#,
    )
    .bind(organisation_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// Policy whose scheduled review date has passed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PolicyOverdue {
    /// Policy identifier.
    pub id: Uuid,
    /// Policy name.
    pub name: String,
    /// The review date that has passed.
    pub next_review_date: NaiveDate,
}

/// Active policies whose next review date fell before `today`.
pub async fn policies_overdue(
    pool: &PgPool,
    organisation_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<PolicyOverdue>, sqlx::Error> {
    sqlx::query_as::<_, PolicyOverdue>(
        r#"
        SELECT id, name, next_review_date
        FROM policies
        WHERE organisation_id = $1
          AND is_active
          AND next_review_date IS NOT NULL
          AND next_review_date < $2
        ORDER BY next_review_date ASC
        "#,
    )
    .bind(organisation_id)
    .bind(today)
    .fetch_all(pool)
    .await
}

/// Equipment check whose scheduled date has passed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EquipmentCheckOverdue {
    /// Equipment check identifier.
    pub id: Uuid,
    /// Name of the equipment.
    pub equipment_name: String,
    /// The check date that has passed.
    pub next_check_date: NaiveDate,
}

/// Equipment checks in the organisation whose next check date fell before
/// `today`. Not scoped to an active flag; every check in the organisation
/// is considered.
pub async fn equipment_checks_overdue(
    pool: &PgPool,
    organisation_id: Uuid,
    today: NaiveDate,
) -> Result<Vec<EquipmentCheckOverdue>, sqlx::Error> {
    sqlx::query_as::<_, EquipmentCheckOverdue>(
        r#"
        SELECT id, equipment_name, next_check_date
        FROM equipment_checks
        WHERE organisation_id = $1
          AND next_check_date < $2
        ORDER BY next_check_date ASC
        "#,
    )
    .bind(organisation_id)
    .bind(today)
    .fetch_all(pool)
    .await
}

/// Incident still open past the staleness window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StaleIncident {
    /// Incident identifier.
    pub id: Uuid,
    /// Human-facing incident reference.
    pub reference: String,
    /// Incident category.
    pub category: String,
    /// When the incident occurred.
    pub incident_date: NaiveDate,
}

/// Incidents not yet closed whose incident date fell before `cutoff`.
pub async fn stale_open_incidents(
    pool: &PgPool,
    organisation_id: Uuid,
    cutoff: NaiveDate,
) -> Result<Vec<StaleIncident>, sqlx::Error> {
    sqlx::query_as::<_, StaleIncident>(
        r#"
        SELECT id, reference, category, incident_date
        FROM incidents
        WHERE organisation_id = $1
          AND status <> 'closed'
          AND incident_date < $2
        ORDER BY incident_date ASC
        "#,
    )
    .bind(organisation_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await
}

/// Health check for database connectivity.
pub async fn health_check(pool: &PgPool) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| true)
}
