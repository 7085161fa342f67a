// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Common test infrastructure for carebeacon-compliance integration tests.
//!
//! Provides a TestContext that connects to the database named by
//! TEST_DATABASE_URL, applies migrations, and seeds records. Tests skip
//! (return early) when the variable is not set.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Test context holding the database pool.
pub struct TestContext {
    pub pool: PgPool,
}

impl TestContext {
    /// Connect to the test database and run migrations.
    ///
    /// Returns None when TEST_DATABASE_URL is not set or unreachable, in
    /// which case the caller should skip the test.
    pub async fn new() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&database_url).await.ok()?;
        carebeacon_compliance::migrations::run(&pool).await.ok()?;
        Some(Self { pool })
    }

    /// Wrap an existing pool (used by tests that build their own).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create an organisation with a unique name.
    pub async fn create_organisation(&self) -> Uuid {
        sqlx::query_scalar("INSERT INTO organisations (name) VALUES ($1) RETURNING id")
            .bind(format!("Test Org {}", Uuid::new_v4()))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to create organisation")
    }

    /// Create a user with the given role.
    pub async fn create_user(&self, organisation_id: Uuid, role: &str, is_active: bool) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO users (organisation_id, full_name, email, role, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind("Test User")
        .bind(format!("{}@example.org", Uuid::new_v4()))
        .bind(role)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create user")
    }

    /// Create an active organisation manager.
    pub async fn create_manager(&self, organisation_id: Uuid) -> Uuid {
        self.create_user(organisation_id, "organisation_manager", true)
            .await
    }

    /// Create a staff member.
    pub async fn create_staff_member(
        &self,
        organisation_id: Uuid,
        first_name: &str,
        last_name: &str,
        is_active: bool,
        pvg_renewal_date: Option<NaiveDate>,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO staff_members (organisation_id, first_name, last_name, is_active, pvg_renewal_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(first_name)
        .bind(last_name)
        .bind(is_active)
        .bind(pvg_renewal_date)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create staff member")
    }

    /// Create a professional registration for a staff member.
    pub async fn create_registration(
        &self,
        organisation_id: Uuid,
        staff_member_id: Uuid,
        registration_type: &str,
        expiry_date: NaiveDate,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO staff_registrations (organisation_id, staff_member_id, registration_type, expiry_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(staff_member_id)
        .bind(registration_type)
        .bind(expiry_date)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create registration")
    }

    /// Create a training record for a staff member.
    pub async fn create_training_record(
        &self,
        organisation_id: Uuid,
        staff_member_id: Uuid,
        course_name: &str,
        is_mandatory: bool,
        expiry_date: Option<NaiveDate>,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO training_records (organisation_id, staff_member_id, course_name, is_mandatory, expiry_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(staff_member_id)
        .bind(course_name)
        .bind(is_mandatory)
        .bind(expiry_date)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create training record")
    }

    /// Create a client.
    pub async fn create_client(
        &self,
        organisation_id: Uuid,
        first_name: &str,
        last_name: &str,
        is_active: bool,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO clients (organisation_id, first_name, last_name, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(first_name)
        .bind(last_name)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create client")
    }

    /// Record a review for a client.
    pub async fn create_client_review(
        &self,
        organisation_id: Uuid,
        client_id: Uuid,
        review_date: NaiveDate,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO client_reviews (organisation_id, client_id, review_date)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(client_id)
        .bind(review_date)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create client review")
    }

    /// Create a personal plan for a client.
    pub async fn create_personal_plan(
        &self,
        organisation_id: Uuid,
        client_id: Uuid,
        status: &str,
        next_review_date: Option<NaiveDate>,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO personal_plans (organisation_id, client_id, status, next_review_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(client_id)
        .bind(status)
        .bind(next_review_date)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create personal plan")
    }

    /// Create a policy.
    pub async fn create_policy(
        &self,
        organisation_id: Uuid,
        name: &str,
        is_active: bool,
        next_review_date: Option<NaiveDate>,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO policies (organisation_id, name, is_active, next_review_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(name)
        .bind(is_active)
        .bind(next_review_date)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create policy")
    }

    /// Create an equipment check.
    pub async fn create_equipment_check(
        &self,
        organisation_id: Uuid,
        equipment_name: &str,
        next_check_date: NaiveDate,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO equipment_checks (organisation_id, equipment_name, next_check_date)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(equipment_name)
        .bind(next_check_date)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create equipment check")
    }

    /// Create an incident.
    pub async fn create_incident(
        &self,
        organisation_id: Uuid,
        reference: &str,
        category: &str,
        incident_date: NaiveDate,
        status: &str,
    ) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO incidents (organisation_id, reference, category, incident_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(organisation_id)
        .bind(reference)
        .bind(category)
        .bind(incident_date)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to create incident")
    }

    /// Count notifications created for an organisation.
    pub async fn count_notifications(&self, organisation_id: Uuid) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE organisation_id = $1")
            .bind(organisation_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count notifications")
    }

    /// Fetch (user_id, title, entity_type, entity_id) for every
    /// notification in an organisation, oldest first.
    pub async fn notifications_for(
        &self,
        organisation_id: Uuid,
    ) -> Vec<(Uuid, String, String, String)> {
        sqlx::query_as(
            r#"
            SELECT user_id, title, entity_type, entity_id
            FROM notifications
            WHERE organisation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await
        .expect("Failed to fetch notifications")
    }

    /// Rewrite created_at on every notification in the organisation,
    /// simulating rows written in an earlier window.
    pub async fn backdate_notifications(&self, organisation_id: Uuid, to: DateTime<Utc>) {
        sqlx::query("UPDATE notifications SET created_at = $2 WHERE organisation_id = $1")
            .bind(organisation_id)
            .bind(to)
            .execute(&self.pool)
            .await
            .expect("Failed to backdate notifications");
    }
}
