// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Deduplicating notifier.
//!
//! Fans one rule violation out to the organisation's manager-tier audience,
//! suppressing repeats: a recipient who already has a notification with the
//! same (title, entity type, entity id) created inside the trailing 24-hour
//! window is skipped for this call. The window is recomputed from the
//! evaluation time on every call, so it slides; once it elapses the same
//! condition may alert again even if it was never resolved.
//!
//! # Concurrency
//!
//! The duplicate probe and the batch insert are not atomic across
//! concurrent check runs for the same organisation. Two simultaneous runs
//! can each observe "no duplicate" and both insert. The output is advisory
//! alerting, so this rare double-fire is tolerated rather than guarded with
//! locks.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::entity::EntityKind;
use crate::error::Result;
use crate::recipients;

/// Trailing window, in hours, inside which an identical notification is
/// suppressed per recipient.
pub const DEDUP_WINDOW_HOURS: i64 = 24;

/// One rule evaluator finding for one entity instance.
///
/// Ephemeral: produced and consumed within a single evaluator pass. Only
/// the notification rows it becomes are persisted.
#[derive(Debug, Clone)]
pub struct Violation {
    /// Short human-readable title. Embeds the entity's identifying
    /// attributes and participates in the dedup key, so textually distinct
    /// entities never suppress each other.
    pub title: String,
    /// Detail message describing the offending date, or the absence of one.
    pub message: String,
    /// Category of record the violation concerns.
    pub entity_kind: EntityKind,
    /// Identifier of the concerned record.
    pub entity_id: String,
    /// Navigable path to the record.
    pub link: String,
}

/// Notify the organisation's manager-tier audience about a violation.
///
/// Returns the number of recipients who received a fresh notification this
/// call. Zero is a normal outcome: either there is no audience, or every
/// recipient was already notified inside the window.
pub async fn notify_audience(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
    violation: &Violation,
) -> Result<u64> {
    let audience = recipients::manager_tier_recipients(pool, organisation_id).await?;
    if audience.is_empty() {
        debug!(
            organisation_id = %organisation_id,
            title = %violation.title,
            "No manager-tier recipients for violation"
        );
        return Ok(0);
    }

    let window_start = now - Duration::hours(DEDUP_WINDOW_HOURS);

    let mut pending: Vec<Uuid> = Vec::with_capacity(audience.len());
    for user_id in audience {
        let duplicate =
            recent_duplicate_exists(pool, organisation_id, user_id, violation, window_start)
                .await?;
        if !duplicate {
            pending.push(user_id);
        }
    }

    if pending.is_empty() {
        debug!(
            organisation_id = %organisation_id,
            title = %violation.title,
            "All recipients already notified inside the window"
        );
        return Ok(0);
    }

    insert_batch(pool, now, organisation_id, &pending, violation).await
}

/// Check whether `user_id` already received this violation's notification
/// after `window_start`.
async fn recent_duplicate_exists(
    pool: &PgPool,
    organisation_id: Uuid,
    user_id: Uuid,
    violation: &Violation,
    window_start: DateTime<Utc>,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM notifications
            WHERE organisation_id = $1
              AND user_id = $2
              AND title = $3
              AND entity_type = $4
              AND entity_id = $5
              AND created_at > $6
        )
        "#,
    )
    .bind(organisation_id)
    .bind(user_id)
    .bind(&violation.title)
    .bind(violation.entity_kind.as_str())
    .bind(&violation.entity_id)
    .bind(window_start)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Insert one notification per pending recipient in a single statement.
async fn insert_batch(
    pool: &PgPool,
    now: DateTime<Utc>,
    organisation_id: Uuid,
    user_ids: &[Uuid],
    violation: &Violation,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications
            (organisation_id, user_id, title, message, entity_type, entity_id, link, created_at)
        SELECT $1, r.user_id, $3, $4, $5, $6, $7, $8
        FROM UNNEST($2::uuid[]) AS r(user_id)
        "#,
    )
    .bind(organisation_id)
    .bind(user_ids)
    .bind(&violation.title)
    .bind(&violation.message)
    .bind(violation.entity_kind.as_str())
    .bind(&violation.entity_id)
    .bind(&violation.link)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
