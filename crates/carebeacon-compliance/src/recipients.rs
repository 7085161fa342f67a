// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Recipient resolution for compliance notifications.
//!
//! Compliance alerts go to the organisation's manager tier: active users
//! holding one of the three elevated roles. The set is resolved fresh on
//! every notifier call; it is never cached or persisted.

use sqlx::PgPool;
use uuid::Uuid;

/// Roles entitled to receive compliance notifications.
pub const MANAGER_TIER_ROLES: [&str; 3] =
    ["organisation_manager", "organisation_admin", "super_admin"];

/// Resolve the manager-tier audience for an organisation.
pub async fn manager_tier_recipients(
    pool: &PgPool,
    organisation_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM users
        WHERE organisation_id = $1
          AND is_active
          AND role = ANY($2)
        ORDER BY created_at ASC
        "#,
    )
    .bind(organisation_id)
    .bind(&MANAGER_TIER_ROLES[..])
    .fetch_all(pool)
    .await
}
