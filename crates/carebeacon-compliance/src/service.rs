// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Consumer-facing notification operations.
//!
//! The request-handling layer reads and acknowledges notifications through
//! these operations, always scoped to the authenticated user and their
//! organisation. Creation normally goes through the deduplicating notifier;
//! [`NotificationService::send`] inserts unconditionally.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entity::EntityKind;
use crate::error::Result;

/// A stored notification.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    /// Unique identifier.
    pub id: Uuid,
    /// Organisation the notification belongs to.
    pub organisation_id: Uuid,
    /// Recipient user.
    pub user_id: Uuid,
    /// Short human-readable title.
    pub title: String,
    /// Detail message.
    pub message: String,
    /// Category tag of the concerned record.
    pub entity_type: String,
    /// Identifier of the concerned record.
    pub entity_id: String,
    /// Navigable path to the record.
    pub link: String,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// When it was read, if it has been.
    pub read_at: Option<DateTime<Utc>>,
    /// When it was created.
    pub created_at: DateTime<Utc>,
}

/// Input for sending a single notification.
#[derive(Debug, Clone)]
pub struct NotificationInput {
    /// Organisation the notification belongs to.
    pub organisation_id: Uuid,
    /// Recipient user.
    pub user_id: Uuid,
    /// Short human-readable title.
    pub title: String,
    /// Detail message.
    pub message: String,
    /// Category of the concerned record.
    pub entity_kind: EntityKind,
    /// Identifier of the concerned record.
    pub entity_id: String,
    /// Navigable path to the record.
    pub link: String,
}

/// Notification read/write service.
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    /// Create a new notification service.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one notification unconditionally.
    pub async fn send(&self, input: &NotificationInput) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO notifications
                (organisation_id, user_id, title, message, entity_type, entity_id, link, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING id
            "#,
        )
        .bind(input.organisation_id)
        .bind(input.user_id)
        .bind(&input.title)
        .bind(&input.message)
        .bind(input.entity_kind.as_str())
        .bind(&input.entity_id)
        .bind(&input.link)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// All unread notifications for a user, newest first.
    pub async fn get_unread(
        &self,
        user_id: Uuid,
        organisation_id: Uuid,
    ) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, organisation_id, user_id, title, message, entity_type,
                   entity_id, link, is_read, read_at, created_at
            FROM notifications
            WHERE user_id = $1
              AND organisation_id = $2
              AND NOT is_read
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(organisation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// The most recent `limit` notifications regardless of read state,
    /// newest first.
    pub async fn get_all(
        &self,
        user_id: Uuid,
        organisation_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, organisation_id, user_id, title, message, entity_type,
                   entity_id, link, is_read, read_at, created_at
            FROM notifications
            WHERE user_id = $1
              AND organisation_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(organisation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Mark one notification read.
    ///
    /// The update matches both id and user, so a user cannot mark another
    /// user's notification. Zero rows matched (foreign, nonexistent, or
    /// already read) is not an error; the first read timestamp is kept.
    ///
    /// Returns true if a row was updated.
    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE,
                read_at = NOW()
            WHERE id = $1
              AND user_id = $2
              AND NOT is_read
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark every currently-unread notification for the user read.
    ///
    /// Returns the number of rows updated. Already-read notifications keep
    /// their original read timestamp.
    pub async fn mark_all_read(&self, user_id: Uuid, organisation_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE,
                read_at = NOW()
            WHERE user_id = $1
              AND organisation_id = $2
              AND NOT is_read
            "#,
        )
        .bind(user_id)
        .bind(organisation_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
