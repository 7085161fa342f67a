// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Carebeacon Compliance - Rule Evaluation and Alerting
//!
//! This crate is the compliance-alerting engine for the Carebeacon
//! care-management platform. It evaluates organisation-wide compliance
//! rules (expiring certifications, overdue reviews, stale policies, open
//! incidents) and emits deduplicated notifications to manager-tier users.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    Periodic trigger                              │
//! │      (in-process ComplianceWorker, or an external scheduler      │
//! │             calling run_all_checks directly)                     │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                   Orchestrator (this crate)                      │
//! │        concurrent fan-out, per-rule outcome summary              │
//! │  ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌────────┐ ┌──────────┐   │
//! │  │   PVG   │ │   SSSC   │ │ Training │ │ Plans/ │ │ Policies/│   │
//! │  │ renewal │ │  expiry  │ │  expiry  │ │Reviews │ │Equipment/│   │
//! │  │         │ │          │ │          │ │        │ │Incidents │   │
//! │  └────┬────┘ └────┬─────┘ └────┬─────┘ └───┬────┘ └────┬─────┘   │
//! │       └───────────┴─────┬──────┴────────────┴──────────┘         │
//! │                         ▼                                        │
//! │      Deduplicating notifier (24h window, manager-tier audience)  │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          PostgreSQL                              │
//! │     (entity tables owned by the wider product; notifications     │
//! │                     owned by this engine)                        │
//! └──────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!            NotificationService (get-unread, get-all,
//!                  mark-read, mark-all-read)
//! ```
//!
//! # Deduplication
//!
//! A notification is keyed by (organisation, recipient, title, entity
//! type, entity id). The notifier suppresses a repeat of the same key
//! inside a trailing 24-hour window, recomputed from the evaluation time
//! on every call. Titles embed the entity's identifying attributes, so two
//! different entities tripping the same rule never suppress each other.
//!
//! # Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `CAREBEACON_DATABASE_URL` | Yes* | - | PostgreSQL connection string |
//! | `DATABASE_URL` | Yes* | - | Fallback if above not set |
//! | `CAREBEACON_CHECKS_ENABLED` | No | `true` | Periodic check worker on/off |
//! | `CAREBEACON_CHECKS_POLL_INTERVAL_SECS` | No | `3600` | Seconds between check cycles |
//!
//! # Modules
//!
//! - [`config`]: Engine configuration from environment variables
//! - [`db`]: PostgreSQL queries feeding the rule evaluators
//! - [`entity`]: Closed enumeration of entity categories
//! - [`error`]: Error types for engine operations
//! - [`migrations`]: Embedded schema migrations
//! - [`notifier`]: Deduplicating audience notifier
//! - [`orchestrator`]: Concurrent check run with per-rule outcomes
//! - [`recipients`]: Manager-tier recipient resolution
//! - [`rules`]: The eight compliance rule evaluators
//! - [`service`]: Consumer-facing notification read/write operations
//! - [`worker`]: Periodic background check worker

#![deny(missing_docs)]

/// Engine configuration loaded from environment variables.
pub mod config;

/// PostgreSQL queries feeding the compliance rule evaluators.
pub mod db;

/// Entity categories that notifications can reference.
pub mod entity;

/// Error types for engine operations.
pub mod error;

/// Embedded database migrations.
pub mod migrations;

/// Deduplicating audience notifier.
pub mod notifier;

/// Orchestration of a full compliance check run.
pub mod orchestrator;

/// Manager-tier recipient resolution.
pub mod recipients;

/// The compliance rule evaluators.
pub mod rules;

/// Consumer-facing notification operations.
pub mod service;

/// Periodic background check worker.
pub mod worker;

pub use config::Config;
pub use error::Error;
