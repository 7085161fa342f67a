// Copyright (C) 2025 Carebeacon Ltd.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Entity categories that compliance notifications can reference.
//!
//! The tag is stored on the notification record and participates in the
//! duplicate-suppression key, so it is a closed enum rather than a free-form
//! string: a typo cannot silently break dedup matching or navigation links.

use serde::{Deserialize, Serialize};

/// Category of record a notification concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A member of staff.
    StaffMember,
    /// A staff training record.
    TrainingRecord,
    /// A service user.
    Client,
    /// A client's personal plan.
    PersonalPlan,
    /// An organisation policy document.
    Policy,
    /// A piece of equipment subject to periodic checks.
    EquipmentCheck,
    /// A reported incident.
    Incident,
}

impl EntityKind {
    /// Stable tag stored in the notification record.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::StaffMember => "staff_member",
            EntityKind::TrainingRecord => "training_record",
            EntityKind::Client => "client",
            EntityKind::PersonalPlan => "personal_plan",
            EntityKind::Policy => "policy",
            EntityKind::EquipmentCheck => "equipment_check",
            EntityKind::Incident => "incident",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "staff_member" => Ok(EntityKind::StaffMember),
            "training_record" => Ok(EntityKind::TrainingRecord),
            "client" => Ok(EntityKind::Client),
            "personal_plan" => Ok(EntityKind::PersonalPlan),
            "policy" => Ok(EntityKind::Policy),
            "equipment_check" => Ok(EntityKind::EquipmentCheck),
            "incident" => Ok(EntityKind::Incident),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}
