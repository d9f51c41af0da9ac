//! Common type definitions shared across the crate.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`TenantId`]: School (tenant) identifier
//! - [`UserId`]: User account identifier
//! - [`ClassId`], [`SubjectId`], [`SlotId`], [`TimetableId`], [`EntryId`]:
//!   classroom entities
//! - [`PlanId`], [`SubscriptionId`], [`PaymentId`]: billing entities
//!
//! The [`Role`] and [`Day`] enums are stored as lowercase text in the
//! database and serialized the same way on the wire, so the values seen by
//! clients match what the database holds.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type TenantId = Uuid;
pub type UserId = Uuid;
pub type TeacherId = Uuid;
pub type StudentId = Uuid;
pub type ClassId = Uuid;
pub type SubjectId = Uuid;
pub type SlotId = Uuid;
pub type TimetableId = Uuid;
pub type EntryId = Uuid;
pub type PlanId = Uuid;
pub type SubscriptionId = Uuid;
pub type PaymentId = Uuid;
pub type BillId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Platform roles. Superadmins operate the platform itself and carry no
/// tenant; the other three roles are always scoped to one school.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::SuperAdmin => write!(f, "superadmin"),
            Role::Admin => write!(f, "admin"),
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

/// School days. Sunday is not a teaching day and has no grid column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Day {
    /// Grid column order, Monday first.
    pub const ALL: [Day; 6] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri, Day::Sat];
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Day::Mon => "mon",
            Day::Tue => "tue",
            Day::Wed => "wed",
            Day::Thu => "thu",
            Day::Fri => "fri",
            Day::Sat => "sat",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrips_as_lowercase() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"superadmin\"");
        let parsed: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(parsed, Role::Teacher);
    }

    #[test]
    fn test_day_order_is_monday_first() {
        assert_eq!(Day::ALL[0], Day::Mon);
        assert_eq!(Day::ALL[5], Day::Sat);
        assert_eq!(Day::ALL.len(), 6);
    }

    #[test]
    fn test_abbrev_uuid() {
        let id: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(abbrev_uuid(&id), "550e8400");
    }
}
