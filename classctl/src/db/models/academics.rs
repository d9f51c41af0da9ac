//! Database models for announcements and attendance.

use crate::types::{ClassId, StudentId, TeacherId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Who an announcement is addressed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    All,
    Teachers,
    Students,
}

/// Database request for creating an announcement
#[derive(Debug, Clone)]
pub struct AnnouncementCreateDBRequest {
    pub tenant_id: TenantId,
    pub title: String,
    pub description: String,
    pub attachment: Option<String>,
    pub target_audience: Audience,
    pub expiry_date: DateTime<Utc>,
}

/// Database request for updating an announcement
#[derive(Debug, Clone, Default)]
pub struct AnnouncementUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub attachment: Option<String>,
    pub target_audience: Option<Audience>,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Database response for an announcement
#[derive(Debug, Clone, FromRow)]
pub struct AnnouncementDBResponse {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub title: String,
    pub description: String,
    pub attachment: Option<String>,
    pub target_audience: Audience,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attendance state for one student on one day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

/// One student's mark for one date; re-marking the same day updates in place
#[derive(Debug, Clone)]
pub struct AttendanceMarkDBRequest {
    pub tenant_id: TenantId,
    pub student_id: StudentId,
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Option<TeacherId>,
}

/// Database response for an attendance record, joined with the student's name
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceDBResponse {
    pub id: Uuid,
    pub student_id: StudentId,
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub student_name: Option<String>,
    pub roll_number: i32,
}
