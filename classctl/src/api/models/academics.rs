//! API request/response models for announcements and attendance.

use crate::db::models::academics::{AnnouncementDBResponse, AttendanceDBResponse, AttendanceStatus, Audience};
use crate::types::{ClassId, StudentId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnnouncementCreate {
    pub title: String,
    pub description: String,
    pub attachment: Option<String>,
    pub target_audience: Option<Audience>,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnnouncementUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub attachment: Option<String>,
    pub target_audience: Option<Audience>,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnnouncementResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub attachment: Option<String>,
    pub target_audience: Audience,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl AnnouncementResponse {
    pub fn from_db(db: AnnouncementDBResponse, now: DateTime<Utc>) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            attachment: db.attachment,
            target_audience: db.target_audience,
            expiry_date: db.expiry_date,
            is_active: db.expiry_date > now,
            created_at: db.created_at,
        }
    }
}

/// One student's mark within a bulk attendance submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttendanceMark {
    #[schema(value_type = String, format = "uuid")]
    pub student_id: StudentId,
    pub status: AttendanceStatus,
}

/// Bulk mark: a whole class for one date in one request.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttendanceMarkRequest {
    #[schema(value_type = String, format = "uuid")]
    pub class_id: ClassId,
    pub date: NaiveDate,
    pub records: Vec<AttendanceMark>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AttendanceQuery {
    #[param(value_type = String, format = "uuid")]
    pub class_id: ClassId,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct MonthlyAttendanceQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub student_id: StudentId,
    pub student_name: Option<String>,
    pub roll_number: i32,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl From<AttendanceDBResponse> for AttendanceResponse {
    fn from(db: AttendanceDBResponse) -> Self {
        Self {
            id: db.id,
            student_id: db.student_id,
            student_name: db.student_name,
            roll_number: db.roll_number,
            date: db.date,
            status: db.status,
        }
    }
}
