//! Database models for classes, subjects and the timetable grid.

use crate::types::{ClassId, Day, EntryId, SlotId, SubjectId, TeacherId, TenantId, TimetableId};
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::FromRow;

/// Database request for creating a school class
#[derive(Debug, Clone)]
pub struct ClassCreateDBRequest {
    pub tenant_id: TenantId,
    pub name: String,
    pub division: String,
    pub class_teacher_id: Option<TeacherId>,
    pub max_students: i32,
    pub academic_year: String,
}

/// Database request for updating a school class; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct ClassUpdateDBRequest {
    pub name: Option<String>,
    pub division: Option<String>,
    pub class_teacher_id: Option<TeacherId>,
    pub max_students: Option<i32>,
    pub academic_year: Option<String>,
}

/// Database response for a school class
#[derive(Debug, Clone, FromRow)]
pub struct ClassDBResponse {
    pub id: ClassId,
    pub tenant_id: TenantId,
    pub name: String,
    pub division: String,
    pub class_teacher_id: Option<TeacherId>,
    pub max_students: i32,
    pub academic_year: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Class list row with live student count and the class teacher's name
#[derive(Debug, Clone, FromRow)]
pub struct ClassWithStatsDBResponse {
    pub id: ClassId,
    pub name: String,
    pub division: String,
    pub academic_year: String,
    pub max_students: i32,
    pub current_students: i64,
    pub teacher_name: Option<String>,
}

/// Database response for a subject
#[derive(Debug, Clone, FromRow)]
pub struct SubjectDBResponse {
    pub id: SubjectId,
    pub tenant_id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Database request for creating or replacing a time slot
#[derive(Debug, Clone)]
pub struct TimeSlotDBRequest {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_break: bool,
}

/// Database response for a time slot
#[derive(Debug, Clone, FromRow)]
pub struct TimeSlotDBResponse {
    pub id: SlotId,
    pub tenant_id: TenantId,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_break: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a timetable, joined with its class label
#[derive(Debug, Clone, FromRow)]
pub struct TimetableDBResponse {
    pub id: TimetableId,
    pub tenant_id: TenantId,
    pub class_id: ClassId,
    pub class_name: String,
    pub class_division: String,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
}

/// Database request for creating or replacing a timetable entry
#[derive(Debug, Clone)]
pub struct EntryDBRequest {
    pub timetable_id: TimetableId,
    pub day: Day,
    pub slot_id: SlotId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
}

/// Database response for a timetable entry
#[derive(Debug, Clone, FromRow)]
pub struct EntryDBResponse {
    pub id: EntryId,
    pub timetable_id: TimetableId,
    pub day: Day,
    pub slot_id: SlotId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One occupied cell of the grid, with display names resolved, as the matrix
/// read model needs it
#[derive(Debug, Clone, FromRow)]
pub struct MatrixCellDBResponse {
    pub entry_id: EntryId,
    pub day: Day,
    pub slot_id: SlotId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub teacher_id: TeacherId,
    pub teacher_name: Option<String>,
}

/// The class a timetable entry conflict was found in (teacher already busy)
#[derive(Debug, Clone, FromRow)]
pub struct EntryConflictDBResponse {
    pub entry_id: EntryId,
    pub class_name: String,
    pub class_division: String,
}
