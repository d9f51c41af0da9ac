//! Database models for assignments and exams.

use crate::types::{ClassId, StudentId, SubjectId, TeacherId, TenantId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database request for creating an assignment
#[derive(Debug, Clone)]
pub struct AssignmentCreateDBRequest {
    pub tenant_id: TenantId,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_ids: Vec<ClassId>,
    pub title: String,
    pub description: String,
    pub attachment: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_marks: i32,
}

/// Database response for an assignment, with display names resolved
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentDBResponse {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub title: String,
    pub description: String,
    pub attachment: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_marks: i32,
    pub submission_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Submission lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Submitted,
    Pending,
    Graded,
    Late,
}

/// Database request for a student handing in an assignment
#[derive(Debug, Clone)]
pub struct SubmissionCreateDBRequest {
    pub assignment_id: Uuid,
    pub student_id: StudentId,
    pub description: String,
    pub attachment: Option<String>,
    pub status: SubmissionStatus,
}

/// Database response for a submission, joined with the student's name
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionDBResponse {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: StudentId,
    pub student_name: Option<String>,
    pub description: String,
    pub attachment: Option<String>,
    pub marks_obtained: Option<f64>,
    pub feedback: String,
    pub status: SubmissionStatus,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Exam scheduling lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

/// Database request for creating an exam
#[derive(Debug, Clone)]
pub struct ExamCreateDBRequest {
    pub tenant_id: TenantId,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_ids: Vec<ClassId>,
    pub title: String,
    pub description: String,
    pub exam_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub max_marks: i32,
}

/// Database request for updating an exam
#[derive(Debug, Clone, Default)]
pub struct ExamUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub exam_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub room: Option<String>,
    pub max_marks: Option<i32>,
    pub status: Option<ExamStatus>,
}

/// Database response for an exam, with subject name and result statistics
#[derive(Debug, Clone, FromRow)]
pub struct ExamDBResponse {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub title: String,
    pub description: String,
    pub exam_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub max_marks: i32,
    pub status: ExamStatus,
    pub total_students: i64,
    pub results_submitted: i64,
    pub created_at: DateTime<Utc>,
}

/// Grading state of one student's result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pending,
    Graded,
    Absent,
}

/// Database response for an exam result, joined with names needed by views
#[derive(Debug, Clone, FromRow)]
pub struct ExamResultDBResponse {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub student_id: StudentId,
    pub student_name: Option<String>,
    pub roll_number: i32,
    pub marks_obtained: Option<f64>,
    pub status: ResultStatus,
    pub remarks: String,
    pub max_marks: i32,
    pub exam_title: String,
    pub subject_name: String,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Review state of a result concern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConcernStatus {
    Pending,
    UnderReview,
    Resolved,
    Rejected,
}

/// Database response for an exam concern
#[derive(Debug, Clone, FromRow)]
pub struct ConcernDBResponse {
    pub id: Uuid,
    pub result_id: Uuid,
    pub student_id: StudentId,
    pub student_name: Option<String>,
    pub exam_title: String,
    pub concern_text: String,
    pub status: ConcernStatus,
    pub response: String,
    pub previous_marks: Option<f64>,
    pub revised_marks: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
