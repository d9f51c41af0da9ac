//! API request/response models for assignments and exams.

use crate::db::models::assessments::{
    AssignmentDBResponse, ConcernDBResponse, ConcernStatus, ExamDBResponse, ExamResultDBResponse, ExamStatus, SubmissionDBResponse,
    SubmissionStatus,
};
use crate::types::{ClassId, StudentId, SubjectId};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Percentage of marks obtained, rounded to two decimals.
pub fn percentage(marks: f64, max_marks: i32) -> f64 {
    (marks / max_marks as f64 * 100.0 * 100.0).round() / 100.0
}

/// Letter grade for a percentage. Bands: A+ >= 90, A >= 80, B >= 70,
/// C >= 60, D >= 50, F below.
pub fn grade_for_percentage(pct: f64) -> &'static str {
    if pct >= 90.0 {
        "A+"
    } else if pct >= 80.0 {
        "A"
    } else if pct >= 70.0 {
        "B"
    } else if pct >= 60.0 {
        "C"
    } else if pct >= 50.0 {
        "D"
    } else {
        "F"
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignmentCreate {
    #[schema(value_type = String, format = "uuid")]
    pub subject_id: SubjectId,
    #[schema(value_type = Vec<String>)]
    pub class_ids: Vec<ClassId>,
    pub title: String,
    pub description: Option<String>,
    pub attachment: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_marks: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub title: String,
    pub description: String,
    pub attachment: Option<String>,
    pub due_date: DateTime<Utc>,
    pub total_marks: i32,
    pub submission_count: i64,
    pub is_overdue: bool,
    pub created_at: DateTime<Utc>,
}

impl AssignmentResponse {
    pub fn from_db(db: AssignmentDBResponse, now: DateTime<Utc>) -> Self {
        Self {
            id: db.id,
            subject_id: db.subject_id,
            subject_name: db.subject_name,
            title: db.title,
            description: db.description,
            attachment: db.attachment,
            due_date: db.due_date,
            total_marks: db.total_marks,
            submission_count: db.submission_count,
            is_overdue: now > db.due_date,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmissionCreate {
    #[schema(value_type = String, format = "uuid")]
    pub assignment_id: Uuid,
    pub description: Option<String>,
    pub attachment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmissionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub assignment_id: Uuid,
    #[schema(value_type = String, format = "uuid")]
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

impl From<SubmissionDBResponse> for SubmissionResponse {
    fn from(db: SubmissionDBResponse) -> Self {
        Self {
            id: db.id,
            assignment_id: db.assignment_id,
            student_id: db.student_id,
            student_name: db.student_name,
            description: db.description,
            attachment: db.attachment,
            marks_obtained: db.marks_obtained,
            feedback: db.feedback,
            status: db.status,
            submitted_at: db.submitted_at,
            graded_at: db.graded_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeSubmissionRequest {
    pub marks_obtained: f64,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ExamCreate {
    #[schema(value_type = String, format = "uuid")]
    pub subject_id: SubjectId,
    #[schema(value_type = Vec<String>)]
    pub class_ids: Vec<ClassId>,
    pub title: String,
    pub description: Option<String>,
    pub exam_date: NaiveDate,
    #[schema(value_type = String, format = "time")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = "time")]
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub max_marks: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ExamUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub exam_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "time")]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, format = "time")]
    pub end_time: Option<NaiveTime>,
    pub room: Option<String>,
    pub max_marks: Option<i32>,
    pub status: Option<ExamStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub title: String,
    pub description: String,
    pub exam_date: NaiveDate,
    #[schema(value_type = String, format = "time")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = "time")]
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub max_marks: i32,
    pub status: ExamStatus,
    pub total_students: i64,
    pub results_submitted: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ExamDBResponse> for ExamResponse {
    fn from(db: ExamDBResponse) -> Self {
        Self {
            id: db.id,
            subject_id: db.subject_id,
            subject_name: db.subject_name,
            title: db.title,
            description: db.description,
            exam_date: db.exam_date,
            start_time: db.start_time,
            end_time: db.end_time,
            room: db.room,
            max_marks: db.max_marks,
            status: db.status,
            total_students: db.total_students,
            results_submitted: db.results_submitted,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExamResultResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub exam_id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub student_id: StudentId,
    pub student_name: Option<String>,
    pub roll_number: i32,
    pub exam_title: String,
    pub subject_name: String,
    pub marks_obtained: Option<f64>,
    pub max_marks: i32,
    pub percentage: Option<f64>,
    pub grade: Option<String>,
    pub status: crate::db::models::assessments::ResultStatus,
    pub remarks: String,
    pub graded_at: Option<DateTime<Utc>>,
}

impl From<ExamResultDBResponse> for ExamResultResponse {
    fn from(db: ExamResultDBResponse) -> Self {
        let pct = db.marks_obtained.map(|marks| percentage(marks, db.max_marks));
        Self {
            id: db.id,
            exam_id: db.exam_id,
            student_id: db.student_id,
            student_name: db.student_name,
            roll_number: db.roll_number,
            exam_title: db.exam_title,
            subject_name: db.subject_name,
            marks_obtained: db.marks_obtained,
            max_marks: db.max_marks,
            percentage: pct,
            grade: pct.map(|p| grade_for_percentage(p).to_string()),
            status: db.status,
            remarks: db.remarks,
            graded_at: db.graded_at,
        }
    }
}

/// Grading payload: `marks_obtained: null` marks the student absent.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeResultRequest {
    pub marks_obtained: Option<f64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConcernCreate {
    #[schema(value_type = String, format = "uuid")]
    pub result_id: Uuid,
    pub concern_text: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ConcernReviewRequest {
    pub status: ConcernStatus,
    pub response: Option<String>,
    pub revised_marks: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConcernResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub result_id: Uuid,
    #[schema(value_type = String, format = "uuid")]
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

impl From<ConcernDBResponse> for ConcernResponse {
    fn from(db: ConcernDBResponse) -> Self {
        Self {
            id: db.id,
            result_id: db.result_id,
            student_id: db.student_id,
            student_name: db.student_name,
            exam_title: db.exam_title,
            concern_text: db.concern_text,
            status: db.status,
            response: db.response,
            previous_marks: db.previous_marks,
            revised_marks: db.revised_marks,
            created_at: db.created_at,
            reviewed_at: db.reviewed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        assert_eq!(percentage(33.0, 100), 33.0);
        assert_eq!(percentage(1.0, 3), 33.33);
        assert_eq!(percentage(2.0, 3), 66.67);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(grade_for_percentage(95.0), "A+");
        assert_eq!(grade_for_percentage(90.0), "A+");
        assert_eq!(grade_for_percentage(89.99), "A");
        assert_eq!(grade_for_percentage(80.0), "A");
        assert_eq!(grade_for_percentage(70.0), "B");
        assert_eq!(grade_for_percentage(60.0), "C");
        assert_eq!(grade_for_percentage(50.0), "D");
        assert_eq!(grade_for_percentage(49.99), "F");
        assert_eq!(grade_for_percentage(0.0), "F");
    }

    #[test]
    fn test_ungraded_result_has_no_grade() {
        let db = ExamResultDBResponse {
            id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            student_name: None,
            roll_number: 1,
            marks_obtained: None,
            status: crate::db::models::assessments::ResultStatus::Pending,
            remarks: String::new(),
            max_marks: 100,
            exam_title: "Midterm".to_string(),
            subject_name: "Maths".to_string(),
            graded_at: None,
        };

        let response = ExamResultResponse::from(db);
        assert!(response.percentage.is_none());
        assert!(response.grade.is_none());
    }

    #[test]
    fn test_graded_result_grade_derivation() {
        let db = ExamResultDBResponse {
            id: Uuid::new_v4(),
            exam_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            student_name: None,
            roll_number: 1,
            marks_obtained: Some(42.0),
            status: crate::db::models::assessments::ResultStatus::Graded,
            remarks: String::new(),
            max_marks: 50,
            exam_title: "Midterm".to_string(),
            subject_name: "Maths".to_string(),
            graded_at: Some(Utc::now()),
        };

        let response = ExamResultResponse::from(db);
        assert_eq!(response.percentage, Some(84.0));
        assert_eq!(response.grade.as_deref(), Some("A"));
    }
}
