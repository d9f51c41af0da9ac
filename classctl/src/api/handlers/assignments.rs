//! Assignment handlers (`assignment/` and `assignments/` namespaces).

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::handlers::{require_tenant, uploads},
    api::models::assessments::{AssignmentCreate, AssignmentResponse, GradeSubmissionRequest, SubmissionResponse},
    auth::current_user::{StudentUser, Subscribed, TeacherUser},
    db::handlers::{Assignments, Students, Teachers},
    db::models::assessments::{AssignmentCreateDBRequest, SubmissionCreateDBRequest, SubmissionStatus},
    errors::{Error, Result},
    AppState,
};

/// Create an assignment for one or more classes.
#[utoipa::path(
    post,
    path = "/assignment/teacher/assignments/",
    request_body = AssignmentCreate,
    tag = "assignments",
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 402, description = "Subscription required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_assignment(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Json(request): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>)> {
    let tenant_id = require_tenant(&user)?;

    if request.class_ids.is_empty() {
        return Err(Error::BadRequest {
            message: "Select at least one class".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut tx);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut assignments = Assignments::new(&mut tx);
    let assignment = assignments
        .create(&AssignmentCreateDBRequest {
            tenant_id,
            teacher_id: teacher.id,
            subject_id: request.subject_id,
            class_ids: request.class_ids,
            title: request.title,
            description: request.description.unwrap_or_default(),
            attachment: request.attachment,
            due_date: request.due_date,
            total_marks: request.total_marks,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment, Utc::now()))))
}

/// The logged-in teacher's assignments with submission counts.
#[utoipa::path(
    get,
    path = "/assignment/teacher/assignments/",
    tag = "assignments",
    responses((status = 200, description = "Own assignments", body = Vec<AssignmentResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn teacher_assignments(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
) -> Result<Json<Vec<AssignmentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut conn);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut assignments = Assignments::new(&mut conn);
    let list = assignments.list_for_teacher(teacher.id).await?;

    let now = Utc::now();
    Ok(Json(list.into_iter().map(|a| AssignmentResponse::from_db(a, now)).collect()))
}

/// Submissions for one of the teacher's assignments.
#[utoipa::path(
    get,
    path = "/assignment/teacher/assignments/{assignment_id}/submissions/",
    tag = "assignments",
    responses(
        (status = 200, description = "Submissions", body = Vec<SubmissionResponse>),
        (status = 404, description = "Assignment not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn assignment_submissions(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Path(assignment_id): Path<Uuid>,
) -> Result<Json<Vec<SubmissionResponse>>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut assignments = Assignments::new(&mut conn);
    assignments.get_by_id(assignment_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Assignment".to_string(),
        id: assignment_id.to_string(),
    })?;

    let list = assignments.list_submissions(assignment_id).await?;

    Ok(Json(list.into_iter().map(SubmissionResponse::from).collect()))
}

/// Grade a submission; marks may not exceed the assignment total.
#[utoipa::path(
    patch,
    path = "/assignment/teacher/submissions/{submission_id}/grade/",
    request_body = GradeSubmissionRequest,
    tag = "assignments",
    responses(
        (status = 200, description = "Submission graded", body = SubmissionResponse),
        (status = 400, description = "Marks exceed the assignment total"),
        (status = 404, description = "Submission not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn grade_submission(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Path(submission_id): Path<Uuid>,
    Json(request): Json<GradeSubmissionRequest>,
) -> Result<Json<SubmissionResponse>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut assignments = Assignments::new(&mut conn);
    let submission = assignments.get_submission(submission_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Submission".to_string(),
        id: submission_id.to_string(),
    })?;

    let assignment = assignments
        .get_by_id(submission.assignment_id, tenant_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Assignment".to_string(),
            id: submission.assignment_id.to_string(),
        })?;

    if request.marks_obtained < 0.0 || request.marks_obtained > assignment.total_marks as f64 {
        return Err(Error::BadRequest {
            message: format!("Marks must be between 0 and {}", assignment.total_marks),
        });
    }

    let graded = assignments
        .grade_submission(submission_id, request.marks_obtained, request.feedback.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(SubmissionResponse::from(graded)))
}

/// Assignments for the logged-in student's class.
#[utoipa::path(
    get,
    path = "/assignments/student/",
    tag = "assignments",
    responses((status = 200, description = "Assignments for own class", body = Vec<AssignmentResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn student_assignments(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
) -> Result<Json<Vec<AssignmentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let Some(class_id) = student.class_id else {
        return Ok(Json(vec![]));
    };

    let mut assignments = Assignments::new(&mut conn);
    let list = assignments.list_for_class(class_id).await?;

    let now = Utc::now();
    Ok(Json(list.into_iter().map(|a| AssignmentResponse::from_db(a, now)).collect()))
}

/// Hand in an assignment (multipart form: `assignment_id`, `description`,
/// optional `attachment` file). Submitting after the due date is accepted
/// but flagged late.
#[utoipa::path(
    post,
    path = "/assignments/student/submit/",
    tag = "assignments",
    responses(
        (status = 201, description = "Submission stored", body = SubmissionResponse),
        (status = 400, description = "Missing assignment id"),
        (status = 409, description = "Already submitted"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_assignment(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>)> {
    let tenant_id = require_tenant(&user)?;

    let mut assignment_id: Option<Uuid> = None;
    let mut description = String::new();
    let mut attachment: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart request: {e}"),
    })? {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("assignment_id") => {
                let text = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Invalid assignment_id field: {e}"),
                })?;
                assignment_id = Some(text.parse().map_err(|_| Error::BadRequest {
                    message: "assignment_id is not a valid UUID".to_string(),
                })?);
            }
            Some("description") => {
                description = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Invalid description field: {e}"),
                })?;
            }
            Some("attachment") => {
                attachment = Some(uploads::store_field(&state.config.uploads_dir, field).await?);
            }
            _ => {}
        }
    }

    let assignment_id = assignment_id.ok_or_else(|| Error::BadRequest {
        message: "Missing assignment_id".to_string(),
    })?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut assignments = Assignments::new(&mut conn);
    let assignment = assignments.get_by_id(assignment_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Assignment".to_string(),
        id: assignment_id.to_string(),
    })?;

    let status = late_status(Utc::now(), assignment.due_date);

    let submission_id = assignments
        .create_submission(&SubmissionCreateDBRequest {
            assignment_id,
            student_id: student.id,
            description,
            attachment,
            status,
        })
        .await?;

    let submission = assignments.get_submission(submission_id).await?.ok_or_else(|| Error::Internal {
        operation: "load created submission".to_string(),
    })?;

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from(submission))))
}

/// Late detection happens at submission time, against the clock.
fn late_status(now: DateTime<Utc>, due: DateTime<Utc>) -> SubmissionStatus {
    if now > due {
        SubmissionStatus::Late
    } else {
        SubmissionStatus::Submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_time_submission() {
        let due = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(late_status(Utc::now(), due), SubmissionStatus::Submitted);
    }

    #[test]
    fn test_late_submission() {
        let due = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(late_status(Utc::now(), due), SubmissionStatus::Late);
    }
}
