//! Exam handlers (`exam/` namespace): scheduling, results and concerns.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::handlers::require_tenant,
    api::models::{
        assessments::{
            ConcernCreate, ConcernResponse, ConcernReviewRequest, ExamCreate, ExamResponse, ExamResultResponse, ExamUpdate,
            GradeResultRequest,
        },
        auth::MessageResponse,
    },
    auth::current_user::{StudentUser, Subscribed, TeacherUser},
    db::handlers::{Exams, Students, Teachers},
    db::models::assessments::{ExamCreateDBRequest, ExamUpdateDBRequest},
    errors::{Error, Result},
    AppState,
};

#[utoipa::path(
    post,
    path = "/exam/teacher/exams/",
    request_body = ExamCreate,
    tag = "exams",
    responses(
        (status = 201, description = "Exam scheduled", body = ExamResponse),
        (status = 400, description = "Invalid schedule"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_exam(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Json(request): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>)> {
    let tenant_id = require_tenant(&user)?;

    if request.class_ids.is_empty() {
        return Err(Error::BadRequest {
            message: "Select at least one class".to_string(),
        });
    }
    if request.end_time <= request.start_time {
        return Err(Error::BadRequest {
            message: "End time must be after start time".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut tx);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut exams = Exams::new(&mut tx);
    let exam = exams
        .create(&ExamCreateDBRequest {
            tenant_id,
            teacher_id: teacher.id,
            subject_id: request.subject_id,
            class_ids: request.class_ids,
            title: request.title,
            description: request.description.unwrap_or_default(),
            exam_date: request.exam_date,
            start_time: request.start_time,
            end_time: request.end_time,
            room: request.room,
            max_marks: request.max_marks,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(ExamResponse::from(exam))))
}

#[utoipa::path(
    get,
    path = "/exam/teacher/exams/",
    tag = "exams",
    responses((status = 200, description = "Own exams with result statistics", body = Vec<ExamResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn teacher_exams(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
) -> Result<Json<Vec<ExamResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut conn);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut exams = Exams::new(&mut conn);
    let list = exams.list_for_teacher(teacher.id).await?;

    Ok(Json(list.into_iter().map(ExamResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/exam/teacher/exams/{exam_id}/",
    request_body = ExamUpdate,
    tag = "exams",
    responses(
        (status = 200, description = "Exam updated", body = ExamResponse),
        (status = 404, description = "Exam not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_exam(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Path(exam_id): Path<Uuid>,
    Json(request): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut exams = Exams::new(&mut conn);
    let exam = exams
        .update(
            exam_id,
            tenant_id,
            &ExamUpdateDBRequest {
                title: request.title,
                description: request.description,
                exam_date: request.exam_date,
                start_time: request.start_time,
                end_time: request.end_time,
                room: request.room,
                max_marks: request.max_marks,
                status: request.status,
            },
        )
        .await?;

    Ok(Json(ExamResponse::from(exam)))
}

#[utoipa::path(
    delete,
    path = "/exam/teacher/exams/{exam_id}/",
    tag = "exams",
    responses(
        (status = 200, description = "Exam deleted", body = MessageResponse),
        (status = 404, description = "Exam not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_exam(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut exams = Exams::new(&mut conn);
    let deleted = exams.delete(exam_id, tenant_id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "Exam".to_string(),
            id: exam_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "Exam deleted successfully".to_string(),
    }))
}

/// Roster of results (pending placeholders included) for grading.
#[utoipa::path(
    get,
    path = "/exam/teacher/exams/{exam_id}/results/",
    tag = "exams",
    responses(
        (status = 200, description = "Results by roll number", body = Vec<ExamResultResponse>),
        (status = 404, description = "Exam not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn exam_results(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Path(exam_id): Path<Uuid>,
) -> Result<Json<Vec<ExamResultResponse>>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut exams = Exams::new(&mut conn);

    exams.get_by_id(exam_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Exam".to_string(),
        id: exam_id.to_string(),
    })?;

    let results = exams.results_for_exam(exam_id).await?;

    Ok(Json(results.into_iter().map(ExamResultResponse::from).collect()))
}

/// Grade one result; `marks_obtained: null` marks the student absent.
#[utoipa::path(
    patch,
    path = "/exam/teacher/results/{result_id}/grade/",
    request_body = GradeResultRequest,
    tag = "exams",
    responses(
        (status = 200, description = "Result graded", body = ExamResultResponse),
        (status = 400, description = "Marks exceed the exam maximum"),
        (status = 404, description = "Result not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn grade_result(
    State(state): State<AppState>,
    _teacher: Subscribed<TeacherUser>,
    Path(result_id): Path<Uuid>,
    Json(request): Json<GradeResultRequest>,
) -> Result<Json<ExamResultResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut exams = Exams::new(&mut conn);

    let result = exams.get_result(result_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Exam result".to_string(),
        id: result_id.to_string(),
    })?;

    if let Some(marks) = request.marks_obtained {
        if marks < 0.0 || marks > result.max_marks as f64 {
            return Err(Error::BadRequest {
                message: format!("Marks must be between 0 and {}", result.max_marks),
            });
        }
    }

    let graded = exams
        .grade_result(result_id, request.marks_obtained, request.remarks.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(ExamResultResponse::from(graded)))
}

/// Upcoming and past exams for the logged-in student's class.
#[utoipa::path(
    get,
    path = "/exam/student/exams/",
    tag = "exams",
    responses((status = 200, description = "Exams for own class", body = Vec<ExamResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn student_exams(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
) -> Result<Json<Vec<ExamResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let Some(class_id) = student.class_id else {
        return Ok(Json(vec![]));
    };

    let mut exams = Exams::new(&mut conn);
    let list = exams.list_for_class(class_id).await?;

    Ok(Json(list.into_iter().map(ExamResponse::from).collect()))
}

/// The logged-in student's results with derived percentage and grade.
#[utoipa::path(
    get,
    path = "/exam/student/results/",
    tag = "exams",
    responses((status = 200, description = "Own results", body = Vec<ExamResultResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn student_results(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
) -> Result<Json<Vec<ExamResultResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut exams = Exams::new(&mut conn);
    let results = exams.results_for_student(student.id).await?;

    Ok(Json(results.into_iter().map(ExamResultResponse::from).collect()))
}

/// Raise a concern about one of the student's own results.
#[utoipa::path(
    post,
    path = "/exam/student/concerns/raise/",
    request_body = ConcernCreate,
    tag = "exams",
    responses(
        (status = 201, description = "Concern raised", body = ConcernResponse),
        (status = 403, description = "Result belongs to another student"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn raise_concern(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
    Json(request): Json<ConcernCreate>,
) -> Result<(StatusCode, Json<ConcernResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut exams = Exams::new(&mut conn);
    let result = exams.get_result(request.result_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Exam result".to_string(),
        id: request.result_id.to_string(),
    })?;

    if result.student_id != student.id {
        return Err(Error::Forbidden {
            message: "Cannot raise a concern for another student's result".to_string(),
        });
    }

    let concern_id = exams.create_concern(request.result_id, student.id, &request.concern_text).await?;
    let concern = exams.get_concern(concern_id).await?.ok_or_else(|| Error::Internal {
        operation: "load created concern".to_string(),
    })?;

    Ok((StatusCode::CREATED, Json(ConcernResponse::from(concern))))
}

#[utoipa::path(
    get,
    path = "/exam/student/concerns/",
    tag = "exams",
    responses((status = 200, description = "Own concerns", body = Vec<ConcernResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn student_concerns(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
) -> Result<Json<Vec<ConcernResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut exams = Exams::new(&mut conn);
    let concerns = exams.list_concerns_for_student(student.id).await?;

    Ok(Json(concerns.into_iter().map(ConcernResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/exam/teacher/concerns/",
    tag = "exams",
    responses((status = 200, description = "Concerns on own exams", body = Vec<ConcernResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn teacher_concerns(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
) -> Result<Json<Vec<ConcernResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut conn);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut exams = Exams::new(&mut conn);
    let concerns = exams.list_concerns_for_teacher(teacher.id).await?;

    Ok(Json(concerns.into_iter().map(ConcernResponse::from).collect()))
}

/// Review a concern; resolving with revised marks re-grades the result.
#[utoipa::path(
    post,
    path = "/exam/teacher/concerns/{concern_id}/review/",
    request_body = ConcernReviewRequest,
    tag = "exams",
    responses(
        (status = 200, description = "Concern reviewed", body = ConcernResponse),
        (status = 400, description = "Revised marks exceed the exam maximum"),
        (status = 404, description = "Concern not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn review_concern(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Path(concern_id): Path<Uuid>,
    Json(request): Json<ConcernReviewRequest>,
) -> Result<Json<ConcernResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut tx);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut exams = Exams::new(&mut tx);
    let concern = exams.get_concern(concern_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Concern".to_string(),
        id: concern_id.to_string(),
    })?;

    if let Some(revised) = request.revised_marks {
        let result = exams.get_result(concern.result_id).await?.ok_or_else(|| Error::NotFound {
            resource: "Exam result".to_string(),
            id: concern.result_id.to_string(),
        })?;
        if revised < 0.0 || revised > result.max_marks as f64 {
            return Err(Error::BadRequest {
                message: format!("Revised marks must be between 0 and {}", result.max_marks),
            });
        }
    }

    let reviewed = exams
        .review_concern(
            concern_id,
            teacher.id,
            request.status,
            request.response.as_deref().unwrap_or(""),
            request.revised_marks,
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(ConcernResponse::from(reviewed)))
}
