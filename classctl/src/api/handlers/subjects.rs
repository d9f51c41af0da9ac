//! Subject handlers (`classroom/subjects/` namespace).
//!
//! Simple CRUD with edit-in-place semantics: the client keeps the id of the
//! row being edited and PUTs to it, or POSTs a fresh one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::handlers::require_tenant,
    api::models::{
        auth::MessageResponse,
        classroom::{SubjectCreate, SubjectResponse},
    },
    auth::current_user::{AdminUser, Subscribed, TeacherUser},
    db::handlers::Subjects,
    errors::{Error, Result},
    types::SubjectId,
    AppState,
};

#[utoipa::path(
    post,
    path = "/classroom/subjects/",
    request_body = SubjectCreate,
    tag = "classroom",
    responses(
        (status = 201, description = "Subject created", body = SubjectResponse),
        (status = 409, description = "Subject already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_subject(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<SubjectCreate>,
) -> Result<(StatusCode, Json<SubjectResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subjects = Subjects::new(&mut conn);
    let subject = subjects.create(tenant_id, &request.name).await?;

    Ok((StatusCode::CREATED, Json(SubjectResponse::from(subject))))
}

#[utoipa::path(
    get,
    path = "/classroom/subjects/",
    tag = "classroom",
    responses((status = 200, description = "Subjects of the school", body = Vec<SubjectResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_subjects(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<SubjectResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subjects = Subjects::new(&mut conn);
    let list = subjects.list(tenant_id).await?;

    Ok(Json(list.into_iter().map(SubjectResponse::from).collect()))
}

/// Subjects for the teacher-facing selectors (assignments, exams).
#[utoipa::path(
    get,
    path = "/classroom/teacher/subjects/dropdown",
    tag = "classroom",
    responses((status = 200, description = "Subjects of the school", body = Vec<SubjectResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn teacher_subject_dropdown(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
) -> Result<Json<Vec<SubjectResponse>>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subjects = Subjects::new(&mut conn);
    let list = subjects.list(tenant_id).await?;

    Ok(Json(list.into_iter().map(SubjectResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/classroom/subjects/{subject_id}/",
    request_body = SubjectCreate,
    tag = "classroom",
    responses(
        (status = 200, description = "Subject renamed", body = SubjectResponse),
        (status = 404, description = "Subject not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_subject(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(subject_id): Path<SubjectId>,
    Json(request): Json<SubjectCreate>,
) -> Result<Json<SubjectResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subjects = Subjects::new(&mut conn);
    let subject = subjects.rename(subject_id, tenant_id, &request.name).await?;

    Ok(Json(SubjectResponse::from(subject)))
}

#[utoipa::path(
    delete,
    path = "/classroom/subjects/{subject_id}/",
    tag = "classroom",
    responses(
        (status = 200, description = "Subject deleted", body = MessageResponse),
        (status = 404, description = "Subject not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_subject(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(subject_id): Path<SubjectId>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subjects = Subjects::new(&mut conn);
    let deleted = subjects.delete(subject_id, tenant_id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "Subject".to_string(),
            id: subject_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "Subject deleted successfully".to_string(),
    }))
}
