//! Teacher management handlers (`users/teachers/` namespace).
//!
//! Creation is admin-only and subscription-gated; accounts are issued a
//! temporary password and flagged `must_change_password`, so the credential
//! only has to survive until first login.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    api::handlers::require_tenant,
    api::models::{
        auth::MessageResponse,
        users::{TeacherCreate, TeacherResponse, TeacherUpdate},
    },
    auth::current_user::{AdminUser, Subscribed, TeacherUser},
    auth::password,
    db::{
        handlers::{Teachers, Users},
        models::users::{TeacherCreateDBRequest, UserCreateDBRequest, UserUpdateDBRequest},
    },
    email::EmailService,
    errors::{Error, Result},
    types::{Role, TeacherId},
    AppState,
};

/// Create a teacher account and profile; mails the generated credentials.
#[utoipa::path(
    post,
    path = "/users/teachers/create/",
    request_body = TeacherCreate,
    tag = "users",
    responses(
        (status = 201, description = "Teacher created"),
        (status = 402, description = "Subscription required"),
        (status = 409, description = "Username already taken"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_teacher(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<TeacherCreate>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let tenant_id = require_tenant(&admin)?;

    let temp_password = password::generate_temp_password();
    let raw = temp_password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&raw))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut tx);
    let user = users
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email.clone(),
            full_name: Some(request.full_name.clone()),
            role: Role::Teacher,
            tenant_id: Some(tenant_id),
            phone: request.phone,
            gender: request.gender,
            password_hash: Some(password_hash),
            must_change_password: true,
            email_verified: true,
        })
        .await?;

    let mut teachers = Teachers::new(&mut tx);
    let teacher_id = teachers
        .create(&TeacherCreateDBRequest {
            user_id: user.id,
            qualification: request.qualification.unwrap_or_default(),
            salary: request.salary.unwrap_or(Decimal::ZERO),
            joining_date: request.joining_date,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let email_service = EmailService::new(&state.config)?;
    email_service
        .send_credentials_email(&request.email, Some(&request.full_name), &user.username, &temp_password)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "teacher_id": teacher_id }))))
}

#[utoipa::path(
    get,
    path = "/users/teachers/",
    tag = "users",
    responses(
        (status = 200, description = "Teachers of the school", body = Vec<TeacherResponse>),
        (status = 402, description = "Subscription required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_teachers(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<TeacherResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut teachers = Teachers::new(&mut conn);
    let list = teachers.list(tenant_id).await?;

    Ok(Json(list.into_iter().map(TeacherResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/users/teachers/update/{teacher_id}/",
    request_body = TeacherUpdate,
    tag = "users",
    responses(
        (status = 200, description = "Teacher updated", body = MessageResponse),
        (status = 404, description = "Teacher not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_teacher(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(teacher_id): Path<TeacherId>,
    Json(request): Json<TeacherUpdate>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut tx);
    let teacher = teachers.get_by_id(teacher_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher".to_string(),
        id: teacher_id.to_string(),
    })?;

    let mut users = Users::new(&mut tx);
    users
        .update(
            teacher.user_id,
            &UserUpdateDBRequest {
                full_name: request.full_name,
                phone: request.phone,
                ..Default::default()
            },
        )
        .await?;

    let mut teachers = Teachers::new(&mut tx);
    teachers
        .update_profile(teacher_id, request.qualification.as_deref(), request.salary, request.joining_date)
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse {
        message: "Teacher updated successfully".to_string(),
    }))
}

/// Deleting a teacher removes the whole account (profile rows cascade).
#[utoipa::path(
    delete,
    path = "/users/teachers/delete/{teacher_id}/",
    tag = "users",
    responses(
        (status = 200, description = "Teacher deleted", body = MessageResponse),
        (status = 404, description = "Teacher not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_teacher(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(teacher_id): Path<TeacherId>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut conn);
    let teacher = teachers.get_by_id(teacher_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher".to_string(),
        id: teacher_id.to_string(),
    })?;

    let mut users = Users::new(&mut conn);
    users.delete(teacher.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Teacher deleted successfully".to_string(),
    }))
}

/// Own profile, teacher session.
#[utoipa::path(
    get,
    path = "/users/teachers/profile/",
    tag = "users",
    responses(
        (status = 200, description = "Own teacher profile", body = TeacherResponse),
        (status = 403, description = "Not a teacher"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_own_profile(State(state): State<AppState>, TeacherUser(user): TeacherUser) -> Result<Json<TeacherResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut conn);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    Ok(Json(TeacherResponse::from(teacher)))
}

/// Update own profile, teacher session.
#[utoipa::path(
    put,
    path = "/users/teachers/profile/",
    request_body = TeacherUpdate,
    tag = "users",
    responses((status = 200, description = "Profile updated", body = TeacherResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn update_own_profile(
    State(state): State<AppState>,
    TeacherUser(user): TeacherUser,
    Json(request): Json<TeacherUpdate>,
) -> Result<Json<TeacherResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut tx);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut users = Users::new(&mut tx);
    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                full_name: request.full_name,
                phone: request.phone,
                ..Default::default()
            },
        )
        .await?;

    let mut teachers = Teachers::new(&mut tx);
    teachers
        .update_profile(teacher.id, request.qualification.as_deref(), request.salary, request.joining_date)
        .await?;

    let mut teachers = Teachers::new(&mut tx);
    let refreshed = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(TeacherResponse::from(refreshed)))
}
