//! Student management handlers (`users/students/` namespace).
//!
//! Student creation is capped by the subscription plan's `max_students`;
//! class assignment is capped by the class's own capacity.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    api::handlers::require_tenant,
    api::models::{
        auth::MessageResponse,
        users::{StudentCreate, StudentResponse, StudentUpdate},
    },
    auth::current_user::{AdminUser, StudentUser, Subscribed},
    auth::password,
    db::{
        handlers::{Classes, Students, Subscriptions, Users},
        models::users::{StudentCreateDBRequest, UserCreateDBRequest, UserUpdateDBRequest},
    },
    email::EmailService,
    errors::{Error, Result},
    types::{ClassId, Role, StudentId, TenantId},
    AppState,
};

/// Enforce the plan's student cap before enrolling one more.
async fn check_student_capacity(conn: &mut sqlx::PgConnection, tenant_id: TenantId) -> Result<()> {
    let mut subscriptions = Subscriptions::new(&mut *conn);
    let latest = subscriptions.latest_for_tenant(tenant_id).await?;

    let Some(subscription) = latest else {
        return Err(Error::BadRequest {
            message: "No subscription found. Purchase a plan before enrolling students.".to_string(),
        });
    };

    let max_students: i64 = sqlx::query_scalar("SELECT max_students FROM subscription_plans WHERE id = $1")
        .bind(subscription.plan_id)
        .fetch_one(&mut *conn)
        .await
        .map(|m: i32| m as i64)
        .map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut *conn);
    let current = students.count_by_tenant(tenant_id).await?;

    if current >= max_students {
        return Err(Error::BadRequest {
            message: format!("Student limit reached ({max_students}). Upgrade plan."),
        });
    }
    Ok(())
}

/// Reject a class assignment that would overflow the class.
async fn check_class_capacity(conn: &mut sqlx::PgConnection, tenant_id: TenantId, class_id: ClassId) -> Result<()> {
    let mut classes = Classes::new(&mut *conn);
    let class = classes.get_by_id(class_id, tenant_id).await?.ok_or_else(|| Error::BadRequest {
        message: "Invalid class selected".to_string(),
    })?;

    let mut students = Students::new(&mut *conn);
    let current = students.count_by_class(class_id).await?;

    if current >= class.max_students as i64 {
        return Err(Error::BadRequest {
            message: format!("Class capacity reached ({})", class.max_students),
        });
    }
    Ok(())
}

/// Create a student account and profile; mails the generated credentials.
#[utoipa::path(
    post,
    path = "/users/students/create/",
    request_body = StudentCreate,
    tag = "users",
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Student or class limit reached"),
        (status = 402, description = "Subscription required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_student(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<StudentCreate>,
) -> Result<(StatusCode, Json<StudentResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    let temp_password = password::generate_temp_password();
    let raw = temp_password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&raw))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    check_student_capacity(&mut tx, tenant_id).await?;
    if let Some(class_id) = request.school_class {
        check_class_capacity(&mut tx, tenant_id, class_id).await?;
    }

    let mut users = Users::new(&mut tx);
    let user = users
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email.clone(),
            full_name: Some(request.full_name.clone()),
            role: Role::Student,
            tenant_id: Some(tenant_id),
            phone: request.phone,
            gender: request.gender,
            password_hash: Some(password_hash),
            must_change_password: true,
            email_verified: true,
        })
        .await?;

    let mut students = Students::new(&mut tx);
    let student_id = students
        .create(&StudentCreateDBRequest {
            user_id: user.id,
            admission_number: request.admission_number,
            class_id: request.school_class,
            roll_number: request.roll_number.unwrap_or(0),
            admission_date: request.admission_date.unwrap_or_else(|| Utc::now().date_naive()),
            guardian_name: request.guardian_name,
            guardian_contact: request.guardian_contact,
        })
        .await?;

    let mut students = Students::new(&mut tx);
    let created = students.get_by_id(student_id, tenant_id).await?.ok_or_else(|| Error::Internal {
        operation: "load created student".to_string(),
    })?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    let email_service = EmailService::new(&state.config)?;
    email_service
        .send_credentials_email(&request.email, Some(&request.full_name), &user.username, &temp_password)
        .await?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(created))))
}

#[utoipa::path(
    get,
    path = "/users/students/list/",
    tag = "users",
    responses(
        (status = 200, description = "Students of the school", body = Vec<StudentResponse>),
        (status = 402, description = "Subscription required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_students(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<StudentResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut students = Students::new(&mut conn);
    let list = students.list(tenant_id).await?;

    Ok(Json(list.into_iter().map(StudentResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/students/{student_id}/",
    tag = "users",
    responses(
        (status = 200, description = "Student detail", body = StudentResponse),
        (status = 404, description = "Student not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_student(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<StudentResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut students = Students::new(&mut conn);
    let student = students.get_by_id(student_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student".to_string(),
        id: student_id.to_string(),
    })?;

    Ok(Json(StudentResponse::from(student)))
}

#[utoipa::path(
    put,
    path = "/users/students/update/{student_id}/",
    request_body = StudentUpdate,
    tag = "users",
    responses(
        (status = 200, description = "Student updated", body = MessageResponse),
        (status = 400, description = "Class capacity reached"),
        (status = 404, description = "Student not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_student(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(student_id): Path<StudentId>,
    Json(request): Json<StudentUpdate>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut tx);
    let student = students.get_by_id(student_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student".to_string(),
        id: student_id.to_string(),
    })?;

    // Reassignment into a different class must respect that class's capacity
    if let Some(new_class) = request.school_class {
        if student.class_id != Some(new_class) {
            check_class_capacity(&mut tx, tenant_id, new_class).await?;
        }
    }

    let mut users = Users::new(&mut tx);
    users
        .update(
            student.user_id,
            &UserUpdateDBRequest {
                full_name: request.full_name,
                phone: request.phone,
                ..Default::default()
            },
        )
        .await?;

    let mut students = Students::new(&mut tx);
    students
        .update_profile(
            student_id,
            request.roll_number,
            request.school_class,
            request.guardian_name.as_deref(),
            request.guardian_contact.as_deref(),
        )
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MessageResponse {
        message: "Student updated successfully".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/users/students/delete/{student_id}/",
    tag = "users",
    responses(
        (status = 200, description = "Student deleted", body = MessageResponse),
        (status = 404, description = "Student not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_student(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_id(student_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student".to_string(),
        id: student_id.to_string(),
    })?;

    let mut users = Users::new(&mut conn);
    users.delete(student.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Student deleted successfully".to_string(),
    }))
}

/// Own profile, student session.
#[utoipa::path(
    get,
    path = "/users/students/profile/",
    tag = "users",
    responses(
        (status = 200, description = "Own student profile", body = StudentResponse),
        (status = 403, description = "Not a student"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_own_profile(State(state): State<AppState>, StudentUser(user): StudentUser) -> Result<Json<StudentResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    Ok(Json(StudentResponse::from(student)))
}

/// Update own profile, student session (guardian/contact fields only).
#[utoipa::path(
    put,
    path = "/users/students/profile/",
    request_body = StudentUpdate,
    tag = "users",
    responses((status = 200, description = "Profile updated", body = StudentResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn update_own_profile(
    State(state): State<AppState>,
    StudentUser(user): StudentUser,
    Json(request): Json<StudentUpdate>,
) -> Result<Json<StudentResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut tx);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
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

    // Students cannot move themselves between classes
    let mut students = Students::new(&mut tx);
    students
        .update_profile(
            student.id,
            None,
            None,
            request.guardian_name.as_deref(),
            request.guardian_contact.as_deref(),
        )
        .await?;

    let mut students = Students::new(&mut tx);
    let refreshed = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(StudentResponse::from(refreshed)))
}
