//! Class management handlers (`classroom/` namespace, class resources).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::{
    api::handlers::require_tenant,
    api::models::{
        auth::MessageResponse,
        classroom::{ClassCreate, ClassDetailResponse, ClassDropdownItem, ClassListItem, ClassResponse, ClassUpdate},
        users::StudentResponse,
    },
    auth::current_user::{AdminUser, Subscribed, TeacherUser},
    db::handlers::{Classes, Students, Teachers},
    db::models::classroom::{ClassCreateDBRequest, ClassUpdateDBRequest},
    errors::{Error, Result},
    types::ClassId,
    AppState,
};

#[utoipa::path(
    post,
    path = "/classroom/create/class/",
    request_body = ClassCreate,
    tag = "classroom",
    responses(
        (status = 201, description = "Class created"),
        (status = 402, description = "Subscription required"),
        (status = 409, description = "Class already exists for the academic year"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_class(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<ClassCreate>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut classes = Classes::new(&mut conn);
    let class = classes
        .create(&ClassCreateDBRequest {
            tenant_id,
            name: request.name,
            division: request.division,
            class_teacher_id: request.class_teacher,
            max_students: request.max_student.unwrap_or(10),
            academic_year: request.academic_year.unwrap_or_else(|| "2025-2026".to_string()),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "class_id": class.id, "message": "Class created successfully" })),
    ))
}

#[utoipa::path(
    get,
    path = "/classroom/classes/",
    tag = "classroom",
    responses(
        (status = 200, description = "Active classes with live counts", body = Vec<ClassListItem>),
        (status = 402, description = "Subscription required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_classes(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<ClassListItem>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut classes = Classes::new(&mut conn);
    let list = classes.list_with_stats(tenant_id).await?;

    Ok(Json(list.into_iter().map(ClassListItem::from).collect()))
}

#[utoipa::path(
    get,
    path = "/classroom/classes/dropdown/",
    tag = "classroom",
    responses((status = 200, description = "Classes for selectors", body = Vec<ClassDropdownItem>))
)]
#[tracing::instrument(skip_all)]
pub async fn class_dropdown(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<ClassDropdownItem>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut classes = Classes::new(&mut conn);
    let list = classes.list_with_stats(tenant_id).await?;

    Ok(Json(list.into_iter().map(ClassDropdownItem::from).collect()))
}

#[utoipa::path(
    get,
    path = "/classroom/class/details/{class_id}/",
    tag = "classroom",
    responses(
        (status = 200, description = "Class with roster", body = ClassDetailResponse),
        (status = 404, description = "Class not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn class_detail(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(class_id): Path<ClassId>,
) -> Result<Json<ClassDetailResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut classes = Classes::new(&mut conn);
    let class = classes.get_by_id(class_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Class".to_string(),
        id: class_id.to_string(),
    })?;

    let class_teacher = match class.class_teacher_id {
        Some(teacher_id) => {
            let mut teachers = Teachers::new(&mut conn);
            teachers.get_by_id(teacher_id, tenant_id).await?.and_then(|t| t.full_name)
        }
        None => None,
    };

    let mut students = Students::new(&mut conn);
    let roster = students.list_by_class(class_id).await?;

    Ok(Json(ClassDetailResponse {
        class: ClassResponse::from(class),
        class_teacher,
        students: roster.into_iter().map(StudentResponse::from).collect(),
    }))
}

#[utoipa::path(
    put,
    path = "/classroom/update/class/{class_id}/",
    request_body = ClassUpdate,
    tag = "classroom",
    responses(
        (status = 200, description = "Class updated", body = MessageResponse),
        (status = 404, description = "Class not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_class(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(class_id): Path<ClassId>,
    Json(request): Json<ClassUpdate>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut classes = Classes::new(&mut conn);
    classes
        .update(
            class_id,
            tenant_id,
            &ClassUpdateDBRequest {
                name: request.name,
                division: request.division,
                class_teacher_id: request.class_teacher,
                max_students: request.max_student,
                academic_year: request.academic_year,
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Class updated successfully".to_string(),
    }))
}

/// Deactivate a class. Refused while students are still assigned, so nobody
/// silently loses their roster.
#[utoipa::path(
    delete,
    path = "/classroom/delete/class/{class_id}/",
    tag = "classroom",
    responses(
        (status = 200, description = "Class deactivated", body = MessageResponse),
        (status = 400, description = "Students still assigned"),
        (status = 404, description = "Class not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_class(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(class_id): Path<ClassId>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut classes = Classes::new(&mut conn);
    classes.get_by_id(class_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Class".to_string(),
        id: class_id.to_string(),
    })?;

    let mut students = Students::new(&mut conn);
    if students.count_by_class(class_id).await? > 0 {
        return Err(Error::BadRequest {
            message: "This class cannot be deactivated because students are assigned to it. \
                      Please reassign the students to another class first."
                .to_string(),
        });
    }

    let mut classes = Classes::new(&mut conn);
    classes.deactivate(class_id, tenant_id).await?;

    Ok(Json(MessageResponse {
        message: "Class deactivated successfully".to_string(),
    }))
}

/// Classes the logged-in teacher is class-teacher of.
#[utoipa::path(
    get,
    path = "/classroom/teacher/classes/dropdown/",
    tag = "classroom",
    responses((status = 200, description = "Own classes", body = Vec<ClassResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn teacher_class_dropdown(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
) -> Result<Json<Vec<ClassResponse>>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut conn);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut classes = Classes::new(&mut conn);
    let list = classes.list_for_class_teacher(tenant_id, teacher.id).await?;

    Ok(Json(list.into_iter().map(ClassResponse::from).collect()))
}
