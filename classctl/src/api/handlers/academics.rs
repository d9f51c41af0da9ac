//! Announcement and attendance handlers (`academics/` namespace).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    api::handlers::require_tenant,
    api::models::{
        academics::{
            AnnouncementCreate, AnnouncementResponse, AnnouncementUpdate, AttendanceMarkRequest, AttendanceQuery, AttendanceResponse,
            MonthlyAttendanceQuery,
        },
        auth::MessageResponse,
    },
    auth::current_user::{AdminUser, StudentUser, Subscribed, TeacherUser},
    db::handlers::{Announcements, Attendance, Students, Teachers},
    db::models::academics::{AnnouncementCreateDBRequest, AnnouncementUpdateDBRequest, AttendanceMarkDBRequest, Audience},
    errors::{Error, Result},
    AppState,
};

// -- announcements ---------------------------------------------------------

#[utoipa::path(
    post,
    path = "/academics/create/announcement/",
    request_body = AnnouncementCreate,
    tag = "academics",
    responses(
        (status = 201, description = "Announcement created"),
        (status = 402, description = "Subscription required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_announcement(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<AnnouncementCreate>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut announcements = Announcements::new(&mut conn);
    let announcement = announcements
        .create(&AnnouncementCreateDBRequest {
            tenant_id,
            title: request.title,
            description: request.description,
            attachment: request.attachment,
            target_audience: request.target_audience.unwrap_or(Audience::All),
            expiry_date: request.expiry_date,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Announcement created successfully", "id": announcement.id })),
    ))
}

/// Admin view: every announcement including expired ones.
#[utoipa::path(
    get,
    path = "/academics/admin/announcements/",
    tag = "academics",
    responses((status = 200, description = "All announcements", body = Vec<AnnouncementResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_announcements(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<AnnouncementResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut announcements = Announcements::new(&mut conn);
    let list = announcements.list_all(tenant_id).await?;

    let now = Utc::now();
    Ok(Json(list.into_iter().map(|a| AnnouncementResponse::from_db(a, now)).collect()))
}

/// Role-filtered feed: unexpired announcements addressed to the viewer.
#[utoipa::path(
    get,
    path = "/academics/announcement/audience/",
    tag = "academics",
    responses((status = 200, description = "Announcements for the viewer", body = Vec<AnnouncementResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn audience_announcements(
    State(state): State<AppState>,
    Subscribed(user): Subscribed<crate::api::models::users::CurrentUser>,
) -> Result<Json<Vec<AnnouncementResponse>>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut announcements = Announcements::new(&mut conn);
    let now = Utc::now();
    let list = announcements.list_for_audience(tenant_id, user.role, now).await?;

    Ok(Json(list.into_iter().map(|a| AnnouncementResponse::from_db(a, now)).collect()))
}

#[utoipa::path(
    put,
    path = "/academics/announcements/{announcement_id}/",
    request_body = AnnouncementUpdate,
    tag = "academics",
    responses(
        (status = 200, description = "Announcement updated", body = AnnouncementResponse),
        (status = 404, description = "Announcement not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_announcement(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(announcement_id): Path<Uuid>,
    Json(request): Json<AnnouncementUpdate>,
) -> Result<Json<AnnouncementResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut announcements = Announcements::new(&mut conn);
    let announcement = announcements
        .update(
            announcement_id,
            tenant_id,
            &AnnouncementUpdateDBRequest {
                title: request.title,
                description: request.description,
                attachment: request.attachment,
                target_audience: request.target_audience,
                expiry_date: request.expiry_date,
            },
        )
        .await?;

    Ok(Json(AnnouncementResponse::from_db(announcement, Utc::now())))
}

#[utoipa::path(
    delete,
    path = "/academics/announcements/{announcement_id}/",
    tag = "academics",
    responses(
        (status = 200, description = "Announcement deleted", body = MessageResponse),
        (status = 404, description = "Announcement not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_announcement(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(announcement_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut announcements = Announcements::new(&mut conn);
    let deleted = announcements.delete(announcement_id, tenant_id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "Announcement".to_string(),
            id: announcement_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "Announcement deleted successfully".to_string(),
    }))
}

// -- attendance ------------------------------------------------------------

/// Mark a whole class for one date. Re-marking a student on the same day
/// replaces the earlier status.
#[utoipa::path(
    post,
    path = "/academics/teacher/attendance/mark/",
    request_body = AttendanceMarkRequest,
    tag = "academics",
    responses(
        (status = 200, description = "Attendance recorded"),
        (status = 402, description = "Subscription required"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn mark_attendance(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
    Json(request): Json<AttendanceMarkRequest>,
) -> Result<Json<serde_json::Value>> {
    let tenant_id = require_tenant(&user)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut tx);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut attendance = Attendance::new(&mut tx);
    let mut marked = 0u64;
    for record in &request.records {
        attendance
            .mark(&AttendanceMarkDBRequest {
                tenant_id,
                student_id: record.student_id,
                class_id: request.class_id,
                date: request.date,
                status: record.status,
                marked_by: Some(teacher.id),
            })
            .await?;
        marked += 1;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(json!({ "success": true, "marked": marked })))
}

/// One class's attendance for one date.
#[utoipa::path(
    get,
    path = "/academics/teacher/attendance/",
    tag = "academics",
    params(AttendanceQuery),
    responses((status = 200, description = "Attendance records", body = Vec<AttendanceResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn class_attendance(
    State(state): State<AppState>,
    _teacher: Subscribed<TeacherUser>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<AttendanceResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut attendance = Attendance::new(&mut conn);
    let records = attendance.list_for_class_on(query.class_id, query.date).await?;

    Ok(Json(records.into_iter().map(AttendanceResponse::from).collect()))
}

/// The logged-in student's records for one calendar month.
#[utoipa::path(
    get,
    path = "/academics/student/attendance/monthly/",
    tag = "academics",
    params(MonthlyAttendanceQuery),
    responses((status = 200, description = "Own attendance for the month", body = Vec<AttendanceResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn student_monthly_attendance(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
    Query(query): Query<MonthlyAttendanceQuery>,
) -> Result<Json<Vec<AttendanceResponse>>> {
    if !(1..=12).contains(&query.month) {
        return Err(Error::BadRequest {
            message: "Month must be between 1 and 12".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut attendance = Attendance::new(&mut conn);
    let records = attendance.monthly_for_student(student.id, query.year, query.month).await?;

    Ok(Json(records.into_iter().map(AttendanceResponse::from).collect()))
}
