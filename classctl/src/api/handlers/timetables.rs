//! Timetable grid handlers (`classroom/` namespace: timeslots, timetables,
//! timetable-entries).
//!
//! The write protocol is deliberately non-optimistic: entry writes return
//! only the entry, never the grid, and every mutation is followed by a
//! client-side re-fetch of `GET timetables/{id}/matrix/`. The rendered grid
//! therefore always equals server state, at the cost of one extra round
//! trip per edit.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    api::handlers::require_tenant,
    api::models::{
        auth::MessageResponse,
        timetables::{
            ClearTimetableRequest, EntryRequest, EntryResponse, TimeSlotRequest, TimeSlotResponse, TimetableCreate, TimetableMatrix,
            TimetableResponse,
        },
    },
    auth::current_user::{AdminUser, StudentUser, Subscribed, TeacherUser},
    db::handlers::{Students, Subjects, Teachers, TimeSlots, Timetables},
    db::models::classroom::{EntryDBRequest, TimeSlotDBRequest},
    errors::{Error, Result},
    types::{EntryId, SlotId, TenantId, TimetableId},
    AppState,
};

// -- time slots ------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/classroom/timeslots/",
    request_body = TimeSlotRequest,
    tag = "timetables",
    responses(
        (status = 201, description = "Time slot created", body = TimeSlotResponse),
        (status = 400, description = "End time not after start time"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_timeslot(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<TimeSlotRequest>,
) -> Result<(StatusCode, Json<TimeSlotResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    if request.end_time <= request.start_time {
        return Err(Error::BadRequest {
            message: "End time must be after start time".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut slots = TimeSlots::new(&mut conn);
    let slot = slots
        .create(
            tenant_id,
            &TimeSlotDBRequest {
                start_time: request.start_time,
                end_time: request.end_time,
                is_break: request.is_break,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TimeSlotResponse::from(slot))))
}

#[utoipa::path(
    get,
    path = "/classroom/timeslots/",
    tag = "timetables",
    responses((status = 200, description = "Slots ordered by start time", body = Vec<TimeSlotResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_timeslots(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<TimeSlotResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut slots = TimeSlots::new(&mut conn);
    let list = slots.list(tenant_id).await?;

    Ok(Json(list.into_iter().map(TimeSlotResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/classroom/timeslots/{slot_id}/",
    request_body = TimeSlotRequest,
    tag = "timetables",
    responses(
        (status = 200, description = "Time slot updated", body = TimeSlotResponse),
        (status = 404, description = "Time slot not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_timeslot(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(slot_id): Path<SlotId>,
    Json(request): Json<TimeSlotRequest>,
) -> Result<Json<TimeSlotResponse>> {
    let tenant_id = require_tenant(&admin)?;

    if request.end_time <= request.start_time {
        return Err(Error::BadRequest {
            message: "End time must be after start time".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut slots = TimeSlots::new(&mut conn);
    let slot = slots
        .update(
            slot_id,
            tenant_id,
            &TimeSlotDBRequest {
                start_time: request.start_time,
                end_time: request.end_time,
                is_break: request.is_break,
            },
        )
        .await?;

    Ok(Json(TimeSlotResponse::from(slot)))
}

#[utoipa::path(
    delete,
    path = "/classroom/timeslots/{slot_id}/",
    tag = "timetables",
    responses(
        (status = 200, description = "Time slot deleted", body = MessageResponse),
        (status = 404, description = "Time slot not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_timeslot(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(slot_id): Path<SlotId>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut slots = TimeSlots::new(&mut conn);
    let deleted = slots.delete(slot_id, tenant_id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "Time slot".to_string(),
            id: slot_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "Time slot deleted".to_string(),
    }))
}

// -- timetables ------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/classroom/timetables/",
    request_body = TimetableCreate,
    tag = "timetables",
    responses(
        (status = 201, description = "Timetable created", body = TimetableResponse),
        (status = 409, description = "Class already has a timetable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_timetable(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<TimetableCreate>,
) -> Result<(StatusCode, Json<TimetableResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut timetables = Timetables::new(&mut conn);
    let timetable = timetables.create(tenant_id, request.school_class).await?;

    Ok((StatusCode::CREATED, Json(TimetableResponse::from(timetable))))
}

#[utoipa::path(
    get,
    path = "/classroom/timetables/",
    tag = "timetables",
    responses((status = 200, description = "Timetables of the school", body = Vec<TimetableResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_timetables(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<TimetableResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut timetables = Timetables::new(&mut conn);
    let list = timetables.list(tenant_id).await?;

    Ok(Json(list.into_iter().map(TimetableResponse::from).collect()))
}

/// The derived grid read model: day -> slot id -> occupied cell.
///
/// Always computed fresh from the entries, so a fetch immediately after any
/// write reflects exactly that write.
#[utoipa::path(
    get,
    path = "/classroom/timetables/{timetable_id}/matrix/",
    tag = "timetables",
    responses(
        (status = 200, description = "Grid read model", body = TimetableMatrix),
        (status = 404, description = "Timetable not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_matrix(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(timetable_id): Path<TimetableId>,
) -> Result<Json<TimetableMatrix>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut timetables = Timetables::new(&mut conn);

    timetables.get_by_id(timetable_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Timetable".to_string(),
        id: timetable_id.to_string(),
    })?;

    let cells = timetables.matrix_cells(timetable_id).await?;
    Ok(Json(TimetableMatrix::from_cells(cells)))
}

// -- timetable entries -----------------------------------------------------

/// Shared validation for entry writes: the cell must address a real,
/// non-break slot of this tenant, the timetable/subject/teacher must all
/// belong to the tenant, and the teacher must be free at that (day, slot).
async fn validate_entry_request(
    conn: &mut sqlx::PgConnection,
    tenant_id: TenantId,
    request: &EntryRequest,
    exclude_entry: Option<EntryId>,
) -> Result<()> {
    let mut timetables = Timetables::new(&mut *conn);
    timetables
        .get_by_id(request.timetable, tenant_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Timetable".to_string(),
            id: request.timetable.to_string(),
        })?;

    let mut slots = TimeSlots::new(&mut *conn);
    let slot = slots.get_by_id(request.slot, tenant_id).await?.ok_or_else(|| Error::BadRequest {
        message: "Invalid time slot".to_string(),
    })?;

    // Break slots have no periods; the grid never offers them for editing
    // and the server refuses them outright
    if slot.is_break {
        return Err(Error::BadRequest {
            message: "Cannot assign a period to a break slot".to_string(),
        });
    }

    let mut subjects = Subjects::new(&mut *conn);
    subjects.get_by_id(request.subject, tenant_id).await?.ok_or_else(|| Error::BadRequest {
        message: "Invalid subject".to_string(),
    })?;

    let mut teachers = Teachers::new(&mut *conn);
    teachers.get_by_id(request.teacher, tenant_id).await?.ok_or_else(|| Error::BadRequest {
        message: "Invalid teacher".to_string(),
    })?;

    let mut timetables = Timetables::new(&mut *conn);
    if let Some(conflict) = timetables
        .find_teacher_conflict(tenant_id, request.teacher, request.day, request.slot, exclude_entry)
        .await?
    {
        return Err(Error::Conflict {
            message: format!(
                "Teacher is already teaching {}-{} at this time",
                conflict.class_name, conflict.class_division
            ),
        });
    }

    Ok(())
}

#[utoipa::path(
    post,
    path = "/classroom/timetable-entries/",
    request_body = EntryRequest,
    tag = "timetables",
    responses(
        (status = 201, description = "Entry created", body = EntryResponse),
        (status = 400, description = "Break slot or invalid reference"),
        (status = 409, description = "Cell occupied or teacher double-booked"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_entry(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    validate_entry_request(&mut conn, tenant_id, &request, None).await?;

    let mut timetables = Timetables::new(&mut conn);
    let entry = timetables
        .create_entry(&EntryDBRequest {
            timetable_id: request.timetable,
            day: request.day,
            slot_id: request.slot,
            subject_id: request.subject,
            teacher_id: request.teacher,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(EntryResponse::from(entry))))
}

#[utoipa::path(
    put,
    path = "/classroom/timetable-entries/{entry_id}/",
    request_body = EntryRequest,
    tag = "timetables",
    responses(
        (status = 200, description = "Entry updated", body = EntryResponse),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Cell occupied or teacher double-booked"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_entry(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(entry_id): Path<EntryId>,
    Json(request): Json<EntryRequest>,
) -> Result<Json<EntryResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut timetables = Timetables::new(&mut conn);
    timetables.get_entry(entry_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Timetable entry".to_string(),
        id: entry_id.to_string(),
    })?;

    validate_entry_request(&mut conn, tenant_id, &request, Some(entry_id)).await?;

    let mut timetables = Timetables::new(&mut conn);
    let entry = timetables
        .update_entry(
            entry_id,
            &EntryDBRequest {
                timetable_id: request.timetable,
                day: request.day,
                slot_id: request.slot,
                subject_id: request.subject,
                teacher_id: request.teacher,
            },
        )
        .await?;

    Ok(Json(EntryResponse::from(entry)))
}

#[utoipa::path(
    delete,
    path = "/classroom/timetable-entries/{entry_id}/",
    tag = "timetables",
    responses(
        (status = 200, description = "Entry removed", body = MessageResponse),
        (status = 404, description = "Entry not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_entry(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(entry_id): Path<EntryId>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut timetables = Timetables::new(&mut conn);
    timetables.get_entry(entry_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Timetable entry".to_string(),
        id: entry_id.to_string(),
    })?;

    timetables.delete_entry(entry_id).await?;

    Ok(Json(MessageResponse {
        message: "Period cleared".to_string(),
    }))
}

/// Remove every entry of one timetable. Other timetables are untouched.
#[utoipa::path(
    post,
    path = "/classroom/timetable-entries/clear-timetable/",
    request_body = ClearTimetableRequest,
    tag = "timetables",
    responses(
        (status = 200, description = "Timetable cleared"),
        (status = 404, description = "Timetable not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn clear_timetable(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<ClearTimetableRequest>,
) -> Result<Json<serde_json::Value>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut timetables = Timetables::new(&mut conn);
    timetables
        .get_by_id(request.timetable_id, tenant_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Timetable".to_string(),
            id: request.timetable_id.to_string(),
        })?;

    let removed = timetables.clear_entries(request.timetable_id).await?;

    Ok(Json(json!({ "success": true, "entries_removed": removed })))
}

// -- read views for teacher and student portals ----------------------------

/// One cell of a teacher's weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TeacherScheduleCell {
    pub day: crate::types::Day,
    #[schema(value_type = String, format = "uuid")]
    pub slot_id: SlotId,
    pub subject: String,
    pub class_label: String,
}

/// The logged-in teacher's own weekly schedule across all class timetables.
#[utoipa::path(
    get,
    path = "/classroom/teacher/timetable/",
    tag = "timetables",
    responses((status = 200, description = "Own schedule", body = Vec<TeacherScheduleCell>))
)]
#[tracing::instrument(skip_all)]
pub async fn teacher_timetable(
    State(state): State<AppState>,
    Subscribed(TeacherUser(user)): Subscribed<TeacherUser>,
) -> Result<Json<Vec<TeacherScheduleCell>>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut teachers = Teachers::new(&mut conn);
    let teacher = teachers.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Teacher profile".to_string(),
        id: user.id.to_string(),
    })?;

    let rows = sqlx::query_as::<_, (crate::types::Day, SlotId, String, String, String)>(
        r#"
        SELECT e.day, e.slot_id, s.name, c.name, c.division
        FROM timetable_entries e
        JOIN timetables tt ON tt.id = e.timetable_id
        JOIN school_classes c ON c.id = tt.class_id
        JOIN subjects s ON s.id = e.subject_id
        WHERE tt.tenant_id = $1 AND e.teacher_id = $2
        "#,
    )
    .bind(tenant_id)
    .bind(teacher.id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| Error::Database(e.into()))?;

    let cells = rows
        .into_iter()
        .map(|(day, slot_id, subject, class_name, division)| TeacherScheduleCell {
            day,
            slot_id,
            subject,
            class_label: format!("{class_name}-{division}"),
        })
        .collect();

    Ok(Json(cells))
}

/// Slots plus matrix, everything a read-only grid needs in one response.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StudentTimetableResponse {
    pub slots: Vec<TimeSlotResponse>,
    pub matrix: TimetableMatrix,
}

/// The logged-in student's class timetable.
#[utoipa::path(
    get,
    path = "/classroom/student/timetable/",
    tag = "timetables",
    responses(
        (status = 200, description = "Own class grid", body = StudentTimetableResponse),
        (status = 404, description = "No class or timetable assigned"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn student_timetable(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
) -> Result<Json<StudentTimetableResponse>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let class_id = student.class_id.ok_or_else(|| Error::NotFound {
        resource: "Class".to_string(),
        id: "none assigned".to_string(),
    })?;

    let mut timetables = Timetables::new(&mut conn);
    let timetable = timetables.get_by_class(class_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Timetable".to_string(),
        id: class_id.to_string(),
    })?;

    let cells = timetables.matrix_cells(timetable.id).await?;

    let mut slots = TimeSlots::new(&mut conn);
    let slot_list = slots.list(tenant_id).await?;

    Ok(Json(StudentTimetableResponse {
        slots: slot_list.into_iter().map(TimeSlotResponse::from).collect(),
        matrix: TimetableMatrix::from_cells(cells),
    }))
}
