//! Database repositories for the timetable grid: time slots, timetables and
//! their entries.
//!
//! Grid invariants live here:
//! - at most one entry per (timetable, day, slot) - enforced by
//!   `timetable_entries_cell_unique`;
//! - a teacher cannot be booked twice at the same (day, slot) anywhere in
//!   the tenant - checked with [`Timetables::find_teacher_conflict`] before
//!   every write;
//! - clearing a timetable touches exactly that timetable's rows.
//!
//! Writes never return the refreshed grid; callers re-fetch the matrix.

use crate::db::errors::{DbError, Result};
use crate::db::models::classroom::{
    EntryConflictDBResponse, EntryDBRequest, EntryDBResponse, MatrixCellDBResponse, TimeSlotDBRequest, TimeSlotDBResponse,
    TimetableDBResponse,
};
use crate::types::{abbrev_uuid, ClassId, Day, EntryId, SlotId, TenantId, TimetableId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const SLOT_COLUMNS: &str = "id, tenant_id, start_time, end_time, is_break, created_at, updated_at";

const TIMETABLE_SELECT: &str = r#"
    SELECT tt.id, tt.tenant_id, tt.class_id, c.name AS class_name, c.division AS class_division,
           c.academic_year, tt.created_at
    FROM timetables tt
    JOIN school_classes c ON c.id = tt.class_id
"#;

const ENTRY_COLUMNS: &str = "id, timetable_id, day, slot_id, subject_id, teacher_id, created_at, updated_at";

pub struct TimeSlots<'c> {
    db: &'c mut PgConnection,
}

impl<'c> TimeSlots<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn create(&mut self, tenant_id: TenantId, request: &TimeSlotDBRequest) -> Result<TimeSlotDBResponse> {
        let slot = sqlx::query_as::<_, TimeSlotDBResponse>(&format!(
            "INSERT INTO time_slots (id, tenant_id, start_time, end_time, is_break) VALUES ($1, $2, $3, $4, $5) RETURNING {SLOT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.is_break)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(slot)
    }

    #[instrument(skip(self), fields(slot_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SlotId, tenant_id: TenantId) -> Result<Option<TimeSlotDBResponse>> {
        let slot = sqlx::query_as::<_, TimeSlotDBResponse>(&format!(
            "SELECT {SLOT_COLUMNS} FROM time_slots WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(slot)
    }

    /// Slots ordered by start time - the row order of the grid.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list(&mut self, tenant_id: TenantId) -> Result<Vec<TimeSlotDBResponse>> {
        let slots = sqlx::query_as::<_, TimeSlotDBResponse>(&format!(
            "SELECT {SLOT_COLUMNS} FROM time_slots WHERE tenant_id = $1 ORDER BY start_time"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(slots)
    }

    /// Identity is immutable, times and the break flag are not.
    #[instrument(skip(self, request), fields(slot_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: SlotId, tenant_id: TenantId, request: &TimeSlotDBRequest) -> Result<TimeSlotDBResponse> {
        let slot = sqlx::query_as::<_, TimeSlotDBResponse>(&format!(
            "UPDATE time_slots SET start_time = $3, end_time = $4, is_break = $5, updated_at = NOW() \
             WHERE id = $1 AND tenant_id = $2 RETURNING {SLOT_COLUMNS}"
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.is_break)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(slot)
    }

    #[instrument(skip(self), fields(slot_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: SlotId, tenant_id: TenantId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM time_slots WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

pub struct Timetables<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Timetables<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id), class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn create(&mut self, tenant_id: TenantId, class_id: ClassId) -> Result<TimetableDBResponse> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO timetables (id, tenant_id, class_id) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(tenant_id)
            .bind(class_id)
            .execute(&mut *self.db)
            .await?;

        self.get_by_id(id, tenant_id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(timetable_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: TimetableId, tenant_id: TenantId) -> Result<Option<TimetableDBResponse>> {
        let timetable = sqlx::query_as::<_, TimetableDBResponse>(&format!("{TIMETABLE_SELECT} WHERE tt.id = $1 AND tt.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(timetable)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn get_by_class(&mut self, class_id: ClassId) -> Result<Option<TimetableDBResponse>> {
        let timetable = sqlx::query_as::<_, TimetableDBResponse>(&format!("{TIMETABLE_SELECT} WHERE tt.class_id = $1"))
            .bind(class_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(timetable)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list(&mut self, tenant_id: TenantId) -> Result<Vec<TimetableDBResponse>> {
        let timetables = sqlx::query_as::<_, TimetableDBResponse>(&format!(
            "{TIMETABLE_SELECT} WHERE tt.tenant_id = $1 ORDER BY c.name, c.division"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(timetables)
    }

    /// Every occupied cell of the grid with display names resolved. The
    /// matrix read model is assembled from these rows at the API layer.
    #[instrument(skip(self), fields(timetable_id = %abbrev_uuid(&timetable_id)), err)]
    pub async fn matrix_cells(&mut self, timetable_id: TimetableId) -> Result<Vec<MatrixCellDBResponse>> {
        let cells = sqlx::query_as::<_, MatrixCellDBResponse>(
            r#"
            SELECT e.id AS entry_id, e.day, e.slot_id, e.subject_id, s.name AS subject_name,
                   e.teacher_id, u.full_name AS teacher_name
            FROM timetable_entries e
            JOIN subjects s ON s.id = e.subject_id
            JOIN teacher_profiles tp ON tp.id = e.teacher_id
            JOIN users u ON u.id = tp.user_id
            WHERE e.timetable_id = $1
            "#,
        )
        .bind(timetable_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(cells)
    }

    #[instrument(skip(self), fields(entry_id = %abbrev_uuid(&id)), err)]
    pub async fn get_entry(&mut self, id: EntryId, tenant_id: TenantId) -> Result<Option<EntryDBResponse>> {
        let entry = sqlx::query_as::<_, EntryDBResponse>(
            "SELECT e.id, e.timetable_id, e.day, e.slot_id, e.subject_id, e.teacher_id, e.created_at, e.updated_at \
             FROM timetable_entries e JOIN timetables tt ON tt.id = e.timetable_id \
             WHERE e.id = $1 AND tt.tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(entry)
    }

    #[instrument(skip(self, request), fields(timetable_id = %abbrev_uuid(&request.timetable_id), day = %request.day), err)]
    pub async fn create_entry(&mut self, request: &EntryDBRequest) -> Result<EntryDBResponse> {
        let entry = sqlx::query_as::<_, EntryDBResponse>(&format!(
            "INSERT INTO timetable_entries (id, timetable_id, day, slot_id, subject_id, teacher_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.timetable_id)
        .bind(request.day)
        .bind(request.slot_id)
        .bind(request.subject_id)
        .bind(request.teacher_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    #[instrument(skip(self, request), fields(entry_id = %abbrev_uuid(&id)), err)]
    pub async fn update_entry(&mut self, id: EntryId, request: &EntryDBRequest) -> Result<EntryDBResponse> {
        let entry = sqlx::query_as::<_, EntryDBResponse>(&format!(
            "UPDATE timetable_entries SET day = $2, slot_id = $3, subject_id = $4, teacher_id = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(id)
        .bind(request.day)
        .bind(request.slot_id)
        .bind(request.subject_id)
        .bind(request.teacher_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(entry)
    }

    #[instrument(skip(self), fields(entry_id = %abbrev_uuid(&id)), err)]
    pub async fn delete_entry(&mut self, id: EntryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM timetable_entries WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every entry of exactly this timetable. Returns the number of
    /// removed entries.
    #[instrument(skip(self), fields(timetable_id = %abbrev_uuid(&timetable_id)), err)]
    pub async fn clear_entries(&mut self, timetable_id: TimetableId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM timetable_entries WHERE timetable_id = $1")
            .bind(timetable_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Is the teacher already assigned somewhere in this tenant at the same
    /// (day, slot)? Returns the conflicting class for the error message.
    /// `exclude_entry` skips the entry being edited so moving a period within
    /// its own cell does not conflict with itself.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id), day = %day), err)]
    pub async fn find_teacher_conflict(
        &mut self,
        tenant_id: TenantId,
        teacher_id: Uuid,
        day: Day,
        slot_id: SlotId,
        exclude_entry: Option<EntryId>,
    ) -> Result<Option<EntryConflictDBResponse>> {
        let conflict = sqlx::query_as::<_, EntryConflictDBResponse>(
            r#"
            SELECT e.id AS entry_id, c.name AS class_name, c.division AS class_division
            FROM timetable_entries e
            JOIN timetables tt ON tt.id = e.timetable_id
            JOIN school_classes c ON c.id = tt.class_id
            WHERE tt.tenant_id = $1 AND e.teacher_id = $2 AND e.day = $3 AND e.slot_id = $4
              AND ($5::uuid IS NULL OR e.id != $5)
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(teacher_id)
        .bind(day)
        .bind(slot_id)
        .bind(exclude_entry)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(conflict)
    }
}
