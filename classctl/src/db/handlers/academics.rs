//! Database repositories for announcements and attendance.

use crate::db::errors::{DbError, Result};
use crate::db::models::academics::{
    AnnouncementCreateDBRequest, AnnouncementDBResponse, AnnouncementUpdateDBRequest, AttendanceDBResponse, AttendanceMarkDBRequest,
};
use crate::types::{abbrev_uuid, ClassId, Role, StudentId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const ANNOUNCEMENT_COLUMNS: &str =
    "id, tenant_id, title, description, attachment, target_audience, expiry_date, created_at, updated_at";

pub struct Announcements<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Announcements<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(tenant_id = %abbrev_uuid(&request.tenant_id)), err)]
    pub async fn create(&mut self, request: &AnnouncementCreateDBRequest) -> Result<AnnouncementDBResponse> {
        let announcement = sqlx::query_as::<_, AnnouncementDBResponse>(&format!(
            r#"
            INSERT INTO announcements (id, tenant_id, title, description, attachment, target_audience, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ANNOUNCEMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.attachment)
        .bind(request.target_audience)
        .bind(request.expiry_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(announcement)
    }

    /// Admin view: everything, newest first, including expired ones.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_all(&mut self, tenant_id: TenantId) -> Result<Vec<AnnouncementDBResponse>> {
        let announcements = sqlx::query_as::<_, AnnouncementDBResponse>(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements WHERE tenant_id = $1 ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(announcements)
    }

    /// Role-filtered feed: unexpired announcements addressed to everyone or
    /// to the viewer's audience.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id), role = %role), err)]
    pub async fn list_for_audience(&mut self, tenant_id: TenantId, role: Role, now: DateTime<Utc>) -> Result<Vec<AnnouncementDBResponse>> {
        let audience = match role {
            Role::Teacher => "teachers",
            Role::Student => "students",
            // Admins and superadmins see the full feed
            _ => "%",
        };

        let announcements = sqlx::query_as::<_, AnnouncementDBResponse>(&format!(
            "SELECT {ANNOUNCEMENT_COLUMNS} FROM announcements \
             WHERE tenant_id = $1 AND expiry_date >= $2 AND (target_audience = 'all' OR target_audience LIKE $3) \
             ORDER BY created_at DESC"
        ))
        .bind(tenant_id)
        .bind(now)
        .bind(audience)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(announcements)
    }

    #[instrument(skip(self, request), fields(announcement_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: Uuid, tenant_id: TenantId, request: &AnnouncementUpdateDBRequest) -> Result<AnnouncementDBResponse> {
        let announcement = sqlx::query_as::<_, AnnouncementDBResponse>(&format!(
            r#"
            UPDATE announcements SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                attachment = COALESCE($5, attachment),
                target_audience = COALESCE($6, target_audience),
                expiry_date = COALESCE($7, expiry_date),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING {ANNOUNCEMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.attachment)
        .bind(request.target_audience)
        .bind(request.expiry_date)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(announcement)
    }

    #[instrument(skip(self), fields(announcement_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: Uuid, tenant_id: TenantId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

const ATTENDANCE_SELECT: &str = r#"
    SELECT a.id, a.student_id, a.class_id, a.date, a.status,
           u.full_name AS student_name, sp.roll_number
    FROM attendance_records a
    JOIN student_profiles sp ON sp.id = a.student_id
    JOIN users u ON u.id = sp.user_id
"#;

pub struct Attendance<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Attendance<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Upsert one student's mark for the day; re-marking replaces the status.
    #[instrument(skip(self, request), fields(student_id = %abbrev_uuid(&request.student_id), date = %request.date), err)]
    pub async fn mark(&mut self, request: &AttendanceMarkDBRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance_records (id, tenant_id, student_id, class_id, date, status, marked_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT attendance_records_student_day_unique
            DO UPDATE SET status = EXCLUDED.status, marked_by = EXCLUDED.marked_by, updated_at = NOW()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(request.student_id)
        .bind(request.class_id)
        .bind(request.date)
        .bind(request.status)
        .bind(request.marked_by)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&class_id), date = %date), err)]
    pub async fn list_for_class_on(&mut self, class_id: ClassId, date: NaiveDate) -> Result<Vec<AttendanceDBResponse>> {
        let records = sqlx::query_as::<_, AttendanceDBResponse>(&format!(
            "{ATTENDANCE_SELECT} WHERE a.class_id = $1 AND a.date = $2 ORDER BY sp.roll_number"
        ))
        .bind(class_id)
        .bind(date)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records)
    }

    /// One student's records for a calendar month.
    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&student_id), year = year, month = month), err)]
    pub async fn monthly_for_student(&mut self, student_id: StudentId, year: i32, month: u32) -> Result<Vec<AttendanceDBResponse>> {
        let records = sqlx::query_as::<_, AttendanceDBResponse>(&format!(
            "{ATTENDANCE_SELECT} WHERE a.student_id = $1 \
             AND EXTRACT(YEAR FROM a.date) = $2 AND EXTRACT(MONTH FROM a.date) = $3 \
             ORDER BY a.date"
        ))
        .bind(student_id)
        .bind(year)
        .bind(month as i32)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records)
    }
}
