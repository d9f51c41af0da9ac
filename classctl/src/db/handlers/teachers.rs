//! Database repository for teacher profiles.
//!
//! A teacher is a user row plus a profile row; lists and lookups always
//! return the joined view.

use crate::db::errors::{DbError, Result};
use crate::db::models::users::{TeacherCreateDBRequest, TeacherDBResponse};
use crate::types::{abbrev_uuid, TeacherId, TenantId, UserId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const TEACHER_SELECT: &str = r#"
    SELECT tp.id, tp.user_id, u.full_name, u.email, u.phone, u.gender, u.profile_image,
           tp.qualification, tp.salary, tp.joining_date, tp.created_at
    FROM teacher_profiles tp
    JOIN users u ON u.id = tp.user_id
"#;

pub struct Teachers<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Teachers<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &TeacherCreateDBRequest) -> Result<TeacherId> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO teacher_profiles (id, user_id, qualification, salary, joining_date) VALUES ($1, $2, $3, $4, $5)")
            .bind(id)
            .bind(request.user_id)
            .bind(&request.qualification)
            .bind(request.salary)
            .bind(request.joining_date)
            .execute(&mut *self.db)
            .await?;

        Ok(id)
    }

    #[instrument(skip(self), fields(teacher_id = %abbrev_uuid(&id), tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn get_by_id(&mut self, id: TeacherId, tenant_id: TenantId) -> Result<Option<TeacherDBResponse>> {
        let teacher = sqlx::query_as::<_, TeacherDBResponse>(&format!("{TEACHER_SELECT} WHERE tp.id = $1 AND u.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(teacher)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<TeacherDBResponse>> {
        let teacher = sqlx::query_as::<_, TeacherDBResponse>(&format!("{TEACHER_SELECT} WHERE tp.user_id = $1"))
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(teacher)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list(&mut self, tenant_id: TenantId) -> Result<Vec<TeacherDBResponse>> {
        let teachers = sqlx::query_as::<_, TeacherDBResponse>(&format!(
            "{TEACHER_SELECT} WHERE u.tenant_id = $1 ORDER BY u.full_name NULLS LAST"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(teachers)
    }

    /// Update the profile columns; user columns travel through `Users::update`
    /// in the same transaction.
    #[instrument(skip(self), fields(teacher_id = %abbrev_uuid(&id)), err)]
    pub async fn update_profile(
        &mut self,
        id: TeacherId,
        qualification: Option<&str>,
        salary: Option<Decimal>,
        joining_date: Option<NaiveDate>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE teacher_profiles SET \
                 qualification = COALESCE($2, qualification), \
                 salary = COALESCE($3, salary), \
                 joining_date = COALESCE($4, joining_date) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(qualification)
        .bind(salary)
        .bind(joining_date)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
