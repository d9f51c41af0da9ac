//! Database repository for subjects.

use crate::db::errors::{DbError, Result};
use crate::db::models::classroom::SubjectDBResponse;
use crate::types::{abbrev_uuid, SubjectId, TenantId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Subjects<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Subjects<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id), name = %name), err)]
    pub async fn create(&mut self, tenant_id: TenantId, name: &str) -> Result<SubjectDBResponse> {
        let subject = sqlx::query_as::<_, SubjectDBResponse>(
            "INSERT INTO subjects (id, tenant_id, name) VALUES ($1, $2, $3) RETURNING id, tenant_id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(subject)
    }

    #[instrument(skip(self), fields(subject_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SubjectId, tenant_id: TenantId) -> Result<Option<SubjectDBResponse>> {
        let subject =
            sqlx::query_as::<_, SubjectDBResponse>("SELECT id, tenant_id, name, created_at FROM subjects WHERE id = $1 AND tenant_id = $2")
                .bind(id)
                .bind(tenant_id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(subject)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list(&mut self, tenant_id: TenantId) -> Result<Vec<SubjectDBResponse>> {
        let subjects =
            sqlx::query_as::<_, SubjectDBResponse>("SELECT id, tenant_id, name, created_at FROM subjects WHERE tenant_id = $1 ORDER BY name")
                .bind(tenant_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(subjects)
    }

    #[instrument(skip(self), fields(subject_id = %abbrev_uuid(&id)), err)]
    pub async fn rename(&mut self, id: SubjectId, tenant_id: TenantId, name: &str) -> Result<SubjectDBResponse> {
        let subject = sqlx::query_as::<_, SubjectDBResponse>(
            "UPDATE subjects SET name = $3 WHERE id = $1 AND tenant_id = $2 RETURNING id, tenant_id, name, created_at",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(subject)
    }

    #[instrument(skip(self), fields(subject_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: SubjectId, tenant_id: TenantId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
