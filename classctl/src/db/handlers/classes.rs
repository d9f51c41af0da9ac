//! Database repository for school classes.

use crate::db::errors::{DbError, Result};
use crate::db::models::classroom::{ClassCreateDBRequest, ClassDBResponse, ClassUpdateDBRequest, ClassWithStatsDBResponse};
use crate::types::{abbrev_uuid, ClassId, TenantId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const CLASS_COLUMNS: &str =
    "id, tenant_id, name, division, class_teacher_id, max_students, academic_year, is_active, created_at, updated_at";

pub struct Classes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Classes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(tenant_id = %abbrev_uuid(&request.tenant_id), name = %request.name), err)]
    pub async fn create(&mut self, request: &ClassCreateDBRequest) -> Result<ClassDBResponse> {
        let class = sqlx::query_as::<_, ClassDBResponse>(&format!(
            r#"
            INSERT INTO school_classes (id, tenant_id, name, division, class_teacher_id, max_students, academic_year)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CLASS_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(&request.name)
        .bind(&request.division)
        .bind(request.class_teacher_id)
        .bind(request.max_students)
        .bind(&request.academic_year)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(class)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&id), tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn get_by_id(&mut self, id: ClassId, tenant_id: TenantId) -> Result<Option<ClassDBResponse>> {
        let class = sqlx::query_as::<_, ClassDBResponse>(&format!(
            "SELECT {CLASS_COLUMNS} FROM school_classes WHERE id = $1 AND tenant_id = $2 AND is_active"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(class)
    }

    /// Active classes with live student counts and the class teacher's name.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_with_stats(&mut self, tenant_id: TenantId) -> Result<Vec<ClassWithStatsDBResponse>> {
        let classes = sqlx::query_as::<_, ClassWithStatsDBResponse>(
            r#"
            SELECT c.id, c.name, c.division, c.academic_year, c.max_students,
                   (SELECT COUNT(*) FROM student_profiles sp WHERE sp.class_id = c.id) AS current_students,
                   u.full_name AS teacher_name
            FROM school_classes c
            LEFT JOIN teacher_profiles tp ON tp.id = c.class_teacher_id
            LEFT JOIN users u ON u.id = tp.user_id
            WHERE c.tenant_id = $1 AND c.is_active
            ORDER BY c.name, c.division
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(classes)
    }

    #[instrument(skip(self, request), fields(class_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: ClassId, tenant_id: TenantId, request: &ClassUpdateDBRequest) -> Result<ClassDBResponse> {
        let class = sqlx::query_as::<_, ClassDBResponse>(&format!(
            r#"
            UPDATE school_classes SET
                name = COALESCE($3, name),
                division = COALESCE($4, division),
                class_teacher_id = COALESCE($5, class_teacher_id),
                max_students = COALESCE($6, max_students),
                academic_year = COALESCE($7, academic_year),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND is_active
            RETURNING {CLASS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .bind(&request.name)
        .bind(&request.division)
        .bind(request.class_teacher_id)
        .bind(request.max_students)
        .bind(&request.academic_year)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(class)
    }

    /// Soft delete. Callers must first verify no students are assigned.
    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&id)), err)]
    pub async fn deactivate(&mut self, id: ClassId, tenant_id: TenantId) -> Result<bool> {
        let result = sqlx::query("UPDATE school_classes SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Classes the given teacher is class-teacher of.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_for_class_teacher(&mut self, tenant_id: TenantId, teacher_id: Uuid) -> Result<Vec<ClassDBResponse>> {
        let classes = sqlx::query_as::<_, ClassDBResponse>(&format!(
            "SELECT {CLASS_COLUMNS} FROM school_classes WHERE tenant_id = $1 AND class_teacher_id = $2 AND is_active ORDER BY name, division"
        ))
        .bind(tenant_id)
        .bind(teacher_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(classes)
    }
}
