//! Database repository for tenants (schools).

use crate::db::errors::Result;
use crate::db::models::tenants::{TenantCreateDBRequest, TenantDBResponse, TenantOverviewDBResponse, TenantStatus};
use crate::types::{abbrev_uuid, TenantId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const TENANT_COLUMNS: &str = "id, institute_name, email, phone, status, created_at, updated_at";

pub struct Tenants<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Tenants<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(institute = %request.institute_name), err)]
    pub async fn create(&mut self, request: &TenantCreateDBRequest) -> Result<TenantDBResponse> {
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&format!(
            "INSERT INTO tenants (id, institute_name, email, phone) VALUES ($1, $2, $3, $4) RETURNING {TENANT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.institute_name)
        .bind(&request.email)
        .bind(&request.phone)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(tenant)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: TenantId) -> Result<Option<TenantDBResponse>> {
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(tenant)
    }

    /// Platform-operator listing with current subscription state and student
    /// counts, newest school first.
    #[instrument(skip(self), err)]
    pub async fn list_overview(&mut self) -> Result<Vec<TenantOverviewDBResponse>> {
        let tenants = sqlx::query_as::<_, TenantOverviewDBResponse>(
            r#"
            SELECT t.id, t.institute_name, t.email, t.phone, t.status, t.created_at,
                   p.plan_name AS plan_name,
                   s.expiry_date AS subscription_expiry,
                   (SELECT COUNT(*) FROM student_profiles sp
                      JOIN users u ON u.id = sp.user_id
                     WHERE u.tenant_id = t.id) AS student_count
            FROM tenants t
            LEFT JOIN LATERAL (
                SELECT plan_id, expiry_date FROM subscriptions
                WHERE tenant_id = t.id AND is_active
                ORDER BY start_date DESC LIMIT 1
            ) s ON TRUE
            LEFT JOIN subscription_plans p ON p.id = s.plan_id
            ORDER BY t.created_at DESC
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(tenants)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&id), status = ?status), err)]
    pub async fn set_status(&mut self, id: TenantId, status: TenantStatus) -> Result<TenantDBResponse> {
        let tenant = sqlx::query_as::<_, TenantDBResponse>(&format!(
            "UPDATE tenants SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {TENANT_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(crate::db::errors::DbError::NotFound)?;

        Ok(tenant)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: TenantId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
