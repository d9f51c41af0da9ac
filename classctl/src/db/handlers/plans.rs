//! Database repository for subscription plans.

use crate::db::errors::{DbError, Result};
use crate::db::models::subscriptions::{PlanCreateDBRequest, PlanDBResponse, PlanUpdateDBRequest};
use crate::types::{abbrev_uuid, PlanId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const PLAN_COLUMNS: &str = "id, plan_name, description, duration_months, price, currency, max_students, is_active, created_at, updated_at";

pub struct Plans<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Plans<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(plan = %request.plan_name), err)]
    pub async fn create(&mut self, request: &PlanCreateDBRequest) -> Result<PlanDBResponse> {
        let plan = sqlx::query_as::<_, PlanDBResponse>(&format!(
            r#"
            INSERT INTO subscription_plans (id, plan_name, description, duration_months, price, currency, max_students)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&request.plan_name)
        .bind(&request.description)
        .bind(request.duration_months)
        .bind(request.price)
        .bind(&request.currency)
        .bind(request.max_students)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(plan)
    }

    #[instrument(skip(self), fields(plan_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: PlanId) -> Result<Option<PlanDBResponse>> {
        let plan = sqlx::query_as::<_, PlanDBResponse>(&format!("SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(plan)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self, active_only: bool) -> Result<Vec<PlanDBResponse>> {
        let plans = sqlx::query_as::<_, PlanDBResponse>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE is_active OR NOT $1 ORDER BY created_at DESC"
        ))
        .bind(active_only)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(plans)
    }

    #[instrument(skip(self, request), fields(plan_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: PlanId, request: &PlanUpdateDBRequest) -> Result<PlanDBResponse> {
        let plan = sqlx::query_as::<_, PlanDBResponse>(&format!(
            r#"
            UPDATE subscription_plans SET
                plan_name = COALESCE($2, plan_name),
                description = COALESCE($3, description),
                duration_months = COALESCE($4, duration_months),
                price = COALESCE($5, price),
                currency = COALESCE($6, currency),
                max_students = COALESCE($7, max_students),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PLAN_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.plan_name)
        .bind(&request.description)
        .bind(request.duration_months)
        .bind(request.price)
        .bind(&request.currency)
        .bind(request.max_students)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(plan)
    }

    /// Plans are never hard-deleted: existing subscribers remain active until
    /// expiry, the plan just stops being offered.
    #[instrument(skip(self), fields(plan_id = %abbrev_uuid(&id)), err)]
    pub async fn deactivate(&mut self, id: PlanId) -> Result<bool> {
        let result = sqlx::query("UPDATE subscription_plans SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
