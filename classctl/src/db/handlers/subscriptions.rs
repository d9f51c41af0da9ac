//! Database repository for tenant subscriptions and gateway payments.

use crate::db::errors::{DbError, Result};
use crate::db::models::subscriptions::{
    BillingOverviewDBResponse, PaymentStatus, PlanDBResponse, SubscriptionDBResponse, SubscriptionPaymentDBResponse,
};
use crate::types::{abbrev_uuid, PaymentId, SubscriptionId, TenantId};
use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const SUBSCRIPTION_SELECT: &str = r#"
    SELECT s.id, s.tenant_id, s.plan_id, p.plan_name, s.start_date, s.expiry_date,
           s.is_active, s.payment_reference, s.created_at
    FROM subscriptions s
    JOIN subscription_plans p ON p.id = s.plan_id
"#;

const PAYMENT_COLUMNS: &str =
    "id, tenant_id, subscription_id, amount, currency, razorpay_order_id, razorpay_payment_id, status, created_at";

pub struct Subscriptions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Subscriptions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Whether the tenant currently holds an active, unexpired subscription.
    /// This is the authoritative check behind the subscription gate.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn tenant_has_active(&mut self, tenant_id: TenantId, now: DateTime<Utc>) -> Result<bool> {
        let active: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM subscriptions WHERE tenant_id = $1 AND is_active AND expiry_date >= $2)")
                .bind(tenant_id)
                .bind(now)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(active)
    }

    /// Create a pending subscription for an order that has not been paid yet.
    /// Expiry is derived from the plan duration at creation time.
    #[instrument(skip(self, plan), fields(tenant_id = %abbrev_uuid(&tenant_id), plan_id = %abbrev_uuid(&plan.id)), err)]
    pub async fn create_pending(&mut self, tenant_id: TenantId, plan: &PlanDBResponse) -> Result<SubscriptionId> {
        let id = Uuid::new_v4();
        let start = Utc::now();
        let expiry = start
            .checked_add_months(Months::new(plan.duration_months as u32))
            .ok_or_else(|| DbError::Other(anyhow::anyhow!("subscription expiry out of range")))?;

        sqlx::query(
            "INSERT INTO subscriptions (id, tenant_id, plan_id, start_date, expiry_date, is_active) VALUES ($1, $2, $3, $4, $5, FALSE)",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(plan.id)
        .bind(start)
        .bind(expiry)
        .execute(&mut *self.db)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self), fields(subscription_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: SubscriptionId) -> Result<Option<SubscriptionDBResponse>> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(&format!("{SUBSCRIPTION_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(subscription)
    }

    #[instrument(skip(self), fields(subscription_id = %abbrev_uuid(&id)), err)]
    pub async fn activate(&mut self, id: SubscriptionId, payment_reference: &str) -> Result<SubscriptionDBResponse> {
        sqlx::query("UPDATE subscriptions SET is_active = TRUE, payment_reference = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(payment_reference)
            .execute(&mut *self.db)
            .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list_active_for_tenant(&mut self, tenant_id: TenantId) -> Result<Vec<SubscriptionDBResponse>> {
        let subscriptions = sqlx::query_as::<_, SubscriptionDBResponse>(&format!(
            "{SUBSCRIPTION_SELECT} WHERE s.tenant_id = $1 AND s.is_active ORDER BY s.start_date DESC"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(subscriptions)
    }

    /// The most recent subscription regardless of state; its plan caps how
    /// many students the school may enroll.
    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn latest_for_tenant(&mut self, tenant_id: TenantId) -> Result<Option<SubscriptionDBResponse>> {
        let subscription = sqlx::query_as::<_, SubscriptionDBResponse>(&format!(
            "{SUBSCRIPTION_SELECT} WHERE s.tenant_id = $1 ORDER BY s.start_date DESC LIMIT 1"
        ))
        .bind(tenant_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(subscription)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn create_payment(
        &mut self,
        tenant_id: TenantId,
        subscription_id: SubscriptionId,
        amount: Decimal,
        currency: &str,
        razorpay_order_id: &str,
    ) -> Result<SubscriptionPaymentDBResponse> {
        let payment = sqlx::query_as::<_, SubscriptionPaymentDBResponse>(&format!(
            r#"
            INSERT INTO subscription_payments (id, tenant_id, subscription_id, amount, currency, razorpay_order_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending')
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(subscription_id)
        .bind(amount)
        .bind(currency)
        .bind(razorpay_order_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    pub async fn get_payment(&mut self, id: PaymentId) -> Result<Option<SubscriptionPaymentDBResponse>> {
        let payment =
            sqlx::query_as::<_, SubscriptionPaymentDBResponse>(&format!("SELECT {PAYMENT_COLUMNS} FROM subscription_payments WHERE id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(payment)
    }

    #[instrument(skip(self, signature), fields(payment_id = %abbrev_uuid(&id), status = ?status), err)]
    pub async fn settle_payment(
        &mut self,
        id: PaymentId,
        status: PaymentStatus,
        razorpay_payment_id: Option<&str>,
        signature: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE subscription_payments SET status = $2, razorpay_payment_id = COALESCE($3, razorpay_payment_id), \
             razorpay_signature = COALESCE($4, razorpay_signature), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(razorpay_payment_id)
        .bind(signature)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    /// Platform-wide payment history for the superadmin billing view.
    #[instrument(skip(self), err)]
    pub async fn billing_overview(&mut self) -> Result<Vec<BillingOverviewDBResponse>> {
        let rows = sqlx::query_as::<_, BillingOverviewDBResponse>(
            r#"
            SELECT sp.id, sp.tenant_id, t.institute_name, sp.amount, sp.currency, sp.status,
                   sp.razorpay_payment_id, sp.created_at
            FROM subscription_payments sp
            JOIN tenants t ON t.id = sp.tenant_id
            ORDER BY sp.created_at DESC
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}
