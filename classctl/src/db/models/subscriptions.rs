//! Database models for subscription plans, subscriptions and gateway payments.

use crate::types::{PaymentId, PlanId, SubscriptionId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for creating a subscription plan
#[derive(Debug, Clone)]
pub struct PlanCreateDBRequest {
    pub plan_name: String,
    pub description: Option<String>,
    pub duration_months: i32,
    pub price: Decimal,
    pub currency: String,
    pub max_students: i32,
}

/// Database request for updating a subscription plan
#[derive(Debug, Clone, Default)]
pub struct PlanUpdateDBRequest {
    pub plan_name: Option<String>,
    pub description: Option<String>,
    pub duration_months: Option<i32>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub max_students: Option<i32>,
}

/// Database response for a subscription plan
#[derive(Debug, Clone, FromRow)]
pub struct PlanDBResponse {
    pub id: PlanId,
    pub plan_name: String,
    pub description: Option<String>,
    pub duration_months: i32,
    pub price: Decimal,
    pub currency: String,
    pub max_students: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a subscription, joined with its plan name
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionDBResponse {
    pub id: SubscriptionId,
    pub tenant_id: TenantId,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Gateway payment lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

/// Database response for a subscription payment
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionPaymentDBResponse {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub subscription_id: Option<SubscriptionId>,
    pub amount: Decimal,
    pub currency: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Platform-wide billing row for the superadmin view
#[derive(Debug, Clone, FromRow)]
pub struct BillingOverviewDBResponse {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub institute_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub razorpay_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
