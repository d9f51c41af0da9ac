//! API request/response models for plans, subscriptions and gateway orders.

use crate::db::models::subscriptions::{
    BillingOverviewDBResponse, PaymentStatus, PlanDBResponse, SubscriptionDBResponse,
};
use crate::types::{PaymentId, PlanId, SubscriptionId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlanCreate {
    pub plan_name: String,
    pub description: Option<String>,
    pub duration_months: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub currency: Option<String>,
    pub max_students: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlanUpdate {
    pub plan_name: Option<String>,
    pub description: Option<String>,
    pub duration_months: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub max_students: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlanResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PlanId,
    pub plan_name: String,
    pub description: Option<String>,
    pub duration_months: i32,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub currency: String,
    pub max_students: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PlanDBResponse> for PlanResponse {
    fn from(db: PlanDBResponse) -> Self {
        Self {
            id: db.id,
            plan_name: db.plan_name,
            description: db.description,
            duration_months: db.duration_months,
            price: db.price,
            currency: db.currency,
            max_students: db.max_students,
            is_active: db.is_active,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SubscriptionId,
    pub plan_name: String,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub payment_reference: Option<String>,
}

impl From<SubscriptionDBResponse> for SubscriptionResponse {
    fn from(db: SubscriptionDBResponse) -> Self {
        Self {
            id: db.id,
            plan_name: db.plan_name,
            start_date: db.start_date,
            expiry_date: db.expiry_date,
            is_active: db.is_active,
            payment_reference: db.payment_reference,
        }
    }
}

/// Gateway order as the browser checkout widget expects it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderBody {
    pub id: String,
    /// Minor units (paise)
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order: OrderBody,
    #[schema(value_type = String, format = "uuid")]
    pub subscription_id: SubscriptionId,
    #[schema(value_type = String, format = "uuid")]
    pub payment_id: PaymentId,
    pub razorpay_key: String,
}

/// What the checkout hands back after a captured payment.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    #[schema(value_type = String, format = "uuid")]
    pub payment_id: PaymentId,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub has_active_subscription: bool,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Platform-wide payment history row for the superadmin billing page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillingOverviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    pub institute_name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub razorpay_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BillingOverviewDBResponse> for BillingOverviewResponse {
    fn from(db: BillingOverviewDBResponse) -> Self {
        Self {
            id: db.id,
            tenant_id: db.tenant_id,
            institute_name: db.institute_name,
            amount: db.amount,
            currency: db.currency,
            status: db.status,
            razorpay_payment_id: db.razorpay_payment_id,
            created_at: db.created_at,
        }
    }
}
