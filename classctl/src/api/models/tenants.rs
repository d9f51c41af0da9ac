//! API request/response models for the superadmin tenant views.

use crate::db::models::tenants::{TenantDBResponse, TenantOverviewDBResponse, TenantStatus};
use crate::types::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TenantId,
    pub institute_name: String,
    pub email: String,
    pub phone: String,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
}

impl From<TenantDBResponse> for TenantResponse {
    fn from(db: TenantDBResponse) -> Self {
        Self {
            id: db.id,
            institute_name: db.institute_name,
            email: db.email,
            phone: db.phone,
            status: db.status,
            created_at: db.created_at,
        }
    }
}

/// Tenant row with subscription summary for the schools listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantOverviewResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TenantId,
    pub institute_name: String,
    pub email: String,
    pub phone: String,
    pub status: TenantStatus,
    pub plan_name: Option<String>,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub student_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<TenantOverviewDBResponse> for TenantOverviewResponse {
    fn from(db: TenantOverviewDBResponse) -> Self {
        Self {
            id: db.id,
            institute_name: db.institute_name,
            email: db.email,
            phone: db.phone,
            status: db.status,
            plan_name: db.plan_name,
            subscription_expiry: db.subscription_expiry,
            student_count: db.student_count,
            created_at: db.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetTenantStatusRequest {
    pub status: TenantStatus,
}
