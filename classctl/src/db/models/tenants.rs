//! Database models for tenants (schools).

use crate::types::TenantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Tenant lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Trial,
    Active,
    Inactive,
    Suspended,
}

/// Database request for creating a new tenant
#[derive(Debug, Clone)]
pub struct TenantCreateDBRequest {
    pub institute_name: String,
    pub email: String,
    pub phone: String,
}

/// Database response for a tenant
#[derive(Debug, Clone, FromRow)]
pub struct TenantDBResponse {
    pub id: TenantId,
    pub institute_name: String,
    pub email: String,
    pub phone: String,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Platform-operator view of a tenant with its current subscription state.
#[derive(Debug, Clone, FromRow)]
pub struct TenantOverviewDBResponse {
    pub id: TenantId,
    pub institute_name: String,
    pub email: String,
    pub phone: String,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
    pub plan_name: Option<String>,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub student_count: i64,
}
