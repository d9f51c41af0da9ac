//! Database models for fee management.

use crate::types::{BillId, ClassId, StudentId, TenantId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database response for a fee type
#[derive(Debug, Clone, FromRow)]
pub struct FeeTypeDBResponse {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Database request for creating a fee structure
#[derive(Debug, Clone)]
pub struct FeeStructureCreateDBRequest {
    pub tenant_id: TenantId,
    pub fee_type_id: Uuid,
    pub amount: Decimal,
    pub class_ids: Vec<ClassId>,
    pub due_date: NaiveDate,
    pub billing_period: String,
}

/// Database response for a fee structure, with class ids attached
#[derive(Debug, Clone, FromRow)]
pub struct FeeStructureDBResponse {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub fee_type_id: Uuid,
    pub fee_type_name: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub billing_period: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Billing state of one student's bill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Pending,
    Paid,
    Overdue,
}

/// Database response for a student bill, joined with display names
#[derive(Debug, Clone, FromRow)]
pub struct BillDBResponse {
    pub id: BillId,
    pub tenant_id: TenantId,
    pub student_id: StudentId,
    pub student_name: Option<String>,
    pub admission_number: String,
    pub fee_structure_id: Uuid,
    pub fee_type_name: String,
    pub billing_period: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: BillStatus,
    pub razorpay_order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// How a fee was settled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, utoipa::ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    BankTransfer,
    Razorpay,
}

/// Database request for recording a fee payment
#[derive(Debug, Clone)]
pub struct FeePaymentCreateDBRequest {
    pub tenant_id: TenantId,
    pub bill_id: BillId,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub receipt_number: String,
    pub collected_by: Option<UserId>,
    pub notes: String,
}

/// Database response for a fee payment, joined with the billed student
#[derive(Debug, Clone, FromRow)]
pub struct FeePaymentDBResponse {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub bill_id: BillId,
    pub student_name: Option<String>,
    pub fee_type_name: String,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub receipt_number: String,
    pub collected_by: Option<UserId>,
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
