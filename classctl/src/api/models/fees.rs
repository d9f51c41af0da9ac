//! API request/response models for fee management.

use crate::db::models::fees::{
    BillDBResponse, BillStatus, FeePaymentDBResponse, FeeStructureDBResponse, FeeTypeDBResponse, PaymentMethod,
};
use crate::types::{BillId, ClassId, StudentId};
use chrono::{DateTime, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Receipt numbers look like `RCP-2026-9X2F7QKM`.
pub fn generate_receipt_number(year: i32) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("RCP-{year}-{suffix}")
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FeeTypeCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeTypeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

impl From<FeeTypeDBResponse> for FeeTypeResponse {
    fn from(db: FeeTypeDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            is_active: db.is_active,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FeeStructureCreate {
    #[schema(value_type = String, format = "uuid")]
    pub fee_type_id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    /// Empty means the structure applies to every student
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub class_ids: Vec<ClassId>,
    pub due_date: NaiveDate,
    pub billing_period: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeStructureResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub fee_type_id: Uuid,
    pub fee_type_name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = Vec<String>)]
    pub class_ids: Vec<ClassId>,
    pub due_date: NaiveDate,
    pub billing_period: String,
    pub is_active: bool,
}

impl FeeStructureResponse {
    pub fn from_db(db: FeeStructureDBResponse, class_ids: Vec<ClassId>) -> Self {
        Self {
            id: db.id,
            fee_type_id: db.fee_type_id,
            fee_type_name: db.fee_type_name,
            amount: db.amount,
            class_ids,
            due_date: db.due_date,
            billing_period: db.billing_period,
            is_active: db.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateBillsResponse {
    pub bills_created: u64,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct BillQuery {
    pub status: Option<BillStatus>,
    #[param(value_type = Option<String>, format = "uuid")]
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BillId,
    #[schema(value_type = String, format = "uuid")]
    pub student_id: StudentId,
    pub student_name: Option<String>,
    pub admission_number: String,
    pub fee_type_name: String,
    pub billing_period: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub status: BillStatus,
}

impl From<BillDBResponse> for BillResponse {
    fn from(db: BillDBResponse) -> Self {
        Self {
            id: db.id,
            student_id: db.student_id,
            student_name: db.student_name,
            admission_number: db.admission_number,
            fee_type_name: db.fee_type_name,
            billing_period: db.billing_period,
            amount: db.amount,
            due_date: db.due_date,
            paid_date: db.paid_date,
            status: db.status,
        }
    }
}

/// Admin-side manual payment record (cash desk).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    #[schema(value_type = String, format = "uuid")]
    pub bill_id: BillId,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeePaymentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(value_type = String, format = "uuid")]
    pub bill_id: BillId,
    pub student_name: Option<String>,
    pub fee_type_name: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub receipt_number: String,
    pub payment_date: DateTime<Utc>,
}

impl From<FeePaymentDBResponse> for FeePaymentResponse {
    fn from(db: FeePaymentDBResponse) -> Self {
        Self {
            id: db.id,
            bill_id: db.bill_id,
            student_name: db.student_name,
            fee_type_name: db.fee_type_name,
            amount: db.amount,
            payment_method: db.payment_method,
            transaction_id: db.transaction_id,
            receipt_number: db.receipt_number,
            payment_date: db.payment_date,
        }
    }
}

/// Gateway order for paying one bill online.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeeOrderResponse {
    pub order: super::subscriptions::OrderBody,
    #[schema(value_type = String, format = "uuid")]
    pub bill_id: BillId,
    pub razorpay_key: String,
}

/// Checkout result for an online bill payment.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyFeePaymentRequest {
    #[schema(value_type = String, format = "uuid")]
    pub bill_id: BillId,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_number_format() {
        let receipt = generate_receipt_number(2026);
        assert!(receipt.starts_with("RCP-2026-"));
        assert_eq!(receipt.len(), "RCP-2026-".len() + 8);

        let suffix = &receipt["RCP-2026-".len()..];
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_receipt_numbers_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generate_receipt_number(2026)));
        }
    }
}
