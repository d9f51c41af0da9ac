//! Fee management handlers (`finance/` namespace).
//!
//! Admin side: fee types and structures, bill generation, manual payments
//! with generated receipt numbers. Student side: own bills plus the gateway
//! order/verify cycle for paying one bill online.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};

use crate::{
    api::handlers::require_tenant,
    api::models::{
        auth::MessageResponse,
        fees::{
            generate_receipt_number, BillQuery, BillResponse, FeeOrderResponse, FeePaymentResponse, FeeStructureCreate,
            FeeStructureResponse, FeeTypeCreate, FeeTypeResponse, GenerateBillsResponse, RecordPaymentRequest, VerifyFeePaymentRequest,
        },
        subscriptions::OrderBody,
    },
    auth::current_user::{AdminUser, StudentUser, Subscribed},
    db::handlers::{Fees, Students},
    db::models::fees::{BillStatus, FeePaymentCreateDBRequest, FeeStructureCreateDBRequest, PaymentMethod},
    errors::{Error, Result},
    types::BillId,
    AppState,
};
use uuid::Uuid;

// -- fee types -------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/finance/admin/fee-types/",
    request_body = FeeTypeCreate,
    tag = "finance",
    responses(
        (status = 201, description = "Fee type created", body = FeeTypeResponse),
        (status = 409, description = "Name already in use"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_fee_type(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<FeeTypeCreate>,
) -> Result<(StatusCode, Json<FeeTypeResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let fee_type = fees
        .create_fee_type(tenant_id, &request.name, request.description.as_deref().unwrap_or(""))
        .await?;

    Ok((StatusCode::CREATED, Json(FeeTypeResponse::from(fee_type))))
}

#[utoipa::path(
    get,
    path = "/finance/admin/fee-types/",
    tag = "finance",
    responses((status = 200, description = "Active fee types", body = Vec<FeeTypeResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_fee_types(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<FeeTypeResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let list = fees.list_fee_types(tenant_id).await?;

    Ok(Json(list.into_iter().map(FeeTypeResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/finance/admin/fee-types/{fee_type_id}/",
    request_body = FeeTypeCreate,
    tag = "finance",
    responses(
        (status = 200, description = "Fee type updated", body = FeeTypeResponse),
        (status = 404, description = "Fee type not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_fee_type(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(fee_type_id): Path<Uuid>,
    Json(request): Json<FeeTypeCreate>,
) -> Result<Json<FeeTypeResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let fee_type = fees
        .update_fee_type(fee_type_id, tenant_id, &request.name, request.description.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(FeeTypeResponse::from(fee_type)))
}

#[utoipa::path(
    delete,
    path = "/finance/admin/fee-types/{fee_type_id}/",
    tag = "finance",
    responses(
        (status = 200, description = "Fee type deactivated", body = MessageResponse),
        (status = 404, description = "Fee type not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_fee_type(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(fee_type_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let deactivated = fees.deactivate_fee_type(fee_type_id, tenant_id).await?;

    if !deactivated {
        return Err(Error::NotFound {
            resource: "Fee type".to_string(),
            id: fee_type_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "Fee type deactivated".to_string(),
    }))
}

// -- fee structures --------------------------------------------------------

#[utoipa::path(
    post,
    path = "/finance/admin/fee-structures/",
    request_body = FeeStructureCreate,
    tag = "finance",
    responses((status = 201, description = "Fee structure created", body = FeeStructureResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn create_fee_structure(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<FeeStructureCreate>,
) -> Result<(StatusCode, Json<FeeStructureResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut tx);
    let structure = fees
        .create_structure(&FeeStructureCreateDBRequest {
            tenant_id,
            fee_type_id: request.fee_type_id,
            amount: request.amount,
            class_ids: request.class_ids.clone(),
            due_date: request.due_date,
            billing_period: request.billing_period.unwrap_or_default(),
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((
        StatusCode::CREATED,
        Json(FeeStructureResponse::from_db(structure, request.class_ids)),
    ))
}

#[utoipa::path(
    get,
    path = "/finance/admin/fee-structures/",
    tag = "finance",
    responses((status = 200, description = "Active fee structures", body = Vec<FeeStructureResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_fee_structures(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<FeeStructureResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let structures = fees.list_structures(tenant_id).await?;

    let mut responses = Vec::with_capacity(structures.len());
    for structure in structures {
        let class_ids = fees.structure_class_ids(structure.id).await?;
        responses.push(FeeStructureResponse::from_db(structure, class_ids));
    }

    Ok(Json(responses))
}

#[utoipa::path(
    delete,
    path = "/finance/admin/fee-structures/{structure_id}/",
    tag = "finance",
    responses(
        (status = 200, description = "Fee structure deactivated", body = MessageResponse),
        (status = 404, description = "Fee structure not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_fee_structure(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(structure_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let deactivated = fees.deactivate_structure(structure_id, tenant_id).await?;

    if !deactivated {
        return Err(Error::NotFound {
            resource: "Fee structure".to_string(),
            id: structure_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "Fee structure deactivated".to_string(),
    }))
}

/// Create bills for every eligible student that does not have one yet.
#[utoipa::path(
    post,
    path = "/finance/admin/fee-structures/{structure_id}/generate-bills/",
    tag = "finance",
    responses(
        (status = 200, description = "Bills created", body = GenerateBillsResponse),
        (status = 404, description = "Fee structure not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn generate_bills(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(structure_id): Path<Uuid>,
) -> Result<Json<GenerateBillsResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);

    fees.get_structure(structure_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Fee structure".to_string(),
        id: structure_id.to_string(),
    })?;

    let bills_created = fees.generate_bills(structure_id, tenant_id).await?;

    Ok(Json(GenerateBillsResponse { bills_created }))
}

// -- bills -----------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/finance/admin/bills/",
    tag = "finance",
    params(BillQuery),
    responses((status = 200, description = "Bills, filterable by status and class", body = Vec<BillResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_bills(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Query(query): Query<BillQuery>,
) -> Result<Json<Vec<BillResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let bills = fees.list_bills(tenant_id, query.status, query.class_id).await?;

    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/finance/admin/bills/{bill_id}/",
    tag = "finance",
    responses(
        (status = 200, description = "Bill detail", body = BillResponse),
        (status = 404, description = "Bill not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_bill(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(bill_id): Path<BillId>,
) -> Result<Json<BillResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let bill = fees.get_bill(bill_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Bill".to_string(),
        id: bill_id.to_string(),
    })?;

    Ok(Json(BillResponse::from(bill)))
}

// -- payments --------------------------------------------------------------

/// Record a manual (cash desk) payment. The amount must equal the bill.
#[utoipa::path(
    post,
    path = "/finance/admin/payments/",
    request_body = RecordPaymentRequest,
    tag = "finance",
    responses(
        (status = 201, description = "Payment recorded", body = FeePaymentResponse),
        (status = 400, description = "Amount does not match the bill"),
        (status = 409, description = "Bill already paid"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn record_payment(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<FeePaymentResponse>)> {
    let tenant_id = require_tenant(&admin)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut tx);

    let bill = fees.get_bill(request.bill_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Bill".to_string(),
        id: request.bill_id.to_string(),
    })?;

    if request.amount != bill.amount {
        return Err(Error::BadRequest {
            message: format!("Payment amount {} must match bill amount {}", request.amount, bill.amount),
        });
    }

    let payment = fees
        .create_payment(&FeePaymentCreateDBRequest {
            tenant_id,
            bill_id: bill.id,
            amount: request.amount,
            payment_method: request.payment_method,
            transaction_id: request.transaction_id.unwrap_or_default(),
            receipt_number: generate_receipt_number(Utc::now().year()),
            collected_by: Some(admin.id),
            notes: request.notes.unwrap_or_default(),
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(FeePaymentResponse::from(payment))))
}

#[utoipa::path(
    get,
    path = "/finance/admin/payments/",
    tag = "finance",
    responses((status = 200, description = "Payments, newest first", body = Vec<FeePaymentResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_payments(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
) -> Result<Json<Vec<FeePaymentResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let payments = fees.list_payments(tenant_id).await?;

    Ok(Json(payments.into_iter().map(FeePaymentResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/finance/admin/payments/{payment_id}/",
    tag = "finance",
    responses(
        (status = 200, description = "Payment detail", body = FeePaymentResponse),
        (status = 404, description = "Payment not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_payment(
    State(state): State<AppState>,
    Subscribed(AdminUser(admin)): Subscribed<AdminUser>,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<FeePaymentResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut fees = Fees::new(&mut conn);
    let payment = fees.get_payment(payment_id, tenant_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Payment".to_string(),
        id: payment_id.to_string(),
    })?;

    Ok(Json(FeePaymentResponse::from(payment)))
}

// -- student side ----------------------------------------------------------

#[utoipa::path(
    get,
    path = "/finance/student/bills/",
    tag = "finance",
    responses((status = 200, description = "Own bills", body = Vec<BillResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn student_bills(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
) -> Result<Json<Vec<BillResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut fees = Fees::new(&mut conn);
    let bills = fees.list_bills_for_student(student.id).await?;

    Ok(Json(bills.into_iter().map(BillResponse::from).collect()))
}

/// Register a gateway order for paying one of the student's own bills.
#[utoipa::path(
    post,
    path = "/finance/student/bills/{bill_id}/create-order/",
    tag = "finance",
    responses(
        (status = 200, description = "Order registered", body = FeeOrderResponse),
        (status = 400, description = "Bill already paid"),
        (status = 404, description = "Bill not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_bill_order(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
    Path(bill_id): Path<BillId>,
) -> Result<Json<FeeOrderResponse>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut conn);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut fees = Fees::new(&mut conn);
    let bill = fees
        .get_bill(bill_id, tenant_id)
        .await?
        .filter(|b| b.student_id == student.id)
        .ok_or_else(|| Error::NotFound {
            resource: "Bill".to_string(),
            id: bill_id.to_string(),
        })?;

    if bill.status == BillStatus::Paid {
        return Err(Error::BadRequest {
            message: "This bill is already paid".to_string(),
        });
    }

    let receipt = format!("bill_{}_{}", crate::types::abbrev_uuid(&bill.id), Utc::now().timestamp());
    let order = state.payments.create_order(bill.amount, "INR", &receipt).await?;

    fees.set_bill_order(bill.id, &order.order_id).await?;

    Ok(Json(FeeOrderResponse {
        order: OrderBody {
            id: order.order_id,
            amount: order.amount_minor,
            currency: order.currency,
        },
        bill_id: bill.id,
        razorpay_key: state.payments.key_id().to_string(),
    }))
}

/// Verify the checkout signature for a bill payment and settle the bill.
#[utoipa::path(
    post,
    path = "/finance/student/bills/verify-payment/",
    request_body = VerifyFeePaymentRequest,
    tag = "finance",
    responses(
        (status = 200, description = "Bill settled", body = FeePaymentResponse),
        (status = 400, description = "Signature verification failed"),
        (status = 404, description = "Bill not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn verify_bill_payment(
    State(state): State<AppState>,
    Subscribed(StudentUser(user)): Subscribed<StudentUser>,
    Json(request): Json<VerifyFeePaymentRequest>,
) -> Result<Json<FeePaymentResponse>> {
    let tenant_id = require_tenant(&user)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut students = Students::new(&mut tx);
    let student = students.get_by_user(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "Student profile".to_string(),
        id: user.id.to_string(),
    })?;

    let mut fees = Fees::new(&mut tx);
    let bill = fees
        .get_bill(request.bill_id, tenant_id)
        .await?
        .filter(|b| b.student_id == student.id)
        .ok_or_else(|| Error::NotFound {
            resource: "Bill".to_string(),
            id: request.bill_id.to_string(),
        })?;

    // The order id the gateway signed must be the one we registered
    if bill.razorpay_order_id.as_deref() != Some(request.razorpay_order_id.as_str()) {
        return Err(Error::BadRequest {
            message: "Order does not belong to this bill".to_string(),
        });
    }

    state
        .payments
        .verify_payment_signature(&request.razorpay_order_id, &request.razorpay_payment_id, &request.razorpay_signature)
        .map_err(crate::errors::Error::from)?;

    let payment = fees
        .create_payment(&FeePaymentCreateDBRequest {
            tenant_id,
            bill_id: bill.id,
            amount: bill.amount,
            payment_method: PaymentMethod::Razorpay,
            transaction_id: request.razorpay_payment_id.clone(),
            receipt_number: generate_receipt_number(Utc::now().year()),
            collected_by: None,
            notes: String::new(),
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(FeePaymentResponse::from(payment)))
}
