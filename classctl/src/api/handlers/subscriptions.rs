//! Subscription and billing handlers (`subscriptions/` namespace).
//!
//! The order flow mirrors the gateway's checkout protocol: `create-order`
//! registers a gateway order plus a pending subscription/payment pair, the
//! browser completes the checkout, and `verify-payment` checks the returned
//! signature before activating anything. A failed verification marks the
//! payment failed and activates nothing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{
    api::handlers::require_tenant,
    api::models::{
        auth::{MessageResponse, SubscriptionStatusResponse},
        subscriptions::{
            CreateOrderResponse, OrderBody, PlanCreate, PlanResponse, PlanUpdate, SubscriptionResponse, VerifyPaymentRequest,
            VerifyPaymentResponse,
        },
    },
    auth::current_user::{AdminUser, SuperAdminUser},
    db::handlers::{Plans, Subscriptions, Tenants},
    db::models::subscriptions::{PaymentStatus, PlanCreateDBRequest, PlanUpdateDBRequest},
    db::models::tenants::TenantStatus,
    errors::{Error, Result},
    types::{abbrev_uuid, PlanId},
    AppState,
};

// -- plans (platform operator) ---------------------------------------------

#[utoipa::path(
    post,
    path = "/subscriptions/plans/",
    request_body = PlanCreate,
    tag = "subscriptions",
    responses(
        (status = 201, description = "Plan created", body = PlanResponse),
        (status = 403, description = "Not a superadmin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_plan(
    State(state): State<AppState>,
    _superadmin: SuperAdminUser,
    Json(request): Json<PlanCreate>,
) -> Result<(StatusCode, Json<PlanResponse>)> {
    if request.duration_months <= 0 {
        return Err(Error::BadRequest {
            message: "Plan duration must be at least one month".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = Plans::new(&mut conn);
    let plan = plans
        .create(&PlanCreateDBRequest {
            plan_name: request.plan_name,
            description: request.description,
            duration_months: request.duration_months,
            price: request.price,
            currency: request.currency.unwrap_or_else(|| "INR".to_string()),
            max_students: request.max_students,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

#[utoipa::path(
    get,
    path = "/subscriptions/plans/",
    tag = "subscriptions",
    responses((status = 200, description = "All plans", body = Vec<PlanResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn list_plans(State(state): State<AppState>, _superadmin: SuperAdminUser) -> Result<Json<Vec<PlanResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = Plans::new(&mut conn);
    let list = plans.list(false).await?;

    Ok(Json(list.into_iter().map(PlanResponse::from).collect()))
}

#[utoipa::path(
    put,
    path = "/subscriptions/plans/{plan_id}/",
    request_body = PlanUpdate,
    tag = "subscriptions",
    responses(
        (status = 200, description = "Plan updated", body = PlanResponse),
        (status = 404, description = "Plan not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_plan(
    State(state): State<AppState>,
    _superadmin: SuperAdminUser,
    Path(plan_id): Path<PlanId>,
    Json(request): Json<PlanUpdate>,
) -> Result<Json<PlanResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = Plans::new(&mut conn);
    let plan = plans
        .update(
            plan_id,
            &PlanUpdateDBRequest {
                plan_name: request.plan_name,
                description: request.description,
                duration_months: request.duration_months,
                price: request.price,
                currency: request.currency,
                max_students: request.max_students,
            },
        )
        .await?;

    Ok(Json(PlanResponse::from(plan)))
}

/// Delete = deactivate; existing subscribers remain active until expiry.
#[utoipa::path(
    delete,
    path = "/subscriptions/plans/{plan_id}/",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Plan deactivated", body = MessageResponse),
        (status = 404, description = "Plan not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_plan(
    State(state): State<AppState>,
    _superadmin: SuperAdminUser,
    Path(plan_id): Path<PlanId>,
) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = Plans::new(&mut conn);
    let deactivated = plans.deactivate(plan_id).await?;

    if !deactivated {
        return Err(Error::NotFound {
            resource: "Plan".to_string(),
            id: plan_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "Plan deactivated successfully. Existing subscribers remain active until expiry.".to_string(),
    }))
}

// -- school-facing views ---------------------------------------------------

/// Active plans any authenticated school user can browse.
#[utoipa::path(
    get,
    path = "/subscriptions/active-plans",
    tag = "subscriptions",
    responses((status = 200, description = "Purchasable plans", body = Vec<PlanResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn active_plans(
    State(state): State<AppState>,
    _user: crate::api::models::users::CurrentUser,
) -> Result<Json<Vec<PlanResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut plans = Plans::new(&mut conn);
    let list = plans.list(true).await?;

    Ok(Json(list.into_iter().map(PlanResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/subscriptions/tenant-subscriptions/",
    tag = "subscriptions",
    responses((status = 200, description = "Active subscriptions of the school", body = Vec<SubscriptionResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn tenant_subscriptions(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<SubscriptionResponse>>> {
    let tenant_id = require_tenant(&admin)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subscriptions = Subscriptions::new(&mut conn);
    let list = subscriptions.list_active_for_tenant(tenant_id).await?;

    Ok(Json(list.into_iter().map(SubscriptionResponse::from).collect()))
}

/// Live subscription state for the caller's school.
#[utoipa::path(
    get,
    path = "/subscriptions/status/",
    tag = "subscriptions",
    responses((status = 200, description = "Subscription status", body = SubscriptionStatusResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn subscription_status(
    State(state): State<AppState>,
    user: crate::api::models::users::CurrentUser,
) -> Result<Json<SubscriptionStatusResponse>> {
    let tenant_id = require_tenant(&user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subscriptions = Subscriptions::new(&mut conn);

    let has_active = subscriptions.tenant_has_active(tenant_id, Utc::now()).await?;
    let expiry = subscriptions
        .list_active_for_tenant(tenant_id)
        .await?
        .first()
        .map(|s| s.expiry_date);

    Ok(Json(SubscriptionStatusResponse {
        has_active_subscription: has_active,
        expiry_date: expiry,
    }))
}

// -- order / verify flow ---------------------------------------------------

/// Register a gateway order for a plan and create the pending
/// subscription + payment pair it will settle.
#[utoipa::path(
    post,
    path = "/subscriptions/create-order/{plan_id}/",
    tag = "subscriptions",
    responses(
        (status = 200, description = "Order registered", body = CreateOrderResponse),
        (status = 404, description = "Plan not found or inactive"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(plan_id): Path<PlanId>,
) -> Result<Json<CreateOrderResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut plans = Plans::new(&mut tx);
    let plan = plans
        .get_by_id(plan_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| Error::NotFound {
            resource: "Plan".to_string(),
            id: plan_id.to_string(),
        })?;

    let receipt = format!(
        "ord_ten{}_p{}_{}",
        &abbrev_uuid(&tenant_id)[..6],
        abbrev_uuid(&plan.id),
        Utc::now().timestamp()
    );

    let order = state.payments.create_order(plan.price, &plan.currency, &receipt).await?;

    let mut subscriptions = Subscriptions::new(&mut tx);
    let subscription_id = subscriptions.create_pending(tenant_id, &plan).await?;
    let payment = subscriptions
        .create_payment(tenant_id, subscription_id, plan.price, &plan.currency, &order.order_id)
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(CreateOrderResponse {
        order: OrderBody {
            id: order.order_id,
            amount: order.amount_minor,
            currency: order.currency,
        },
        subscription_id,
        payment_id: payment.id,
        razorpay_key: state.payments.key_id().to_string(),
    }))
}

/// Verify the checkout signature and activate the subscription.
///
/// A bad signature marks the payment failed and returns 400; nothing else
/// changes (the school can retry with a fresh order).
#[utoipa::path(
    post,
    path = "/subscriptions/verify-payment/",
    request_body = VerifyPaymentRequest,
    tag = "subscriptions",
    responses(
        (status = 200, description = "Payment verified, subscription active", body = VerifyPaymentResponse),
        (status = 400, description = "Signature verification failed"),
        (status = 404, description = "Unknown payment"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn verify_payment(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<Json<VerifyPaymentResponse>> {
    let tenant_id = require_tenant(&admin)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut subscriptions = Subscriptions::new(&mut tx);
    let payment = subscriptions
        .get_payment(request.payment_id)
        .await?
        .filter(|p| p.tenant_id == tenant_id)
        .ok_or_else(|| Error::NotFound {
            resource: "Payment".to_string(),
            id: request.payment_id.to_string(),
        })?;

    let verification = state.payments.verify_payment_signature(
        &request.razorpay_order_id,
        &request.razorpay_payment_id,
        &request.razorpay_signature,
    );

    if let Err(e) = verification {
        subscriptions
            .settle_payment(payment.id, PaymentStatus::Failed, Some(&request.razorpay_payment_id), None)
            .await?;
        tx.commit().await.map_err(|err| Error::Database(err.into()))?;
        return Err(e.into());
    }

    subscriptions
        .settle_payment(
            payment.id,
            PaymentStatus::Paid,
            Some(&request.razorpay_payment_id),
            Some(&request.razorpay_signature),
        )
        .await?;

    let subscription_id = payment.subscription_id.ok_or_else(|| Error::Internal {
        operation: "payment has no subscription attached".to_string(),
    })?;
    let subscription = subscriptions.activate(subscription_id, &request.razorpay_payment_id).await?;

    let mut tenants = Tenants::new(&mut tx);
    tenants.set_status(tenant_id, TenantStatus::Active).await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: "Payment verified".to_string(),
        has_active_subscription: true,
        expiry_date: Some(subscription.expiry_date),
    }))
}
