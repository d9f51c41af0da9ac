//! Platform-operator handlers (`superadmin/` namespace).

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::models::{
        auth::MessageResponse,
        subscriptions::BillingOverviewResponse,
        tenants::{SetTenantStatusRequest, TenantOverviewResponse, TenantResponse},
    },
    auth::current_user::SuperAdminUser,
    db::handlers::{Subscriptions, Tenants},
    errors::{Error, Result},
    types::TenantId,
    AppState,
};

/// All schools with their current subscription state and student counts.
#[utoipa::path(
    get,
    path = "/superadmin/tenants/",
    tag = "superadmin",
    responses(
        (status = 200, description = "Registered schools", body = Vec<TenantOverviewResponse>),
        (status = 403, description = "Not a superadmin"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tenants(State(state): State<AppState>, _superadmin: SuperAdminUser) -> Result<Json<Vec<TenantOverviewResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut tenants = Tenants::new(&mut conn);
    let list = tenants.list_overview().await?;

    Ok(Json(list.into_iter().map(TenantOverviewResponse::from).collect()))
}

/// Suspend, reactivate or otherwise re-state a school.
#[utoipa::path(
    post,
    path = "/superadmin/tenants/{tenant_id}/status/",
    request_body = SetTenantStatusRequest,
    tag = "superadmin",
    responses(
        (status = 200, description = "Status updated", body = TenantResponse),
        (status = 404, description = "School not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn set_tenant_status(
    State(state): State<AppState>,
    _superadmin: SuperAdminUser,
    Path(tenant_id): Path<TenantId>,
    Json(request): Json<SetTenantStatusRequest>,
) -> Result<Json<TenantResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut tenants = Tenants::new(&mut conn);
    let tenant = tenants.set_status(tenant_id, request.status).await?;

    Ok(Json(TenantResponse::from(tenant)))
}

/// Delete a school and everything it owns (rows cascade).
#[utoipa::path(
    delete,
    path = "/superadmin/tenants/{tenant_id}/delete/",
    tag = "superadmin",
    responses(
        (status = 200, description = "School deleted", body = MessageResponse),
        (status = 404, description = "School not found"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_tenant(
    State(state): State<AppState>,
    _superadmin: SuperAdminUser,
    Path(tenant_id): Path<TenantId>,
) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut tenants = Tenants::new(&mut conn);
    let deleted = tenants.delete(tenant_id).await?;

    if !deleted {
        return Err(Error::NotFound {
            resource: "School".to_string(),
            id: tenant_id.to_string(),
        });
    }

    Ok(Json(MessageResponse {
        message: "School deleted successfully".to_string(),
    }))
}

/// Platform-wide subscription payment history.
#[utoipa::path(
    get,
    path = "/superadmin/tenants/billing/",
    tag = "superadmin",
    responses((status = 200, description = "Payment history", body = Vec<BillingOverviewResponse>))
)]
#[tracing::instrument(skip_all)]
pub async fn billing_overview(State(state): State<AppState>, _superadmin: SuperAdminUser) -> Result<Json<Vec<BillingOverviewResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut subscriptions = Subscriptions::new(&mut conn);
    let rows = subscriptions.billing_overview().await?;

    Ok(Json(rows.into_iter().map(BillingOverviewResponse::from).collect()))
}
