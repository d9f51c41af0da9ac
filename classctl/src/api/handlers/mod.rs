//! Axum handlers, grouped by URL namespace.

pub mod accounts;
pub mod academics;
pub mod assignments;
pub mod classroom;
pub mod exams;
pub mod fees;
pub mod students;
pub mod subjects;
pub mod subscriptions;
pub mod superadmin;
pub mod teachers;
pub mod timetables;
pub mod uploads;

use crate::api::models::users::CurrentUser;
use crate::errors::{Error, Result};
use crate::types::TenantId;

/// Every tenant-scoped handler starts here; a session without a tenant can
/// only belong to a superadmin, which these routes do not serve.
pub(crate) fn require_tenant(user: &CurrentUser) -> Result<TenantId> {
    user.tenant_id.ok_or_else(|| Error::Forbidden {
        message: "User is not assigned to a school".to_string(),
    })
}
