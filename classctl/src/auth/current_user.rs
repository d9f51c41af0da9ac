//! Request extractors for the authenticated user, role guards and the
//! subscription gate.
//!
//! The extractors compose into a single chain that is the one source of
//! truth for access control:
//!
//! 1. [`CurrentUser`] reads and verifies the session cookie. No cookie, a
//!    malformed token or an expired one all collapse to 401 - clients treat
//!    that as "no user" and send the browser back to the login landing page.
//! 2. The role guards ([`AdminUser`], [`TeacherUser`], [`StudentUser`],
//!    [`SuperAdminUser`]) reject a valid session with the wrong role (403).
//! 3. [`Subscribed`] wraps a role guard and additionally requires the user's
//!    tenant to hold an active, unexpired subscription, read from the
//!    database on every request. When the check fails the route answers 402
//!    with a role-parameterized blocked payload instead of its normal body.
//!
//! Handlers pick the strictest extractor they need; nothing else in the
//! codebase re-checks identity.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use tracing::{instrument, trace};

use crate::{
    api::models::users::CurrentUser,
    auth::session,
    db::handlers::Subscriptions,
    errors::{Error, Result},
    types::Role,
    AppState,
};

/// Extract user from the JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid session found and verified
/// - Some(Err(error)): Cookie header present but unreadable
fn try_session_cookie_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => {
                        // Invalid/expired token: keep scanning, a later cookie
                        // under the same name may still be valid
                        continue;
                    }
                }
            }
        }
    }
    None
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match try_session_cookie_auth(parts, &state.config) {
            Some(Ok(user)) => {
                trace!("Found session authenticated user: {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => {
                trace!("Session authentication failed: {:?}", e);
                Err(Error::Unauthenticated { message: None })
            }
            None => {
                trace!("No session credentials found in request");
                Err(Error::Unauthenticated { message: None })
            }
        }
    }
}

/// Access to the wrapped [`CurrentUser`] of a role guard.
pub trait AsCurrentUser {
    fn current_user(&self) -> &CurrentUser;
}

impl AsCurrentUser for CurrentUser {
    fn current_user(&self) -> &CurrentUser {
        self
    }
}

macro_rules! role_guard {
    ($name:ident, $role:expr, $label:literal) => {
        #[doc = concat!("Extractor that requires a session with the `", $label, "` role.")]
        #[derive(Debug, Clone)]
        pub struct $name(pub CurrentUser);

        impl FromRequestParts<AppState> for $name {
            type Rejection = Error;

            async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
                let user = CurrentUser::from_request_parts(parts, state).await?;
                if user.role != $role {
                    return Err(Error::Forbidden {
                        message: concat!("Not a ", $label).to_string(),
                    });
                }
                Ok(Self(user))
            }
        }

        impl AsCurrentUser for $name {
            fn current_user(&self) -> &CurrentUser {
                &self.0
            }
        }
    };
}

role_guard!(SuperAdminUser, Role::SuperAdmin, "superadmin");
role_guard!(AdminUser, Role::Admin, "admin");
role_guard!(TeacherUser, Role::Teacher, "teacher");
role_guard!(StudentUser, Role::Student, "student");

/// The subscription gate.
///
/// Wraps any role guard (or plain [`CurrentUser`]) and verifies that the
/// user's tenant holds an active subscription before the handler runs.
/// Superadmins carry no tenant and bypass the gate.
#[derive(Debug, Clone)]
pub struct Subscribed<T>(pub T);

impl<T> FromRequestParts<AppState> for Subscribed<T>
where
    T: FromRequestParts<AppState, Rejection = Error> + AsCurrentUser + Send,
{
    type Rejection = Error;

    #[instrument(skip_all)]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let inner = T::from_request_parts(parts, state).await?;
        let user = inner.current_user();

        if user.role == Role::SuperAdmin {
            return Ok(Self(inner));
        }

        let tenant_id = user.tenant_id.ok_or_else(|| Error::Forbidden {
            message: "User is not assigned to a school".to_string(),
        })?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut subscriptions = Subscriptions::new(&mut conn);
        let active = subscriptions.tenant_has_active(tenant_id, Utc::now()).await?;

        if !active {
            trace!("Tenant {} has no active subscription", tenant_id);
            return Err(Error::SubscriptionRequired { role: user.role });
        }

        Ok(Self(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_config, create_test_state};
    use axum::extract::FromRequestParts as _;
    use uuid::Uuid;

    fn session_user(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "user1".to_string(),
            email: "user1@school.example".to_string(),
            role,
            tenant_id: (role != Role::SuperAdmin).then(Uuid::new_v4),
            must_change_password: false,
            full_name: None,
        }
    }

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_missing_cookie_is_unauthenticated() {
        let state = create_test_state();
        let mut parts = parts_with_cookie(None);

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        let err = result.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_garbage_cookie_is_unauthenticated_not_500() {
        // A corrupted session must read as "no user", never as a server fault
        let state = create_test_state();
        let cookie = format!("{}=not-a-jwt-at-all", state.config.auth.session.cookie_name);
        let mut parts = parts_with_cookie(Some(&cookie));

        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[tokio::test]
    async fn test_valid_session_is_extracted() {
        let state = create_test_state();
        let user = session_user(Role::Admin);
        let token = session::create_session_token(&user, &state.config).unwrap();
        let cookie = format!("{}={}", state.config.auth.session.cookie_name, token);
        let mut parts = parts_with_cookie(Some(&cookie));

        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, user.id);
        assert_eq!(extracted.role, Role::Admin);
        assert_eq!(extracted.tenant_id, user.tenant_id);
    }

    #[tokio::test]
    async fn test_role_guard_rejects_wrong_role() {
        let state = create_test_state();
        let user = session_user(Role::Student);
        let token = session::create_session_token(&user, &state.config).unwrap();
        let cookie = format!("{}={}", state.config.auth.session.cookie_name, token);
        let mut parts = parts_with_cookie(Some(&cookie));

        let err = AdminUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 403);
    }

    #[tokio::test]
    async fn test_role_guard_accepts_matching_role() {
        let state = create_test_state();
        let user = session_user(Role::Teacher);
        let token = session::create_session_token(&user, &state.config).unwrap();
        let cookie = format!("{}={}", state.config.auth.session.cookie_name, token);
        let mut parts = parts_with_cookie(Some(&cookie));

        let TeacherUser(extracted) = TeacherUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, user.id);
    }

    #[tokio::test]
    async fn test_subscription_gate_bypassed_for_superadmin() {
        // Superadmins have no tenant; the gate never touches the database for them
        let state = create_test_state();
        let user = session_user(Role::SuperAdmin);
        let token = session::create_session_token(&user, &state.config).unwrap();
        let cookie = format!("{}={}", state.config.auth.session.cookie_name, token);
        let mut parts = parts_with_cookie(Some(&cookie));

        let result = Subscribed::<SuperAdminUser>::from_request_parts(&mut parts, &state).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_gate_requires_session_first() {
        let state = create_test_state();
        let mut parts = parts_with_cookie(None);

        let err = Subscribed::<AdminUser>::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        // No user at all: 401, not the blocked view
        assert_eq!(err.status_code().as_u16(), 401);
    }

    #[test]
    fn test_blocked_view_is_role_parameterized() {
        // The 402 payload differs between admins (can purchase) and everyone else
        let admin_err = Error::SubscriptionRequired { role: Role::Admin };
        let student_err = Error::SubscriptionRequired { role: Role::Student };
        assert_eq!(admin_err.status_code().as_u16(), 402);
        assert_eq!(student_err.status_code().as_u16(), 402);
    }

    #[test]
    fn test_config_available() {
        let config = create_test_config();
        assert!(config.secret_key.is_some());
    }
}
