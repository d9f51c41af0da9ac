//! API request/response models for authentication flows.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::UserResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login payload: the user object clients cache for the session, with the
/// subscription flag computed live at login time.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub tenant_name: Option<String>,
    pub has_active_subscription: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginBody {
    pub user: AuthUserResponse,
}

/// Login response: JSON body plus the session cookie.
pub struct LoginResponse {
    pub body: LoginBody,
    pub cookie: String,
}

impl IntoResponse for LoginResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, [(header::SET_COOKIE, self.cookie)], Json(self.body)).into_response()
    }
}

/// Logout response: confirmation body plus the cookie-clearing header.
pub struct LogoutResponse {
    pub cookie: String,
}

impl IntoResponse for LogoutResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(header::SET_COOKIE, self.cookie)],
            Json(MessageResponse {
                message: "Logged out".to_string(),
            }),
        )
            .into_response()
    }
}

/// Generic `{message}` confirmation body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

/// School self-registration: creates the tenant and its admin account.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AdminSignupRequest {
    pub institute_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Uploaded profile image location.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileImageResponse {
    pub profile_image: String,
}

/// Live subscription state for the current tenant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionStatusResponse {
    pub has_active_subscription: bool,
    pub expiry_date: Option<DateTime<Utc>>,
}
