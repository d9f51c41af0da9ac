//! Authentication and profile handlers (`accounts/` namespace).

use axum::{
    extract::{Multipart, State},
    Json,
};
use chrono::Utc;

use crate::{
    api::handlers::uploads,
    api::models::{
        auth::{
            AdminSignupRequest, AuthUserResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginBody, LoginRequest, LoginResponse,
            LogoutResponse, MessageResponse, ProfileImageResponse, ResetPasswordRequest, VerifyEmailRequest,
        },
        users::{CurrentUser, ProfileUpdateRequest, UserResponse},
    },
    auth::{password, session},
    db::{
        handlers::{otp::CodePurpose, OneTimeCodes, Subscriptions, Tenants, Users},
        models::tenants::TenantCreateDBRequest,
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
    email::EmailService,
    errors::{Error, Result},
    types::Role,
    AppState,
};

/// Reject passwords outside the configured bounds before any write happens.
fn validate_password(config: &crate::config::Config, candidate: &str) -> Result<()> {
    let rules = &config.auth.password;
    if candidate.len() < rules.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", rules.min_length),
        });
    }
    if candidate.len() > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be no more than {} characters", rules.max_length),
        });
    }
    Ok(())
}

/// Live subscription flag for a user's tenant. Superadmins always pass.
async fn has_active_subscription(conn: &mut sqlx::PgConnection, user: &UserDBResponse) -> Result<bool> {
    if user.role == Role::SuperAdmin {
        return Ok(true);
    }
    let Some(tenant_id) = user.tenant_id else {
        return Ok(false);
    };
    let mut subscriptions = Subscriptions::new(conn);
    Ok(subscriptions.tenant_has_active(tenant_id, Utc::now()).await?)
}

async fn auth_user_response(conn: &mut sqlx::PgConnection, user: UserDBResponse) -> Result<AuthUserResponse> {
    let active = has_active_subscription(&mut *conn, &user).await?;
    let tenant_name = match user.tenant_id {
        Some(tenant_id) => {
            let mut tenants = Tenants::new(&mut *conn);
            tenants.get_by_id(tenant_id).await?.map(|t| t.institute_name)
        }
        None => None,
    };

    Ok(AuthUserResponse {
        user: UserResponse::from(user),
        tenant_name,
        has_active_subscription: active,
    })
}

/// Login with username and password.
///
/// The response carries the user object clients cache for the session,
/// including the live `has_active_subscription` flag and
/// `must_change_password` (true routes the client to the change-password
/// page instead of the dashboard).
#[utoipa::path(
    post,
    path = "/accounts/login/",
    request_body = LoginRequest,
    tag = "accounts",
    responses(
        (status = 200, description = "Login successful", body = LoginBody),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<LoginResponse> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    let user = users
        .get_by_username(&request.username)
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        })?;

    let password_hash = user.password_hash.clone().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    })?;

    // Verify password on a blocking thread to avoid blocking the async runtime
    let candidate = request.password.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&candidate, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid username or password".to_string()),
        });
    }

    // Self-registered school admins must verify their email first
    if user.role == Role::Admin && !user.email_verified {
        return Err(Error::Unauthenticated {
            message: Some("Email not verified. Please check your inbox for the verification code.".to_string()),
        });
    }

    let mut users = Users::new(&mut conn);
    users.set_last_login(user.id).await?;

    let body = auth_user_response(&mut conn, user.clone()).await?;

    let current_user = CurrentUser::from(user);
    let token = session::create_session_token(&current_user, &state.config)?;
    let cookie = session::create_session_cookie(&token, &state.config);

    Ok(LoginResponse {
        body: LoginBody { user: body },
        cookie,
    })
}

/// Logout: clears the session cookie.
#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "accounts",
    responses((status = 200, description = "Logout successful", body = MessageResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> LogoutResponse {
    LogoutResponse {
        cookie: session::clear_session_cookie(&state.config),
    }
}

/// Authoritative identity re-validation: re-reads the user from the
/// database, so a deleted account or revoked subscription is visible on the
/// next fetch even while the session cookie is still valid.
#[utoipa::path(
    get,
    path = "/accounts/profile/",
    tag = "accounts",
    responses(
        (status = 200, description = "Current user profile", body = AuthUserResponse),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<AuthUserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    let user = users
        .get_by_id(current_user.id)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    Ok(Json(auth_user_response(&mut conn, user).await?))
}

/// Update own mutable profile fields.
#[utoipa::path(
    put,
    path = "/accounts/profile/",
    request_body = ProfileUpdateRequest,
    tag = "accounts",
    responses((status = 200, description = "Profile updated", body = UserResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    let updated = users
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                full_name: request.full_name,
                phone: request.phone,
                gender: request.gender,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Upload a profile image (multipart form, field `image`).
#[utoipa::path(
    post,
    path = "/accounts/profile/image/",
    tag = "accounts",
    responses(
        (status = 200, description = "Image stored", body = ProfileImageResponse),
        (status = 400, description = "No image in request"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_profile_image(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<ProfileImageResponse>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Invalid multipart request: {e}"),
    })? {
        if field.name() == Some("image") {
            let path = uploads::store_field(&state.config.uploads_dir, field).await?;

            let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
            let mut users = Users::new(&mut conn);
            users
                .update(
                    current_user.id,
                    &UserUpdateDBRequest {
                        profile_image: Some(path.clone()),
                        ..Default::default()
                    },
                )
                .await?;

            return Ok(Json(ProfileImageResponse { profile_image: path }));
        }
    }

    Err(Error::BadRequest {
        message: "Missing `image` field in multipart request".to_string(),
    })
}

/// Change own password; clears the first-login flag.
#[utoipa::path(
    put,
    path = "/accounts/change-password/",
    request_body = ChangePasswordRequest,
    tag = "accounts",
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password is incorrect"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    let user = users
        .get_by_id(current_user.id)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    let password_hash = user.password_hash.clone().ok_or_else(|| Error::BadRequest {
        message: "This account has no password set".to_string(),
    })?;

    let current = request.current_password.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&current, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Current password is incorrect".to_string()),
        });
    }

    validate_password(&state.config, &request.new_password)?;

    let new_password = request.new_password.clone();
    let new_hash = tokio::task::spawn_blocking(move || password::hash_string(&new_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    users
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                password_hash: Some(new_hash),
                must_change_password: Some(false),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

async fn issue_and_mail_code(state: &AppState, user: &UserDBResponse, purpose: CodePurpose, purpose_label: &str) -> Result<()> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut codes = OneTimeCodes::new(&mut conn);
    let code = codes.issue(user.id, purpose, state.config.auth.otp.ttl).await?;

    let email_service = EmailService::new(&state.config)?;
    email_service
        .send_otp_email(&user.email, user.full_name.as_deref(), &code, purpose_label)
        .await?;

    Ok(())
}

/// Request a password reset code by email.
///
/// The response never discloses whether the account exists.
#[utoipa::path(
    post,
    path = "/accounts/forgot-password/",
    request_body = ForgotPasswordRequest,
    tag = "accounts",
    responses((status = 200, description = "Reset code sent if the account exists", body = MessageResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn forgot_password(State(state): State<AppState>, Json(request): Json<ForgotPasswordRequest>) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    let user = users.get_by_email(&request.email).await?;
    drop(conn);

    if let Some(user) = user {
        if user.password_hash.is_some() {
            issue_and_mail_code(&state, &user, CodePurpose::PasswordReset, "password reset").await?;
        }
    }

    Ok(Json(MessageResponse {
        message: "If an account with that email exists, a reset code has been sent.".to_string(),
    }))
}

/// Re-send the password reset code.
#[utoipa::path(
    post,
    path = "/accounts/forgot/resend-otp/",
    request_body = ForgotPasswordRequest,
    tag = "accounts",
    responses((status = 200, description = "Reset code re-sent if the account exists", body = MessageResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn resend_forgot_otp(State(state): State<AppState>, Json(request): Json<ForgotPasswordRequest>) -> Result<Json<MessageResponse>> {
    forgot_password(State(state), Json(request)).await
}

/// Reset the password with the emailed code.
#[utoipa::path(
    post,
    path = "/accounts/reset-password/",
    request_body = ResetPasswordRequest,
    tag = "accounts",
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired code"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn reset_password(State(state): State<AppState>, Json(request): Json<ResetPasswordRequest>) -> Result<Json<MessageResponse>> {
    validate_password(&state.config, &request.new_password)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    let user = users.get_by_email(&request.email).await?.ok_or_else(|| Error::BadRequest {
        message: "Invalid or expired reset code".to_string(),
    })?;

    let mut codes = OneTimeCodes::new(&mut conn);
    let valid = codes.verify_and_consume(user.id, CodePurpose::PasswordReset, &request.code).await?;
    if !valid {
        return Err(Error::BadRequest {
            message: "Invalid or expired reset code".to_string(),
        });
    }

    let new_password = request.new_password.clone();
    let new_hash = tokio::task::spawn_blocking(move || password::hash_string(&new_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut users = Users::new(&mut conn);
    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                password_hash: Some(new_hash),
                must_change_password: Some(false),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset successfully".to_string(),
    }))
}

/// School self-registration: creates the tenant (trial) and its admin
/// account, then emails a verification code.
#[utoipa::path(
    post,
    path = "/accounts/admin/signup/",
    request_body = AdminSignupRequest,
    tag = "accounts",
    responses(
        (status = 201, description = "Signup accepted, verification code sent", body = MessageResponse),
        (status = 409, description = "School or username already registered"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn admin_signup(
    State(state): State<AppState>,
    Json(request): Json<AdminSignupRequest>,
) -> Result<(axum::http::StatusCode, Json<MessageResponse>)> {
    validate_password(&state.config, &request.password)?;

    let raw_password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&raw_password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut tenants = Tenants::new(&mut tx);
    let tenant = tenants
        .create(&TenantCreateDBRequest {
            institute_name: request.institute_name,
            email: request.email.clone(),
            phone: request.phone.unwrap_or_default(),
        })
        .await?;

    let mut users = Users::new(&mut tx);
    let user = users
        .create(&UserCreateDBRequest {
            username: request.username,
            email: request.email,
            full_name: request.full_name,
            role: Role::Admin,
            tenant_id: Some(tenant.id),
            phone: None,
            gender: None,
            password_hash: Some(password_hash),
            must_change_password: false,
            email_verified: false,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    issue_and_mail_code(&state, &user, CodePurpose::EmailVerification, "email verification").await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(MessageResponse {
            message: "Signup successful. Please check your email for the verification code.".to_string(),
        }),
    ))
}

/// Verify the admin's email with the signup code.
#[utoipa::path(
    post,
    path = "/accounts/admin/verify-email/",
    request_body = VerifyEmailRequest,
    tag = "accounts",
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired code"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn admin_verify_email(State(state): State<AppState>, Json(request): Json<VerifyEmailRequest>) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut users = Users::new(&mut conn);
    let user = users.get_by_email(&request.email).await?.ok_or_else(|| Error::BadRequest {
        message: "Invalid or expired verification code".to_string(),
    })?;

    let mut codes = OneTimeCodes::new(&mut conn);
    let valid = codes
        .verify_and_consume(user.id, CodePurpose::EmailVerification, &request.code)
        .await?;
    if !valid {
        return Err(Error::BadRequest {
            message: "Invalid or expired verification code".to_string(),
        });
    }

    let mut users = Users::new(&mut conn);
    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                email_verified: Some(true),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Email verified. You can now login.".to_string(),
    }))
}

/// Re-send the signup verification code.
#[utoipa::path(
    post,
    path = "/accounts/admin/resend-otp/",
    request_body = ForgotPasswordRequest,
    tag = "accounts",
    responses((status = 200, description = "Verification code re-sent if the account exists", body = MessageResponse))
)]
#[tracing::instrument(skip_all)]
pub async fn admin_resend_otp(State(state): State<AppState>, Json(request): Json<ForgotPasswordRequest>) -> Result<Json<MessageResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);
    let user = users.get_by_email(&request.email).await?;
    drop(conn);

    if let Some(user) = user {
        if !user.email_verified {
            issue_and_mail_code(&state, &user, CodePurpose::EmailVerification, "email verification").await?;
        }
    }

    Ok(Json(MessageResponse {
        message: "If an unverified account with that email exists, a code has been sent.".to_string(),
    }))
}
