//! # classctl: multi-tenant school management platform
//!
//! `classctl` is the REST backend of a school-management product: one binary
//! serving role-based portals (platform superadmin, school admin, teacher,
//! student) with subscriptions and billing, class and timetable
//! administration, assignments, attendance, exams and results,
//! announcements, and fee collection.
//!
//! ## Overview
//!
//! Schools are tenants. Every tenant-owned row carries a `tenant_id` and
//! every query is scoped by it, so isolation lives in the data layer rather
//! than in handler discipline. A school signs up, verifies its email,
//! purchases a subscription plan through the payment gateway, and from then
//! on the whole admin surface is gated on that subscription staying active.
//!
//! ### Request flow
//!
//! Requests authenticate with a JWT session cookie set at login. Access
//! control is an extractor chain with one source of truth:
//!
//! 1. `CurrentUser` - verifies the session cookie; missing, malformed or
//!    expired all read as "no user" (401).
//! 2. Role guards (`AdminUser`, `TeacherUser`, ...) - wrong role is 403.
//! 3. `Subscribed<T>` - the subscription gate. Checks the tenant's
//!    subscription in the database on every gated request; when it fails
//!    the route answers 402 with a role-parameterized blocked payload
//!    (admins are invited to purchase, everyone else is told to contact
//!    their administrator).
//!
//! ### Core components
//!
//! The **API layer** ([`api`]) keeps the URL namespaces of the product:
//! `accounts/`, `users/`, `classroom/`, `academics/`, `assignment/`,
//! `exam/`, `finance/`, `subscriptions/`, `superadmin/`, all nested under
//! `/api/v1`.
//!
//! The **database layer** ([`db`]) uses the repository pattern over sqlx/
//! PostgreSQL. Derived read models (the timetable matrix, class rosters,
//! result statistics) are rebuilt from rows on every fetch - writes never
//! return them, clients re-fetch.
//!
//! The **payment layer** ([`payments`]) hides the gateway behind a trait:
//! order creation plus HMAC signature verification, with a Razorpay
//! implementation and an offline dummy for development.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
mod email;
pub mod errors;
mod openapi;
pub mod payments;
pub mod telemetry;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::{
    auth::password,
    db::handlers::Users,
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
    payments::PaymentGateway,
    types::{Role, UserId},
};
use axum::{
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
    Router,
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file/environment
/// - `payments`: The configured payment gateway
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub payments: Arc<dyn PaymentGateway>,
}

/// Get the classctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial platform superadmin if it doesn't exist.
///
/// Idempotent: creates the account on first startup, updates the password on
/// later ones if one is configured. Returns the user id either way.
#[instrument(skip_all)]
pub async fn create_initial_superadmin(email: &str, password: Option<&str>, db: &PgPool) -> anyhow::Result<UserId> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_string(pwd).map_err(|e| anyhow::anyhow!("hash superadmin password: {e}"))?),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    if let Some(existing) = users
        .get_by_email(email)
        .await
        .map_err(|e| anyhow::anyhow!("check existing superadmin: {e}"))?
    {
        if let Some(password_hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
                .bind(password_hash)
                .bind(existing.id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        return Ok(existing.id);
    }

    let created = users
        .create(&UserCreateDBRequest {
            username: email.to_string(),
            email: email.to_string(),
            full_name: None,
            role: Role::SuperAdmin,
            tenant_id: None,
            phone: None,
            gender: None,
            password_hash,
            must_change_password: false,
            email_verified: true,
        })
        .await
        .map_err(|e| anyhow::anyhow!("create superadmin: {e}"))?;

    tx.commit().await?;
    info!("Created initial superadmin {}", created.id);
    Ok(created.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.cors.allow_credentials)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request());

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers::{
        academics, accounts, assignments, classroom, exams, fees, students, subjects, subscriptions, superadmin, teachers, timetables,
    };

    let accounts_routes = Router::new()
        .route("/accounts/login/", post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
        .route("/accounts/profile/", get(accounts::get_profile).put(accounts::update_profile))
        .route("/accounts/profile/image/", post(accounts::upload_profile_image))
        .route("/accounts/change-password/", put(accounts::change_password))
        .route("/accounts/forgot-password/", post(accounts::forgot_password))
        .route("/accounts/forgot/resend-otp/", post(accounts::resend_forgot_otp))
        .route("/accounts/reset-password/", post(accounts::reset_password))
        .route("/accounts/admin/signup/", post(accounts::admin_signup))
        .route("/accounts/admin/verify-email/", post(accounts::admin_verify_email))
        .route("/accounts/admin/resend-otp/", post(accounts::admin_resend_otp))
        // The admin profile view is the shared profile endpoint; the response
        // carries the institute name alongside the user fields
        .route("/accounts/admin/profile/", get(accounts::get_profile).put(accounts::update_profile));

    let users_routes = Router::new()
        .route("/users/teachers/create/", post(teachers::create_teacher))
        .route("/users/teachers/", get(teachers::list_teachers))
        .route("/users/teachers/update/{teacher_id}/", put(teachers::update_teacher))
        .route("/users/teachers/delete/{teacher_id}/", delete(teachers::delete_teacher))
        .route(
            "/users/teachers/profile/",
            get(teachers::get_own_profile).put(teachers::update_own_profile),
        )
        .route("/users/students/create/", post(students::create_student))
        .route("/users/students/list/", get(students::list_students))
        .route("/users/students/update/{student_id}/", put(students::update_student))
        .route("/users/students/delete/{student_id}/", delete(students::delete_student))
        .route(
            "/users/students/profile/",
            get(students::get_own_profile).put(students::update_own_profile),
        )
        .route("/users/students/{student_id}/", get(students::get_student));

    let classroom_routes = Router::new()
        .route("/classroom/create/class/", post(classroom::create_class))
        .route("/classroom/classes/", get(classroom::list_classes))
        .route("/classroom/classes/dropdown/", get(classroom::class_dropdown))
        .route("/classroom/class/details/{class_id}/", get(classroom::class_detail))
        .route("/classroom/update/class/{class_id}/", put(classroom::update_class))
        .route("/classroom/delete/class/{class_id}/", delete(classroom::delete_class))
        .route("/classroom/teacher/classes/dropdown/", get(classroom::teacher_class_dropdown))
        .route("/classroom/subjects/", get(subjects::list_subjects).post(subjects::create_subject))
        .route(
            "/classroom/subjects/{subject_id}/",
            put(subjects::update_subject).delete(subjects::delete_subject),
        )
        .route("/classroom/teacher/subjects/dropdown", get(subjects::teacher_subject_dropdown))
        .route(
            "/classroom/timeslots/",
            get(timetables::list_timeslots).post(timetables::create_timeslot),
        )
        .route(
            "/classroom/timeslots/{slot_id}/",
            put(timetables::update_timeslot).delete(timetables::delete_timeslot),
        )
        .route(
            "/classroom/timetables/",
            get(timetables::list_timetables).post(timetables::create_timetable),
        )
        .route("/classroom/timetables/{timetable_id}/matrix/", get(timetables::get_matrix))
        .route("/classroom/timetable-entries/", post(timetables::create_entry))
        .route(
            "/classroom/timetable-entries/{entry_id}/",
            put(timetables::update_entry).delete(timetables::delete_entry),
        )
        .route("/classroom/timetable-entries/clear-timetable/", post(timetables::clear_timetable))
        .route("/classroom/teacher/timetable/", get(timetables::teacher_timetable))
        .route("/classroom/student/timetable/", get(timetables::student_timetable));

    let subscriptions_routes = Router::new()
        .route(
            "/subscriptions/plans/",
            get(subscriptions::list_plans).post(subscriptions::create_plan),
        )
        .route(
            "/subscriptions/plans/{plan_id}/",
            put(subscriptions::update_plan).delete(subscriptions::delete_plan),
        )
        .route("/subscriptions/active-plans", get(subscriptions::active_plans))
        .route("/subscriptions/tenant-subscriptions/", get(subscriptions::tenant_subscriptions))
        .route("/subscriptions/status/", get(subscriptions::subscription_status))
        .route("/subscriptions/create-order/{plan_id}/", post(subscriptions::create_order))
        .route("/subscriptions/verify-payment/", post(subscriptions::verify_payment));

    let superadmin_routes = Router::new()
        .route("/superadmin/tenants/", get(superadmin::list_tenants))
        .route("/superadmin/tenants/billing/", get(superadmin::billing_overview))
        .route("/superadmin/tenants/{tenant_id}/status/", post(superadmin::set_tenant_status))
        .route("/superadmin/tenants/{tenant_id}/delete/", delete(superadmin::delete_tenant));

    let academics_routes = Router::new()
        .route("/academics/create/announcement/", post(academics::create_announcement))
        .route("/academics/admin/announcements/", get(academics::admin_announcements))
        .route("/academics/announcement/audience/", get(academics::audience_announcements))
        .route(
            "/academics/announcements/{announcement_id}/",
            put(academics::update_announcement).delete(academics::delete_announcement),
        )
        .route("/academics/teacher/attendance/mark/", post(academics::mark_attendance))
        .route("/academics/teacher/attendance/", get(academics::class_attendance))
        .route("/academics/student/attendance/monthly/", get(academics::student_monthly_attendance));

    let assignment_routes = Router::new()
        .route(
            "/assignment/teacher/assignments/",
            get(assignments::teacher_assignments).post(assignments::create_assignment),
        )
        .route(
            "/assignment/teacher/assignments/{assignment_id}/submissions/",
            get(assignments::assignment_submissions),
        )
        .route(
            "/assignment/teacher/submissions/{submission_id}/grade/",
            patch(assignments::grade_submission),
        )
        .route("/assignments/student/", get(assignments::student_assignments))
        .route("/assignments/student/submit/", post(assignments::submit_assignment));

    let exam_routes = Router::new()
        .route("/exam/teacher/exams/", get(exams::teacher_exams).post(exams::create_exam))
        .route("/exam/teacher/exams/{exam_id}/", put(exams::update_exam).delete(exams::delete_exam))
        .route("/exam/teacher/exams/{exam_id}/results/", get(exams::exam_results))
        .route("/exam/teacher/results/{result_id}/grade/", patch(exams::grade_result))
        .route("/exam/teacher/concerns/", get(exams::teacher_concerns))
        .route("/exam/teacher/concerns/{concern_id}/review/", post(exams::review_concern))
        .route("/exam/student/exams/", get(exams::student_exams))
        .route("/exam/student/results/", get(exams::student_results))
        .route("/exam/student/concerns/", get(exams::student_concerns))
        .route("/exam/student/concerns/raise/", post(exams::raise_concern));

    let finance_routes = Router::new()
        .route(
            "/finance/admin/fee-types/",
            get(fees::list_fee_types).post(fees::create_fee_type),
        )
        .route(
            "/finance/admin/fee-types/{fee_type_id}/",
            put(fees::update_fee_type).delete(fees::delete_fee_type),
        )
        .route(
            "/finance/admin/fee-structures/",
            get(fees::list_fee_structures).post(fees::create_fee_structure),
        )
        .route("/finance/admin/fee-structures/{structure_id}/", delete(fees::delete_fee_structure))
        .route("/finance/admin/fee-structures/{structure_id}/generate-bills/", post(fees::generate_bills))
        .route("/finance/admin/bills/", get(fees::list_bills))
        .route("/finance/admin/bills/{bill_id}/", get(fees::get_bill))
        .route("/finance/admin/payments/", get(fees::list_payments).post(fees::record_payment))
        .route("/finance/admin/payments/{payment_id}/", get(fees::get_payment))
        .route("/finance/student/bills/", get(fees::student_bills))
        .route("/finance/student/bills/{bill_id}/create-order/", post(fees::create_bill_order))
        .route("/finance/student/bills/verify-payment/", post(fees::verify_bill_payment));

    let api_routes = Router::new()
        .merge(accounts_routes)
        .merge(users_routes)
        .merge(classroom_routes)
        .merge(subscriptions_routes)
        .merge(superadmin_routes)
        .merge(academics_routes)
        .merge(assignment_routes)
        .merge(exam_routes)
        .merge(finance_routes)
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The running application: a configured router bound to its listener.
pub struct Application {
    router: Router,
    listener: TcpListener,
}

impl Application {
    /// Connect to the database, run migrations, seed the superadmin and
    /// bind the listener.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        migrator().run(&pool).await?;

        create_initial_superadmin(&config.superadmin_email, config.superadmin_password.as_deref(), &pool).await?;

        let gateway = payments::create_gateway(&config.payment);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("Listening on {}", addr);

        let state = AppState::builder().db(pool).config(config).payments(gateway).build();
        let router = build_router(state)?;

        Ok(Self { router, listener })
    }

    /// Serve until the shutdown future resolves.
    pub async fn serve(self, shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router).with_graceful_shutdown(shutdown).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_state;

    #[tokio::test]
    async fn test_router_builds() {
        let state = create_test_state();
        assert!(build_router(state).is_ok());
    }

    #[tokio::test]
    async fn test_protected_routes_reject_anonymous() {
        use axum_test::TestServer;

        let state = create_test_state();
        let app = build_router(state).unwrap();
        let server = TestServer::new(app).unwrap();

        // No session: the guard answers before any handler (or database) is
        // reached
        let response = server.get("/api/v1/classroom/timetables/").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        let response = server.get("/api/v1/users/students/list/").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

        let response = server.get("/api/v1/superadmin/tenants/").await;
        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_forbidden_not_unauthorized() {
        use crate::api::models::users::CurrentUser;
        use crate::auth::session;
        use axum_test::TestServer;
        use uuid::Uuid;

        let state = create_test_state();
        let config = state.config.clone();
        let app = build_router(state).unwrap();
        let server = TestServer::new(app).unwrap();

        let student = CurrentUser {
            id: Uuid::new_v4(),
            username: "kid".to_string(),
            email: "kid@school.example".to_string(),
            role: crate::types::Role::Student,
            tenant_id: Some(Uuid::new_v4()),
            must_change_password: false,
            full_name: None,
        };
        let token = session::create_session_token(&student, &config).unwrap();

        // A student session on a superadmin route: authenticated but denied
        let response = server
            .get("/api/v1/superadmin/tenants/")
            .add_header("cookie", format!("{}={}", config.auth.session.cookie_name, token))
            .await;
        response.assert_status(axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_healthz() {
        use axum_test::TestServer;

        let state = create_test_state();
        let app = build_router(state).unwrap();
        let server = TestServer::new(app).unwrap();

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }
}
