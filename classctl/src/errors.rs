use crate::db::errors::DbError;
use crate::types::Role;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated but the role does not allow the operation
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The tenant has no active subscription; gated routes answer with a
    /// role-parameterized blocked view instead of their normal payload
    #[error("Subscription required")]
    SubscriptionRequired { role: Role },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conflicting write, e.g. a double-booked teacher or a duplicate cell
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::SubscriptionRequired { .. } => StatusCode::PAYMENT_REQUIRED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::Forbidden { message } => message.clone(),
            Error::SubscriptionRequired { .. } => "An active subscription is required".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Conflict { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => {
                    // Provide user-friendly messages for common unique constraint violations
                    match (table.as_deref(), constraint.as_deref()) {
                        (Some("users"), Some(c)) if c.contains("username") => "This username is already taken".to_string(),
                        (Some("tenants"), Some(c)) if c.contains("email") => {
                            "A school with this email address is already registered".to_string()
                        }
                        (Some("timetables"), _) => "This class already has a timetable".to_string(),
                        (Some("timetable_entries"), _) => "This period is already assigned for that day and slot".to_string(),
                        (Some("school_classes"), _) => "A class with this name and division already exists for the academic year".to_string(),
                        (Some("subjects"), _) => "A subject with this name already exists".to_string(),
                        (Some("fee_types"), _) => "A fee type with this name already exists".to_string(),
                        (Some("student_profiles"), Some(c)) if c.contains("admission") => {
                            "This admission number is already in use".to_string()
                        }
                        (Some("student_bills"), _) => "This student is already billed for that fee".to_string(),
                        (Some("fee_payments"), Some(c)) if c.contains("bill") => "This bill has already been paid".to_string(),
                        (Some("assignment_submissions"), _) => "This assignment has already been submitted".to_string(),
                        (Some("exam_results"), _) => "A result for this student already exists".to_string(),
                        _ => "Resource already exists".to_string(),
                    }
                }
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } | Error::SubscriptionRequired { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // The blocked view: role-parameterized so admin clients can show a
            // purchase call-to-action while everyone else is told to contact
            // their administrator
            Error::SubscriptionRequired { role } => {
                let (message, can_subscribe) = match role {
                    Role::Admin => ("Your school does not have an active subscription. Purchase a plan to continue.", true),
                    _ => ("Your school's subscription is inactive. Please contact your administrator.", false),
                };
                let body = json!({
                    "code": "subscription_required",
                    "role": role,
                    "message": message,
                    "can_subscribe": can_subscribe,
                });
                (status, Json(body)).into_response()
            }
            // Everything else carries a flat `message` clients surface as a toast
            _ => {
                let body = json!({ "message": self.user_message() });
                (status, Json(body)).into_response()
            }
        }
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Unauthenticated { message: None }.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::SubscriptionRequired { role: Role::Student }.status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            Error::Conflict {
                message: "busy".to_string()
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(Error::Database(DbError::NotFound).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_unique_violation_messages_are_friendly() {
        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("timetable_entries_cell_unique".to_string()),
            table: Some("timetable_entries".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.user_message().contains("already assigned"));
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = Error::Internal {
            operation: "connect to razorpay".to_string(),
        };
        assert_eq!(err.user_message(), "Internal server error");
    }
}
