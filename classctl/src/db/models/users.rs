//! Database models for users and their teacher/student profiles.

use crate::types::{ClassId, Role, StudentId, TeacherId, TenantId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub password_hash: Option<String>,
    pub must_change_password: bool,
    pub email_verified: bool,
}

/// Database request for updating a user; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
    pub password_hash: Option<String>,
    pub must_change_password: Option<bool>,
    pub email_verified: Option<bool>,
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub tenant_id: Option<TenantId>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
    pub password_hash: Option<String>,
    pub must_change_password: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Database request for creating a teacher profile (the user row is created
/// separately in the same transaction)
#[derive(Debug, Clone)]
pub struct TeacherCreateDBRequest {
    pub user_id: UserId,
    pub qualification: String,
    pub salary: Decimal,
    pub joining_date: Option<NaiveDate>,
}

/// Teacher profile joined with its user row, as lists and detail views need it
#[derive(Debug, Clone, FromRow)]
pub struct TeacherDBResponse {
    pub id: TeacherId,
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
    pub qualification: String,
    pub salary: Decimal,
    pub joining_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Database request for creating a student profile
#[derive(Debug, Clone)]
pub struct StudentCreateDBRequest {
    pub user_id: UserId,
    pub admission_number: String,
    pub class_id: Option<ClassId>,
    pub roll_number: i32,
    pub admission_date: NaiveDate,
    pub guardian_name: Option<String>,
    pub guardian_contact: Option<String>,
}

/// Student profile joined with its user row and class label
#[derive(Debug, Clone, FromRow)]
pub struct StudentDBResponse {
    pub id: StudentId,
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
    pub admission_number: String,
    pub class_id: Option<ClassId>,
    pub class_name: Option<String>,
    pub class_division: Option<String>,
    pub roll_number: i32,
    pub admission_date: NaiveDate,
    pub guardian_name: Option<String>,
    pub guardian_contact: Option<String>,
    pub created_at: DateTime<Utc>,
}
