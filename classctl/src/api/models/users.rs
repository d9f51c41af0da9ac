//! API request/response models for users and their profiles.

use crate::db::models::users::{StudentDBResponse, TeacherDBResponse, UserDBResponse};
use crate::types::{ClassId, Role, StudentId, TeacherId, TenantId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated identity carried by the session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub tenant_id: Option<TenantId>,
    pub must_change_password: bool,
    pub full_name: Option<String>,
}

/// Full profile view of a user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub tenant_id: Option<TenantId>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            full_name: db.full_name,
            role: db.role,
            tenant_id: db.tenant_id,
            phone: db.phone,
            gender: db.gender,
            profile_image: db.profile_image,
            must_change_password: db.must_change_password,
            created_at: db.created_at,
            last_login: db.last_login,
        }
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            role: db.role,
            tenant_id: db.tenant_id,
            must_change_password: db.must_change_password,
            full_name: db.full_name,
        }
    }
}

/// Self-service profile update (role and tenant are immutable here).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
}

/// Admin request to create a teacher account + profile.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TeacherCreate {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub qualification: Option<String>,
    #[schema(value_type = Option<String>)]
    pub salary: Option<Decimal>,
    pub joining_date: Option<NaiveDate>,
}

/// Admin request to update a teacher.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TeacherUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub qualification: Option<String>,
    #[schema(value_type = Option<String>)]
    pub salary: Option<Decimal>,
    pub joining_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeacherResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TeacherId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
    pub qualification: String,
    #[schema(value_type = String)]
    pub salary: Decimal,
    pub joining_date: Option<NaiveDate>,
}

impl From<TeacherDBResponse> for TeacherResponse {
    fn from(db: TeacherDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            full_name: db.full_name,
            email: db.email,
            phone: db.phone,
            gender: db.gender,
            profile_image: db.profile_image,
            qualification: db.qualification,
            salary: db.salary,
            joining_date: db.joining_date,
        }
    }
}

/// Admin request to create a student account + profile.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StudentCreate {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub admission_number: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub school_class: Option<ClassId>,
    pub roll_number: Option<i32>,
    pub admission_date: Option<NaiveDate>,
    pub guardian_name: Option<String>,
    pub guardian_contact: Option<String>,
}

/// Admin request to update a student.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StudentUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub roll_number: Option<i32>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub school_class: Option<ClassId>,
    pub guardian_name: Option<String>,
    pub guardian_contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: StudentId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub profile_image: Option<String>,
    pub admission_number: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub class_id: Option<ClassId>,
    pub class_label: Option<String>,
    pub roll_number: i32,
    pub admission_date: NaiveDate,
    pub guardian_name: Option<String>,
    pub guardian_contact: Option<String>,
}

impl From<StudentDBResponse> for StudentResponse {
    fn from(db: StudentDBResponse) -> Self {
        let class_label = match (&db.class_name, &db.class_division) {
            (Some(name), Some(division)) => Some(format!("{name}-{division}")),
            _ => None,
        };
        Self {
            id: db.id,
            user_id: db.user_id,
            full_name: db.full_name,
            email: db.email,
            phone: db.phone,
            gender: db.gender,
            profile_image: db.profile_image,
            admission_number: db.admission_number,
            class_id: db.class_id,
            class_label,
            roll_number: db.roll_number,
            admission_date: db.admission_date,
            guardian_name: db.guardian_name,
            guardian_contact: db.guardian_contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_class_label() {
        let db = StudentDBResponse {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            full_name: Some("A Student".to_string()),
            email: "s@school.example".to_string(),
            phone: None,
            gender: None,
            profile_image: None,
            admission_number: "ADM-1".to_string(),
            class_id: Some(uuid::Uuid::new_v4()),
            class_name: Some("10".to_string()),
            class_division: Some("B".to_string()),
            roll_number: 7,
            admission_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            guardian_name: None,
            guardian_contact: None,
            created_at: Utc::now(),
        };

        let response = StudentResponse::from(db);
        assert_eq!(response.class_label.as_deref(), Some("10-B"));
    }
}
