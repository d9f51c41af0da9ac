//! API request/response models for classes and subjects.

use crate::db::models::classroom::{ClassDBResponse, ClassWithStatsDBResponse, SubjectDBResponse};
use crate::types::{ClassId, SubjectId, TeacherId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::users::StudentResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassCreate {
    pub name: String,
    pub division: String,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub class_teacher: Option<TeacherId>,
    pub max_student: Option<i32>,
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassUpdate {
    pub name: Option<String>,
    pub division: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub class_teacher: Option<TeacherId>,
    pub max_student: Option<i32>,
    pub academic_year: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ClassId,
    pub name: String,
    pub division: String,
    pub academic_year: String,
    pub max_student: i32,
    pub is_active: bool,
}

impl From<ClassDBResponse> for ClassResponse {
    fn from(db: ClassDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            division: db.division,
            academic_year: db.academic_year,
            max_student: db.max_students,
            is_active: db.is_active,
        }
    }
}

/// Class list row with live counts, as the admin class list renders it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassListItem {
    #[schema(value_type = String, format = "uuid")]
    pub id: ClassId,
    pub name: String,
    pub division: String,
    pub academic_year: String,
    pub max_student: i32,
    pub current_students: i64,
    pub teacher: Option<String>,
}

impl From<ClassWithStatsDBResponse> for ClassListItem {
    fn from(db: ClassWithStatsDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            division: db.division,
            academic_year: db.academic_year,
            max_student: db.max_students,
            current_students: db.current_students,
            teacher: db.teacher_name,
        }
    }
}

/// Compact row for class selectors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassDropdownItem {
    #[schema(value_type = String, format = "uuid")]
    pub id: ClassId,
    pub label: String,
    pub max_student: i32,
    pub current_students: i64,
}

impl From<ClassWithStatsDBResponse> for ClassDropdownItem {
    fn from(db: ClassWithStatsDBResponse) -> Self {
        Self {
            id: db.id,
            label: format!("{}-{} ({})", db.name, db.division, db.academic_year),
            max_student: db.max_students,
            current_students: db.current_students,
        }
    }
}

/// Class detail: the class plus its roster.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassDetailResponse {
    #[serde(flatten)]
    pub class: ClassResponse,
    pub class_teacher: Option<String>,
    pub students: Vec<StudentResponse>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubjectCreate {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubjectResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SubjectId,
    pub name: String,
}

impl From<SubjectDBResponse> for SubjectResponse {
    fn from(db: SubjectDBResponse) -> Self {
        Self { id: db.id, name: db.name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_dropdown_label_format() {
        let db = ClassWithStatsDBResponse {
            id: Uuid::new_v4(),
            name: "10".to_string(),
            division: "A".to_string(),
            academic_year: "2025-2026".to_string(),
            max_students: 40,
            current_students: 12,
            teacher_name: None,
        };
        let item = ClassDropdownItem::from(db);
        assert_eq!(item.label, "10-A (2025-2026)");
    }

    #[test]
    fn test_class_response_from_db() {
        let db = ClassDBResponse {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "9".to_string(),
            division: "C".to_string(),
            class_teacher_id: None,
            max_students: 30,
            academic_year: "2025-2026".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let response = ClassResponse::from(db);
        assert_eq!(response.max_student, 30);
        assert!(response.is_active);
    }
}
