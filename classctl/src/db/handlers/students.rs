//! Database repository for student profiles.

use crate::db::errors::{DbError, Result};
use crate::db::models::users::{StudentCreateDBRequest, StudentDBResponse};
use crate::types::{abbrev_uuid, ClassId, StudentId, TenantId, UserId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const STUDENT_SELECT: &str = r#"
    SELECT sp.id, sp.user_id, u.full_name, u.email, u.phone, u.gender, u.profile_image,
           sp.admission_number, sp.class_id, c.name AS class_name, c.division AS class_division,
           sp.roll_number, sp.admission_date, sp.guardian_name, sp.guardian_contact, sp.created_at
    FROM student_profiles sp
    JOIN users u ON u.id = sp.user_id
    LEFT JOIN school_classes c ON c.id = sp.class_id
"#;

pub struct Students<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Students<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &StudentCreateDBRequest) -> Result<StudentId> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO student_profiles (id, user_id, admission_number, class_id, roll_number, admission_date, \
                                           guardian_name, guardian_contact) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(request.user_id)
        .bind(&request.admission_number)
        .bind(request.class_id)
        .bind(request.roll_number)
        .bind(request.admission_date)
        .bind(&request.guardian_name)
        .bind(&request.guardian_contact)
        .execute(&mut *self.db)
        .await?;

        Ok(id)
    }

    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&id), tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn get_by_id(&mut self, id: StudentId, tenant_id: TenantId) -> Result<Option<StudentDBResponse>> {
        let student = sqlx::query_as::<_, StudentDBResponse>(&format!("{STUDENT_SELECT} WHERE sp.id = $1 AND u.tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(student)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<StudentDBResponse>> {
        let student = sqlx::query_as::<_, StudentDBResponse>(&format!("{STUDENT_SELECT} WHERE sp.user_id = $1"))
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(student)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn list(&mut self, tenant_id: TenantId) -> Result<Vec<StudentDBResponse>> {
        let students = sqlx::query_as::<_, StudentDBResponse>(&format!(
            "{STUDENT_SELECT} WHERE u.tenant_id = $1 ORDER BY sp.admission_number"
        ))
        .bind(tenant_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(students)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn list_by_class(&mut self, class_id: ClassId) -> Result<Vec<StudentDBResponse>> {
        let students = sqlx::query_as::<_, StudentDBResponse>(&format!("{STUDENT_SELECT} WHERE sp.class_id = $1 ORDER BY sp.roll_number"))
            .bind(class_id)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(students)
    }

    #[instrument(skip(self), fields(tenant_id = %abbrev_uuid(&tenant_id)), err)]
    pub async fn count_by_tenant(&mut self, tenant_id: TenantId) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM student_profiles sp JOIN users u ON u.id = sp.user_id WHERE u.tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn count_by_class(&mut self, class_id: ClassId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM student_profiles WHERE class_id = $1")
            .bind(class_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Update the profile columns; user columns travel through `Users::update`
    /// in the same transaction.
    #[instrument(skip(self), fields(student_id = %abbrev_uuid(&id)), err)]
    pub async fn update_profile(
        &mut self,
        id: StudentId,
        roll_number: Option<i32>,
        class_id: Option<ClassId>,
        guardian_name: Option<&str>,
        guardian_contact: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE student_profiles SET \
                 roll_number = COALESCE($2, roll_number), \
                 class_id = COALESCE($3, class_id), \
                 guardian_name = COALESCE($4, guardian_name), \
                 guardian_contact = COALESCE($5, guardian_contact), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(roll_number)
        .bind(class_id)
        .bind(guardian_name)
        .bind(guardian_contact)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
