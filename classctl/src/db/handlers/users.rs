//! Database repository for users.

use crate::db::errors::{DbError, Result};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest};
use crate::types::{abbrev_uuid, UserId};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, full_name, role, tenant_id, phone, gender, profile_image, \
     password_hash, must_change_password, email_verified, created_at, updated_at, last_login";

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(username = %request.username, role = %request.role), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            INSERT INTO users (id, username, email, full_name, role, tenant_id, phone, gender,
                               password_hash, must_change_password, email_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.full_name)
        .bind(request.role)
        .bind(request.tenant_id)
        .bind(&request.phone)
        .bind(&request.gender)
        .bind(&request.password_hash)
        .bind(request.must_change_password)
        .bind(request.email_verified)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 ORDER BY created_at LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    /// Conditional field update; `None` leaves the column as it was.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                gender = COALESCE($4, gender),
                profile_image = COALESCE($5, profile_image),
                password_hash = COALESCE($6, password_hash),
                must_change_password = COALESCE($7, must_change_password),
                email_verified = COALESCE($8, email_verified),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(&request.gender)
        .bind(&request.profile_image)
        .bind(&request.password_hash)
        .bind(request.must_change_password)
        .bind(request.email_verified)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn set_last_login(&mut self, id: UserId) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
