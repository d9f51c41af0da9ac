//! Database repository for one-time codes (password reset, email verification).
//!
//! Codes are stored hashed. Issuing a new code invalidates earlier unused
//! ones for the same (user, purpose); verifying consumes the code.

use crate::auth::password;
use crate::db::errors::Result;
use crate::types::{abbrev_uuid, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;
use uuid::Uuid;

/// What a one-time code is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    PasswordReset,
    EmailVerification,
}

impl CodePurpose {
    fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::PasswordReset => "password_reset",
            CodePurpose::EmailVerification => "email_verification",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct CodeRow {
    id: Uuid,
    code_hash: String,
    expires_at: DateTime<Utc>,
}

pub struct OneTimeCodes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> OneTimeCodes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Issue a fresh code for the user, invalidating prior unused ones.
    /// Returns the raw code; only its hash is persisted.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn issue(&mut self, user_id: UserId, purpose: CodePurpose, ttl: std::time::Duration) -> Result<String> {
        sqlx::query("UPDATE one_time_codes SET used = TRUE WHERE user_id = $1 AND purpose = $2 AND NOT used")
            .bind(user_id)
            .bind(purpose.as_str())
            .execute(&mut *self.db)
            .await?;

        let code = password::generate_otp_code();
        let code_hash = password::hash_string(&code).map_err(|e| anyhow::anyhow!("hash one-time code: {e}"))?;
        let expires_at = Utc::now() + ttl;

        sqlx::query("INSERT INTO one_time_codes (id, user_id, purpose, code_hash, expires_at) VALUES ($1, $2, $3, $4, $5)")
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(purpose.as_str())
            .bind(&code_hash)
            .bind(expires_at)
            .execute(&mut *self.db)
            .await?;

        Ok(code)
    }

    /// Verify and consume a code. Returns false for unknown, expired, used or
    /// mismatched codes alike - callers surface one uniform failure message.
    #[instrument(skip(self, code), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn verify_and_consume(&mut self, user_id: UserId, purpose: CodePurpose, code: &str) -> Result<bool> {
        let row = sqlx::query_as::<_, CodeRow>(
            "SELECT id, code_hash, expires_at FROM one_time_codes \
             WHERE user_id = $1 AND purpose = $2 AND NOT used \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id)
        .bind(purpose.as_str())
        .fetch_optional(&mut *self.db)
        .await?;

        let Some(row) = row else {
            return Ok(false);
        };

        if row.expires_at < Utc::now() {
            return Ok(false);
        }

        let matches = password::verify_string(code, &row.code_hash).map_err(|e| anyhow::anyhow!("verify one-time code: {e}"))?;
        if !matches {
            return Ok(false);
        }

        sqlx::query("UPDATE one_time_codes SET used = TRUE WHERE id = $1")
            .bind(row.id)
            .execute(&mut *self.db)
            .await?;

        Ok(true)
    }
}
