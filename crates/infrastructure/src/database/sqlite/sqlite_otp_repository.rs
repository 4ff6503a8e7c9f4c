use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use studybuddy_core::StudyBuddyResult;
use studybuddy_domain::entities::OtpCode;
use studybuddy_domain::repositories::OtpRepository;

/// SQLite implementation of OtpRepository
pub struct SqliteOtpRepository {
    pool: SqlitePool,
}

impl SqliteOtpRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> StudyBuddyResult<OtpCode> {
        Ok(OtpCode {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            code: row.try_get("code")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OtpRepository for SqliteOtpRepository {
    async fn create(
        &self,
        email: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> StudyBuddyResult<OtpCode> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO otp_codes (email, code, expires_at, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(OtpCode {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            code: code.to_string(),
            expires_at,
            created_at: now,
        })
    }

    async fn find_valid(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> StudyBuddyResult<Option<OtpCode>> {
        let row = sqlx::query(
            "SELECT * FROM otp_codes WHERE email = $1 AND code = $2 AND expires_at > $3",
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn delete(&self, id: i64) -> StudyBuddyResult<bool> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StudyBuddyResult<u64> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
