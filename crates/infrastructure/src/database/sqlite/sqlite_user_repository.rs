use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use studybuddy_core::{StudyBuddyError, StudyBuddyResult};
use studybuddy_domain::entities::{NewUser, User};
use studybuddy_domain::repositories::UserRepository;

/// SQLite implementation of UserRepository
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Hash password using bcrypt
    fn hash_password(password: &str) -> StudyBuddyResult<String> {
        bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| StudyBuddyError::internal(format!("Failed to hash password: {e}")))
    }

    fn map_row(row: &SqliteRow) -> StudyBuddyResult<User> {
        let id: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| StudyBuddyError::internal(format!("Invalid UUID: {e}")))?;

        Ok(User {
            id,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            refresh_token: row.try_get("refresh_token")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn map_unique_violation(e: sqlx::Error) -> StudyBuddyError {
        match e {
            sqlx::Error::Database(ref db_err)
                if db_err.message().contains("UNIQUE constraint failed") =>
            {
                StudyBuddyError::validation_error("Email already in use")
            }
            _ => StudyBuddyError::Database(e),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &NewUser) -> StudyBuddyResult<User> {
        let password_hash = Self::hash_password(&user.password)?;
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, refresh_token, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NULL, $5, $6)
            "#,
        )
        .bind(user_id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Self::map_unique_violation)?;

        Ok(User {
            id: user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> StudyBuddyResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StudyBuddyResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn update(&self, user: &User) -> StudyBuddyResult<User> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = $1, email = $2, password_hash = $3,
                refresh_token = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.refresh_token)
        .bind(now)
        .bind(user.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(Self::map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(StudyBuddyError::user_not_found(user.id.to_string()));
        }

        let mut updated = user.clone();
        updated.updated_at = now;
        Ok(updated)
    }
}
