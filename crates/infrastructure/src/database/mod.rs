pub mod sqlite;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::debug;

use studybuddy_core::config::DatabaseConfig;
use studybuddy_core::StudyBuddyResult;

/// 创建SQLite连接池并初始化数据库
pub async fn connect(config: &DatabaseConfig) -> StudyBuddyResult<SqlitePool> {
    debug!("连接SQLite数据库: {}", config.url);

    // 启用外键约束和WAL模式
    let connect_options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .connect_with(connect_options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> StudyBuddyResult<()> {
    debug!("运行SQLite数据库迁移");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            refresh_token TEXT,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            category TEXT,
            due_date DATETIME,
            priority TEXT NOT NULL DEFAULT 'low',
            estimated_minutes INTEGER,
            use_pomodoro INTEGER NOT NULL DEFAULT 0,
            description TEXT,
            reminder INTEGER NOT NULL DEFAULT 0,
            completed INTEGER NOT NULL DEFAULT 0,
            color TEXT NOT NULL DEFAULT '#00BCD4',
            owner TEXT NOT NULL,
            repeat TEXT NOT NULL DEFAULT 'none',
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (owner) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS otp_codes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL,
            code TEXT NOT NULL,
            expires_at DATETIME NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let indexes = vec![
        "CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner)",
        "CREATE INDEX IF NOT EXISTS idx_tasks_repeat ON tasks(repeat)",
        "CREATE INDEX IF NOT EXISTS idx_tasks_occurrence ON tasks(title, owner, due_date)",
        "CREATE INDEX IF NOT EXISTS idx_otp_codes_email_code ON otp_codes(email, code)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}
