use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use studybuddy_core::{StudyBuddyError, StudyBuddyResult};
use studybuddy_domain::entities::{NewTask, Priority, RepeatPolicy, Task};
use studybuddy_domain::repositories::TaskRepository;

/// SQLite implementation of TaskRepository
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &SqliteRow) -> StudyBuddyResult<Task> {
        let owner: String = row.try_get("owner")?;
        let owner = Uuid::parse_str(&owner)
            .map_err(|e| StudyBuddyError::internal(format!("Invalid UUID: {e}")))?;

        Ok(Task {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            category: row.try_get("category")?,
            due_date: row.try_get::<Option<DateTime<Utc>>, _>("due_date")?,
            priority: row.try_get::<Priority, _>("priority")?,
            estimated_minutes: row.try_get("estimated_minutes")?,
            use_pomodoro: row.try_get("use_pomodoro")?,
            description: row.try_get("description")?,
            reminder: row.try_get("reminder")?,
            completed: row.try_get("completed")?,
            color: row.try_get("color")?,
            owner,
            repeat: row.try_get::<RepeatPolicy, _>("repeat")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn create(&self, task: &NewTask) -> StudyBuddyResult<Task> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (
                title, category, due_date, priority, estimated_minutes,
                use_pomodoro, description, reminder, completed, color,
                owner, repeat, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(&task.title)
        .bind(&task.category)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.estimated_minutes)
        .bind(task.use_pomodoro)
        .bind(&task.description)
        .bind(task.reminder)
        .bind(task.completed)
        .bind(&task.color)
        .bind(task.owner.to_string())
        .bind(task.repeat)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("创建任务 {}: {}", id, task.title);

        Ok(Task {
            id,
            title: task.title.clone(),
            category: task.category.clone(),
            due_date: task.due_date,
            priority: task.priority,
            estimated_minutes: task.estimated_minutes,
            use_pomodoro: task.use_pomodoro,
            description: task.description.clone(),
            reminder: task.reminder,
            completed: task.completed,
            color: task.color.clone(),
            owner: task.owner,
            repeat: task.repeat,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: i64) -> StudyBuddyResult<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn find_by_owner(&self, owner: Uuid) -> StudyBuddyResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE owner = $1 ORDER BY due_date ASC")
            .bind(owner.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn find_repeating(&self) -> StudyBuddyResult<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE repeat != 'none'")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn exists_occurrence(
        &self,
        title: &str,
        owner: Uuid,
        due_date: DateTime<Utc>,
    ) -> StudyBuddyResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE title = $1 AND owner = $2 AND due_date = $3",
        )
        .bind(title)
        .bind(owner.to_string())
        .bind(due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn update(&self, task: &Task) -> StudyBuddyResult<Task> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE tasks SET
                title = $1, category = $2, due_date = $3, priority = $4,
                estimated_minutes = $5, use_pomodoro = $6, description = $7,
                reminder = $8, completed = $9, color = $10, repeat = $11,
                updated_at = $12
            WHERE id = $13
            "#,
        )
        .bind(&task.title)
        .bind(&task.category)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.estimated_minutes)
        .bind(task.use_pomodoro)
        .bind(&task.description)
        .bind(task.reminder)
        .bind(task.completed)
        .bind(&task.color)
        .bind(task.repeat)
        .bind(now)
        .bind(task.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StudyBuddyError::task_not_found(task.id));
        }

        let mut updated = task.clone();
        updated.updated_at = now;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> StudyBuddyResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
