use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 学习任务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub estimated_minutes: Option<i32>,
    pub use_pomodoro: bool,
    pub description: Option<String>,
    pub reminder: bool,
    pub completed: bool,
    /// 前端主题色
    pub color: String,
    /// 任务所属用户
    pub owner: Uuid,
    pub repeat: RepeatPolicy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待持久化的任务数据，id和时间戳由存储层分配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub estimated_minutes: Option<i32>,
    pub use_pomodoro: bool,
    pub description: Option<String>,
    pub reminder: bool,
    pub completed: bool,
    pub color: String,
    pub owner: Uuid,
    pub repeat: RepeatPolicy,
}

pub const DEFAULT_TASK_COLOR: &str = "#00BCD4";

impl Task {
    /// 是否参与重复任务再生
    pub fn is_repeating(&self) -> bool {
        self.repeat.is_repeating()
    }

    /// 派生下一次出现的克隆数据
    ///
    /// 除身份、时间戳、到期日之外所有字段原样保留；完成标记重置，
    /// 新一次出现尚未完成。
    pub fn clone_for(&self, next_due: DateTime<Utc>) -> NewTask {
        NewTask {
            title: self.title.clone(),
            category: self.category.clone(),
            due_date: Some(next_due),
            priority: self.priority,
            estimated_minutes: self.estimated_minutes,
            use_pomodoro: self.use_pomodoro,
            description: self.description.clone(),
            reminder: self.reminder,
            completed: false,
            color: self.color.clone(),
            owner: self.owner,
            repeat: self.repeat,
        }
    }
}

/// 任务优先级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

impl sqlx::Type<sqlx::Sqlite> for Priority {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Priority {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("Invalid priority: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Priority {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 任务重复策略
///
/// 存储中出现已知集合之外的值时解码为`Unsupported`，再生作业对其
/// 一律跳过，不视为错误。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepeatPolicy {
    None,
    Daily,
    Weekly,
    Monthly,
    #[serde(other)]
    Unsupported,
}

impl RepeatPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatPolicy::None => "none",
            RepeatPolicy::Daily => "daily",
            RepeatPolicy::Weekly => "weekly",
            RepeatPolicy::Monthly => "monthly",
            RepeatPolicy::Unsupported => "unsupported",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "none" => RepeatPolicy::None,
            "daily" => RepeatPolicy::Daily,
            "weekly" => RepeatPolicy::Weekly,
            "monthly" => RepeatPolicy::Monthly,
            _ => RepeatPolicy::Unsupported,
        }
    }

    pub fn is_repeating(&self) -> bool {
        matches!(
            self,
            RepeatPolicy::Daily | RepeatPolicy::Weekly | RepeatPolicy::Monthly
        )
    }
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        RepeatPolicy::None
    }
}

impl sqlx::Type<sqlx::Sqlite> for RepeatPolicy {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for RepeatPolicy {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        Ok(RepeatPolicy::parse(s))
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for RepeatPolicy {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 注册用户
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// 当前有效的刷新令牌，登录时更新
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待创建的用户，密码在存储层散列
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// 密码重置验证码
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpCode {
    pub id: i64,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
