use thiserror::Error;

/// 统一错误类型定义
#[derive(Debug, Error)]
pub enum StudyBuddyError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("任务未找到: {id}")]
    TaskNotFound { id: i64 },

    #[error("用户未找到: {0}")]
    UserNotFound(String),

    #[error("无效的CRON表达式: {expr} - {message}")]
    InvalidCron { expr: String, message: String },

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("认证失败: {0}")]
    Authentication(String),

    #[error("邮件发送失败: {0}")]
    Mail(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type StudyBuddyResult<T> = Result<T, StudyBuddyError>;

impl StudyBuddyError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::TaskNotFound { id }
    }

    pub fn user_not_found<S: Into<String>>(who: S) -> Self {
        Self::UserNotFound(who.into())
    }

    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn mail_error<S: Into<String>>(msg: S) -> Self {
        Self::Mail(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StudyBuddyError::task_not_found(42);
        assert_eq!(err.to_string(), "任务未找到: 42");

        let err = StudyBuddyError::validation_error("标题不能为空");
        assert_eq!(err.to_string(), "数据验证失败: 标题不能为空");
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            StudyBuddyError::authentication("bad token"),
            StudyBuddyError::Authentication(_)
        ));
        assert!(matches!(
            StudyBuddyError::mail_error("smtp down"),
            StudyBuddyError::Mail(_)
        ));
    }
}
