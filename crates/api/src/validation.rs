use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use studybuddy_domain::entities::{NewTask, Priority, RepeatPolicy, Task, DEFAULT_TASK_COLOR};

/// 注册请求
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(custom(function = validate_password_strength))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// 个人资料更新请求，所有字段可选
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(custom(function = validate_password_strength))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
    #[validate(custom(function = validate_password_strength))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// 任务创建请求，缺省值与前端表单一致
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[validate(range(min = 1, message = "Estimated minutes must be positive"))]
    pub estimated_minutes: Option<i32>,
    #[serde(default)]
    pub use_pomodoro: bool,
    pub description: Option<String>,
    #[serde(default)]
    pub reminder: bool,
    pub color: Option<String>,
    #[serde(default)]
    #[validate(custom(function = validate_repeat_policy))]
    pub repeat: RepeatPolicy,
}

impl CreateTaskRequest {
    /// 落库数据，所有者强制为已认证用户
    pub fn into_new_task(self, owner: Uuid) -> NewTask {
        NewTask {
            title: self.title,
            category: self.category,
            due_date: self.due_date,
            priority: self.priority,
            estimated_minutes: self.estimated_minutes,
            use_pomodoro: self.use_pomodoro,
            description: self.description,
            reminder: self.reminder,
            completed: false,
            color: self.color.unwrap_or_else(|| DEFAULT_TASK_COLOR.to_string()),
            owner,
            repeat: self.repeat,
        }
    }
}

/// 任务部分更新请求，只覆盖提交的字段
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub category: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    #[validate(range(min = 1, message = "Estimated minutes must be positive"))]
    pub estimated_minutes: Option<i32>,
    pub use_pomodoro: Option<bool>,
    pub description: Option<String>,
    pub reminder: Option<bool>,
    pub completed: Option<bool>,
    pub color: Option<String>,
    #[validate(custom(function = validate_repeat_policy))]
    pub repeat: Option<RepeatPolicy>,
}

impl UpdateTaskRequest {
    pub fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(category) = self.category {
            task.category = Some(category);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(minutes) = self.estimated_minutes {
            task.estimated_minutes = Some(minutes);
        }
        if let Some(use_pomodoro) = self.use_pomodoro {
            task.use_pomodoro = use_pomodoro;
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(reminder) = self.reminder {
            task.reminder = reminder;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(color) = self.color {
            task.color = color;
        }
        if let Some(repeat) = self.repeat {
            task.repeat = repeat;
        }
    }
}

/// 密码强度: 至少6位，含大写、小写和数字
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.len() >= 6;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(ValidationError::new("password_strength").with_message(
            "Password must be at least 6 characters with uppercase, lowercase and a digit".into(),
        ))
    }
}

/// 写入接口只接受已知的重复策略
fn validate_repeat_policy(policy: &RepeatPolicy) -> Result<(), ValidationError> {
    if matches!(policy, RepeatPolicy::Unsupported) {
        Err(ValidationError::new("repeat_policy")
            .with_message("Unsupported repeat policy".into()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength_rules() {
        assert!(validate_password_strength("Abc123").is_ok());
        assert!(validate_password_strength("abc123").is_err());
        assert!(validate_password_strength("ABC123").is_err());
        assert!(validate_password_strength("Abcdef").is_err());
        assert!(validate_password_strength("Ab1").is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "Secret1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "Secret1".to_string(),
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_unknown_repeat_policy_is_rejected() {
        let request: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "读论文",
            "repeat": "yearly",
        }))
        .unwrap();

        assert_eq!(request.repeat, RepeatPolicy::Unsupported);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateTaskRequest = serde_json::from_value(serde_json::json!({
            "title": "读论文",
        }))
        .unwrap();

        let owner = Uuid::new_v4();
        let new_task = request.into_new_task(owner);
        assert_eq!(new_task.priority, Priority::Low);
        assert_eq!(new_task.repeat, RepeatPolicy::None);
        assert_eq!(new_task.color, DEFAULT_TASK_COLOR);
        assert_eq!(new_task.owner, owner);
        assert!(!new_task.completed);
    }

    #[test]
    fn test_update_request_applies_only_submitted_fields() {
        use chrono::TimeZone;

        let mut task = Task {
            id: 1,
            title: "旧标题".to_string(),
            category: Some("math".to_string()),
            due_date: None,
            priority: Priority::Low,
            estimated_minutes: None,
            use_pomodoro: false,
            description: None,
            reminder: false,
            completed: false,
            color: DEFAULT_TASK_COLOR.to_string(),
            owner: Uuid::new_v4(),
            repeat: RepeatPolicy::None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let update = UpdateTaskRequest {
            title: Some("新标题".to_string()),
            priority: Some(Priority::High),
            due_date: Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()),
            ..Default::default()
        };
        update.apply(&mut task);

        assert_eq!(task.title, "新标题");
        assert_eq!(task.priority, Priority::High);
        assert!(task.due_date.is_some());
        assert_eq!(task.category.as_deref(), Some("math"));
        assert!(!task.completed);
    }
}
