use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub recurrence: RecurrenceConfig,
    pub mail: MailConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub bind_address: String,
    pub cors_enabled: bool,
    pub rate_limit: RateLimitConfig,
}

/// 登录和OTP接口的限流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub window_seconds: u64,
    pub max_requests: u32,
}

/// JWT认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// 注册/登录签发的访问令牌有效期（小时）
    pub access_token_hours: i64,
    /// 刷新令牌有效期（天）
    pub refresh_token_days: i64,
    /// 通过刷新令牌换取的访问令牌有效期（分钟）
    pub refreshed_access_minutes: i64,
}

/// 重复任务再生作业配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceConfig {
    pub enabled: bool,
    /// CRON表达式，默认每天午夜执行
    pub schedule: String,
    /// 触发检查间隔（秒）
    pub poll_interval_seconds: u64,
}

/// 邮件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub from_address: String,
    pub otp_ttl_minutes: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:studybuddy.db".to_string(),
                max_connections: 5,
                min_connections: 1,
                connection_timeout_seconds: 30,
            },
            api: ApiConfig {
                bind_address: "0.0.0.0:5000".to_string(),
                cors_enabled: true,
                rate_limit: RateLimitConfig {
                    enabled: true,
                    window_seconds: 900,
                    max_requests: 5,
                },
            },
            auth: AuthConfig {
                jwt_secret: "change-this-secret-in-production".to_string(),
                access_token_hours: 168,
                refresh_token_days: 30,
                refreshed_access_minutes: 15,
            },
            recurrence: RecurrenceConfig {
                enabled: true,
                schedule: "0 0 0 * * *".to_string(),
                poll_interval_seconds: 60,
            },
            mail: MailConfig {
                from_address: "StudyBuddy <no-reply@studybuddy.app>".to_string(),
                otp_ttl_minutes: 10,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: STUDYBUDDY_)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder()
            .add_source(ConfigBuilder::try_from(&Self::default())?);

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            // 默认路径，不存在时直接使用默认配置
            let default_paths = ["config/studybuddy.toml", "studybuddy.toml"];
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("STUDYBUDDY")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("解析配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the loaded configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(anyhow::anyhow!("数据库URL不能为空"));
        }
        if !self.database.url.starts_with("sqlite:") {
            return Err(anyhow::anyhow!("数据库URL必须是SQLite格式"));
        }
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("最大连接数必须大于0"));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(anyhow::anyhow!("最小连接数不能大于最大连接数"));
        }
        if self.api.bind_address.is_empty() {
            return Err(anyhow::anyhow!("API绑定地址不能为空"));
        }
        if self.auth.jwt_secret.len() < 16 {
            return Err(anyhow::anyhow!("JWT密钥长度至少为16个字符"));
        }
        if self.auth.access_token_hours <= 0
            || self.auth.refresh_token_days <= 0
            || self.auth.refreshed_access_minutes <= 0
        {
            return Err(anyhow::anyhow!("令牌有效期必须大于0"));
        }
        if self.recurrence.schedule.is_empty() {
            return Err(anyhow::anyhow!("再生作业的CRON表达式不能为空"));
        }
        if self.recurrence.poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("再生作业检查间隔必须大于0"));
        }
        if self.mail.otp_ttl_minutes <= 0 {
            return Err(anyhow::anyhow!("OTP有效期必须大于0"));
        }
        Ok(())
    }
}
