use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub status: String,
    pub endpoints: ApiEndpoints,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEndpoints {
    pub auth: String,
    pub tasks: String,
    pub health_check: String,
}

/// 根路径处理器 - 返回服务状态和入口
pub async fn root_handler() -> Json<SystemInfo> {
    Json(SystemInfo {
        name: "StudyBuddy API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "学习任务管理后端".to_string(),
        status: "running".to_string(),
        endpoints: ApiEndpoints {
            auth: "/api/auth".to_string(),
            tasks: "/api/tasks".to_string(),
            health_check: "/health".to_string(),
        },
        timestamp: chrono::Utc::now(),
    })
}
