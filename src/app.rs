use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};

use studybuddy_api::routes::{create_routes, AppState};
use studybuddy_core::config::AppConfig;
use studybuddy_cron::{RecurrenceJob, TaskRegenerator};
use studybuddy_infrastructure::{
    connect, LogMailer, SqliteOtpRepository, SqliteTaskRepository, SqliteUserRepository,
};

/// 主应用程序
pub struct Application {
    config: AppConfig,
    state: AppState,
}

impl Application {
    /// 创建新的应用实例
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!("初始化应用程序");

        let pool = connect(&config.database)
            .await
            .with_context(|| format!("连接数据库失败: {}", config.database.url))?;
        info!("数据库连接成功");

        let state = AppState::new(
            &config,
            Arc::new(SqliteTaskRepository::new(pool.clone())),
            Arc::new(SqliteUserRepository::new(pool.clone())),
            Arc::new(SqliteOtpRepository::new(pool)),
            Arc::new(LogMailer::new(config.mail.from_address.clone())),
        );

        Ok(Self { config, state })
    }

    /// 运行应用程序直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        // 启动重复任务再生作业（如果启用）
        let job_handle = if self.config.recurrence.enabled {
            let regenerator = TaskRegenerator::new(self.state.task_repo.clone());
            let job = RecurrenceJob::new(
                regenerator,
                &self.config.recurrence.schedule,
                Duration::from_secs(self.config.recurrence.poll_interval_seconds),
            )
            .with_context(|| {
                format!("再生作业调度无效: {}", self.config.recurrence.schedule)
            })?;

            let job_shutdown_rx = shutdown_rx.resubscribe();
            Some(tokio::spawn(job.run(job_shutdown_rx)))
        } else {
            info!("重复任务再生作业已禁用");
            None
        };

        // 启动API服务器
        let app = create_routes(self.state.clone(), self.config.api.cors_enabled);
        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("绑定地址失败: {}", self.config.api.bind_address))?;

        info!("API服务器启动在 http://{}", self.config.api.bind_address);

        let server_handle = tokio::spawn(async move {
            // 限流中间件需要客户端地址
            let service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, service).await {
                error!("API服务器运行失败: {}", e);
            }
        });

        // 等待关闭信号
        let _ = shutdown_rx.recv().await;
        info!("应用程序收到关闭信号");

        server_handle.abort();
        if let Some(handle) = job_handle {
            let _ = handle.await;
        }

        info!("应用程序已停止");
        Ok(())
    }
}
