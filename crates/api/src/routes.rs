use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;

use studybuddy_core::config::AppConfig;
use studybuddy_domain::ports::mailer::Mailer;
use studybuddy_domain::repositories::{OtpRepository, TaskRepository, UserRepository};

use crate::auth::{require_auth, JwtService};
use crate::handlers::{
    auth::{login, me, refresh_token, register, reset_password, send_otp, update_profile},
    health::health_check,
    root::root_handler,
    tasks::{create_task, delete_task, get_task, list_tasks, toggle_complete, update_task},
};
use crate::middleware::{cors_layer, rate_limit, request_logging, RateLimiter};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub task_repo: Arc<dyn TaskRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub otp_repo: Arc<dyn OtpRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub jwt: Arc<JwtService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub otp_ttl_minutes: i64,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        task_repo: Arc<dyn TaskRepository>,
        user_repo: Arc<dyn UserRepository>,
        otp_repo: Arc<dyn OtpRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            task_repo,
            user_repo,
            otp_repo,
            mailer,
            jwt: Arc::new(JwtService::new(&config.auth)),
            rate_limiter: Arc::new(RateLimiter::new(&config.api.rate_limit)),
            otp_ttl_minutes: config.mail.otp_ttl_minutes,
        }
    }
}

/// 创建API路由
pub fn create_routes(state: AppState, cors_enabled: bool) -> Router {
    // 登录和发送验证码套限流
    let throttled = Router::new()
        .route("/login", post(login))
        .route("/send-otp", post(send_otp))
        .route_layer(from_fn_with_state(state.clone(), rate_limit));

    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/reset-password", post(reset_password))
        .route("/refresh-token", post(refresh_token))
        .merge(throttled);

    let protected_auth_routes = Router::new()
        .route("/me", get(me))
        .route("/update", put(update_profile))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    // 列表端点同时接受带/不带结尾斜杠的形式
    let task_collection = get(list_tasks).post(create_task);
    let task_routes = Router::new()
        .route("/api/tasks", task_collection.clone())
        .route("/api/tasks/", task_collection)
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/complete", patch(toggle_complete))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let mut router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes.merge(protected_auth_routes))
        .merge(task_routes)
        .layer(axum::middleware::from_fn(request_logging));

    if cors_enabled {
        router = router.layer(cors_layer());
    }

    router.with_state(state)
}
