use std::{
    collections::HashMap,
    net::IpAddr,
    sync::Mutex,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use studybuddy_core::config::RateLimitConfig;

use crate::{error::ApiError, routes::AppState};

/// 请求日志中间件
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} - {} ({:?})",
        method,
        uri,
        response.status(),
        start.elapsed()
    );

    response
}

/// CORS层，允许跨域的前端访问
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 基于客户端IP的固定窗口限流器
pub struct RateLimiter {
    enabled: bool,
    window: Duration,
    max_requests: u32,
    windows: Mutex<HashMap<IpAddr, WindowState>>,
}

struct WindowState {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            window: Duration::from_secs(config.window_seconds),
            max_requests: config.max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// 记录一次请求，返回是否放行
    pub fn check(&self, client: IpAddr) -> bool {
        if !self.enabled {
            return true;
        }

        let now = Instant::now();
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            // 锁中毒时放行而不是拒绝所有请求
            Err(poisoned) => poisoned.into_inner(),
        };

        // 顺带清理过期窗口，防止表无限增长
        windows.retain(|_, state| now.duration_since(state.started) < self.window);

        let state = windows.entry(client).or_insert(WindowState {
            started: now,
            count: 0,
        });

        if state.count >= self.max_requests {
            return false;
        }

        state.count += 1;
        true
    }
}

/// 限流中间件，套在敏感的认证端点上
///
/// 客户端地址来自`ConnectInfo`扩展，需要服务端以
/// `into_make_service_with_connect_info`启动；缺失时不限流。
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    if let Some(ip) = client {
        if !state.rate_limiter.check(ip) {
            warn!("限流触发: 客户端 {}", ip);
            return Err(ApiError::TooManyRequests);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(enabled: bool, max: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled,
            window_seconds: 900,
            max_requests: max,
        })
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = limiter(true, 5);
        let client: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..5 {
            assert!(limiter.check(client));
        }
        assert!(!limiter.check(client));
    }

    #[test]
    fn test_clients_are_tracked_independently() {
        let limiter = limiter(true, 1);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(a));
        assert!(!limiter.check(a));
        assert!(limiter.check(b));
    }

    #[test]
    fn test_disabled_limiter_always_allows() {
        let limiter = limiter(false, 1);
        let client: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..10 {
            assert!(limiter.check(client));
        }
    }
}
