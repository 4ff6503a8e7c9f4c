use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use studybuddy_core::config::AuthConfig;
use studybuddy_domain::entities::User;

use crate::{error::ApiError, routes::AppState};

pub const BEARER_PREFIX: &str = "Bearer ";

const KIND_ACCESS: &str = "access";
const KIND_REFRESH: &str = "refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    /// 令牌种类: access 或 refresh
    pub kind: String,
}

#[derive(Debug, Clone, Copy)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
    MalformedHeader,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::InvalidToken => write!(f, "Invalid authentication token"),
            AuthError::ExpiredToken => write!(f, "Authentication token has expired"),
            AuthError::MalformedHeader => write!(f, "Malformed authorization header"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for StatusCode {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken | AuthError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::MalformedHeader => StatusCode::BAD_REQUEST,
        }
    }
}

/// 已通过认证的请求用户
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// JWT签发与校验
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_hours: i64,
    refresh_days: i64,
    refreshed_access_minutes: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_ref()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_ref()),
            access_hours: config.access_token_hours,
            refresh_days: config.refresh_token_days,
            refreshed_access_minutes: config.refreshed_access_minutes,
        }
    }

    /// 注册/登录签发的访问令牌
    pub fn generate_access_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.encode(user_id, Duration::hours(self.access_hours), KIND_ACCESS)
    }

    /// 通过刷新令牌换取的短效访问令牌
    pub fn generate_refreshed_access_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.encode(
            user_id,
            Duration::minutes(self.refreshed_access_minutes),
            KIND_ACCESS,
        )
    }

    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        self.encode(user_id, Duration::days(self.refresh_days), KIND_REFRESH)
    }

    pub fn access_token_expires_in(&self) -> i64 {
        self.access_hours * 3600
    }

    /// 校验访问令牌并返回用户ID
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, AuthError> {
        self.validate(token, KIND_ACCESS)
    }

    /// 校验刷新令牌并返回用户ID
    pub fn validate_refresh_token(&self, token: &str) -> Result<Uuid, AuthError> {
        self.validate(token, KIND_REFRESH)
    }

    fn encode(&self, user_id: Uuid, ttl: Duration, kind: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            kind: kind.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::InvalidToken)
    }

    fn validate(&self, token: &str, expected_kind: &str) -> Result<Uuid, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => AuthError::InvalidToken,
                }
            })?;

        if token_data.claims.kind != expected_kind {
            return Err(AuthError::InvalidToken);
        }

        Uuid::parse_str(&token_data.claims.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// 认证中间件：解析Bearer令牌并将用户注入请求扩展
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)?;
    let user_id = state.jwt.validate_access_token(token)?;

    let user = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user });

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Result<&str, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let value = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    value
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedHeader)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&AuthConfig {
            jwt_secret: "test-secret-test-secret".to_string(),
            access_token_hours: 168,
            refresh_token_days: 30,
            refreshed_access_minutes: 15,
        })
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let token = service.generate_access_token(user_id).unwrap();
        assert_eq!(service.validate_access_token(&token).unwrap(), user_id);
    }

    #[test]
    fn test_token_kinds_are_not_interchangeable() {
        let service = test_service();
        let user_id = Uuid::new_v4();

        let refresh = service.generate_refresh_token(user_id).unwrap();
        assert!(service.validate_access_token(&refresh).is_err());

        let access = service.generate_access_token(user_id).unwrap();
        assert!(service.validate_refresh_token(&access).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = test_service();
        assert!(service.validate_access_token("not-a-jwt").is_err());
    }
}
