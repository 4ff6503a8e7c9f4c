use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use studybuddy_core::StudyBuddyError;
use studybuddy_domain::entities::{NewUser, User};
use studybuddy_domain::ports::mailer::EmailMessage;

use crate::{
    auth::AuthenticatedUser,
    error::{ApiError, ApiResult},
    response::{success, ApiResponse},
    routes::AppState,
    validation::{
        LoginRequest, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, SendOtpRequest,
        UpdateProfileRequest,
    },
};

/// 对外的用户视图，不含密码散列
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserView,
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserView,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// 用户注册
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    let user = state
        .user_repo
        .create(&NewUser {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    let access_token = state.jwt.generate_access_token(user.id)?;
    info!("用户注册成功: {}", user.email);

    Ok((
        StatusCode::CREATED,
        success(RegisterResponse {
            user: UserView::from(&user),
            access_token,
            expires_in: state.jwt.access_token_expires_in(),
        }),
    ))
}

/// 用户登录，签发访问令牌和刷新令牌
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    // 未知邮箱与错误密码返回同一消息，避免账号枚举
    let mut user = state
        .user_repo
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let password_ok = bcrypt::verify(&request.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("密码校验失败: {e}")))?;
    if !password_ok {
        warn!("登录失败: {}", request.email);
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let access_token = state.jwt.generate_access_token(user.id)?;
    let refresh_token = state.jwt.generate_refresh_token(user.id)?;

    user.refresh_token = Some(refresh_token.clone());
    let user = state.user_repo.update(&user).await?;

    info!("用户登录成功: {}", user.email);

    Ok(success(LoginResponse {
        user: UserView::from(&user),
        access_token,
        refresh_token,
        expires_in: state.jwt.access_token_expires_in(),
    }))
}

/// 当前用户信息
pub async fn me(auth: AuthenticatedUser) -> ApiResult<impl axum::response::IntoResponse> {
    Ok(success(UserView::from(&auth.user)))
}

/// 更新个人资料，所有字段可选
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    let mut user = auth.user;
    if let Some(username) = request.username {
        user.username = username;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(password) = request.password {
        user.password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
            .map_err(|e| ApiError::Internal(format!("密码散列失败: {e}")))?;
    }

    let user = state.user_repo.update(&user).await?;
    Ok(success(UserView::from(&user)))
}

/// 发送密码重置验证码
pub async fn send_otp(
    State(state): State<AppState>,
    Json(request): Json<SendOtpRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    let user = state
        .user_repo
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| StudyBuddyError::user_not_found(request.email.clone()))?;

    // 顺带清理已过期的验证码
    let now = Utc::now();
    state.otp_repo.purge_expired(now).await?;

    let code = format!("{:06}", rand::rng().random_range(0..1_000_000u32));
    let expires_at = now + Duration::minutes(state.otp_ttl_minutes);

    state.otp_repo.create(&user.email, &code, expires_at).await?;

    state
        .mailer
        .send(&EmailMessage {
            to: user.email.clone(),
            subject: "StudyBuddy password reset code".to_string(),
            body: format!("Your OTP code is {code}. It expires in {} minutes.", state.otp_ttl_minutes),
        })
        .await?;

    info!("重置验证码已发送: {}", user.email);
    Ok(ApiResponse::success_empty_with_message("OTP sent to email."))
}

/// 验证验证码并重置密码
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    let now = Utc::now();
    let otp = state
        .otp_repo
        .find_valid(&request.email, &request.otp, now)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired OTP".to_string()))?;

    let mut user = state
        .user_repo
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| StudyBuddyError::user_not_found(request.email.clone()))?;

    user.password_hash = bcrypt::hash(&request.new_password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(format!("密码散列失败: {e}")))?;
    // 重置后旧的刷新令牌一并作废
    user.refresh_token = None;
    state.user_repo.update(&user).await?;

    // 验证码一次性消费
    state.otp_repo.delete(otp.id).await?;

    info!("密码重置成功: {}", user.email);
    Ok(ApiResponse::success_empty_with_message(
        "Password reset successful",
    ))
}

/// 用刷新令牌换取短效访问令牌
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    let user_id = state
        .jwt
        .validate_refresh_token(&request.refresh_token)
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    let user = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

    // 必须与用户记录上持有的刷新令牌一致，登出/重置后即失效
    if user.refresh_token.as_deref() != Some(request.refresh_token.as_str()) {
        return Err(ApiError::Forbidden);
    }

    let access_token = state.jwt.generate_refreshed_access_token(user.id)?;
    Ok(success(RefreshResponse { access_token }))
}
