use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

use studybuddy_core::StudyBuddyError;
use studybuddy_domain::entities::Task;

use crate::{
    auth::AuthenticatedUser,
    error::ApiResult,
    response::{success, ApiResponse},
    routes::AppState,
    validation::{CreateTaskRequest, UpdateTaskRequest},
};

/// 加载任务并校验归属，他人的任务一律表现为未找到
async fn load_owned_task(state: &AppState, id: i64, owner: uuid::Uuid) -> ApiResult<Task> {
    let task = state
        .task_repo
        .find_by_id(id)
        .await?
        .filter(|task| task.owner == owner)
        .ok_or(StudyBuddyError::TaskNotFound { id })?;

    Ok(task)
}

/// 当前用户的任务列表，按到期日升序
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> ApiResult<impl axum::response::IntoResponse> {
    let tasks = state.task_repo.find_by_owner(auth.user.id).await?;
    Ok(success(tasks))
}

/// 单个任务详情
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let task = load_owned_task(&state, id, auth.user.id).await?;
    Ok(success(task))
}

/// 创建任务，所有者强制为当前用户
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<CreateTaskRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    let task = state
        .task_repo
        .create(&request.into_new_task(auth.user.id))
        .await?;

    info!("任务创建成功: {} (用户 {})", task.id, task.owner);
    Ok((StatusCode::CREATED, success(task)))
}

/// 部分更新任务
pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTaskRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    request.validate()?;

    let mut task = load_owned_task(&state, id, auth.user.id).await?;
    request.apply(&mut task);

    let task = state.task_repo.update(&task).await?;
    Ok(success(task))
}

/// 删除任务
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<impl axum::response::IntoResponse> {
    load_owned_task(&state, id, auth.user.id).await?;
    state.task_repo.delete(id).await?;

    info!("任务已删除: {} (用户 {})", id, auth.user.id);
    Ok(ApiResponse::success_empty_with_message("Task deleted"))
}

/// 切换任务完成标记
pub async fn toggle_complete(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let mut task = load_owned_task(&state, id, auth.user.id).await?;
    task.completed = !task.completed;

    let task = state.task_repo.update(&task).await?;
    Ok(success(task))
}
