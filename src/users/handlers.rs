use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    pagination::PageData,
    response::{ok, ok_empty, ResponseModel},
    state::AppState,
    users::{
        dto::{AvatarRequest, ListUsersQuery, RegisterRequest, ResetPasswordRequest, UpdateUserRequest},
        repo_types::UserInfo,
        services,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/password/reset", post(password_reset))
        .route("/users", get(list_users))
        .route(
            "/users/:username",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:username/avatar", put(update_avatar))
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ResponseModel<UserInfo>>, AppError> {
    let user = services::register(&state.db, payload).await?;
    Ok(ok(user))
}

#[instrument(skip_all)]
pub async fn password_reset(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ResponseModel<serde_json::Value>>, AppError> {
    services::pwd_reset(&state.db, payload).await?;
    Ok(ok_empty())
}

#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<ResponseModel<UserInfo>>, AppError> {
    let user = services::get_userinfo(&state.db, &username).await?;
    Ok(ok(user))
}

#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ResponseModel<serde_json::Value>>, AppError> {
    services::update(&state.db, &current, &username, payload).await?;
    Ok(ok_empty())
}

#[instrument(skip_all)]
pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(username): Path<String>,
    Json(payload): Json<AvatarRequest>,
) -> Result<Json<ResponseModel<serde_json::Value>>, AppError> {
    services::update_avatar(&state.db, &current, &username, payload).await?;
    Ok(ok_empty())
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ResponseModel<PageData<UserInfo>>>, AppError> {
    let page = services::list_users(&state.db, query).await?;
    Ok(ok(page))
}

#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(username): Path<String>,
) -> Result<Json<ResponseModel<serde_json::Value>>, AppError> {
    services::delete(&state.db, &current, &username).await?;
    Ok(ok_empty())
}
