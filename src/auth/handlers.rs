use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        captcha::CaptchaStore,
        dto::{CaptchaDetail, LoginRequest, LoginResponse},
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::verify_password,
    },
    error::AppError,
    response::{ok, ok_empty, ResponseModel},
    state::AppState,
    users::repo_types::User,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/captcha", get(get_captcha))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state))]
pub async fn get_captcha(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<ResponseModel<CaptchaDetail>>, AppError> {
    let store = CaptchaStore::from_ref(&state);
    store.check_rate_limit(&addr.ip().to_string()).await?;

    let (uuid, code) = store.issue().await?;
    Ok(ok(CaptchaDetail {
        uuid,
        image_type: "text".into(),
        image: code,
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ResponseModel<LoginResponse>>, AppError> {
    let store = CaptchaStore::from_ref(&state);
    store.verify(&payload.uuid, &payload.captcha).await?;

    let user = User::find_by_username(&state.db, &payload.username)
        .await?
        .ok_or_else(AppError::invalid_credentials)?;

    let password = payload.password;
    let stored_hash = user.password_hash.clone();
    let matched = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(anyhow::Error::new)??;
    if !matched {
        warn!(username = %payload.username, "login invalid password");
        return Err(AppError::invalid_credentials());
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id)?;

    // Informational only; a failed write must not fail the login.
    if let Err(e) = User::update_login_time(&state.db, user.id, OffsetDateTime::now_utc()).await {
        warn!(error = %e, user_id = user.id, "failed to record last login time");
    }

    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(ok(LoginResponse {
        access_token,
        token_type: "Bearer".into(),
        user: user.into(),
    }))
}

/// Tokens are stateless; logout is a client-side discard. The route still
/// requires a valid token so the endpoint cannot be used to probe.
#[instrument(skip_all)]
pub async fn logout(
    CurrentUser(user): CurrentUser,
) -> Result<Json<ResponseModel<serde_json::Value>>, AppError> {
    info!(user_id = user.id, "user logged out");
    Ok(ok_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_deserializes_all_fields() {
        let payload: LoginRequest = serde_json::from_str(
            r#"{"username":"alice","password":"Secret123!","captcha":"AB3D","uuid":"u-1"}"#,
        )
        .unwrap();
        assert_eq!(payload.username, "alice");
        assert_eq!(payload.captcha, "AB3D");
        assert_eq!(payload.uuid, "u-1");
    }
}
