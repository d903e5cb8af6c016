use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::jwt::{extract_bearer, JwtKeys},
    error::AppError,
    state::AppState,
    users::repo_types::User,
};

/// Resolved authenticated user. Resolution runs per request: the token is
/// decoded, the account is re-read from storage, and locked accounts are
/// rejected even when the token itself is still valid.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        let token = extract_bearer(header)?;

        let keys = JwtKeys::from_ref(state);
        let user_id = keys.verify(token)?;

        // A token pointing at a deleted account is indistinguishable from a
        // forged one as far as the client is concerned.
        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or_else(AppError::invalid_token)?;

        ensure_active(&user)?;

        Ok(CurrentUser(user))
    }
}

/// Locked accounts are rejected even when their token is otherwise valid.
pub fn ensure_active(user: &User) -> Result<(), AppError> {
    if user.status == 0 {
        warn!(user_id = user.id, "locked account presented a valid token");
        return Err(AppError::Authorization(
            "User has been locked, please contact the system administrator".into(),
        ));
    }
    Ok(())
}

/// Gate for privileged operations.
pub fn require_superuser(user: &User) -> Result<(), AppError> {
    if !user.is_superuser {
        return Err(AppError::Authorization(
            "Superuser privilege required".into(),
        ));
    }
    Ok(())
}
