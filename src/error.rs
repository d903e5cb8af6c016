use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::response::ResponseModel;

/// Domain error taxonomy. Every failure a handler can surface is one of these
/// kinds; infrastructure failures stay `Internal` and are never downgraded to
/// a domain kind.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("Token expired")]
    TokenExpired,
    #[error("{0}")]
    TokenInvalid(String),
    #[error("{0}")]
    Captcha(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Too many requests")]
    RateLimited,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Generic credential failure. Unknown username and wrong password must
    /// produce byte-identical responses.
    pub fn invalid_credentials() -> Self {
        Self::Authentication("Invalid credentials".into())
    }

    pub fn invalid_token() -> Self {
        Self::TokenInvalid("Invalid token".into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Captcha(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) | Self::TokenExpired | Self::TokenInvalid(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Authorization(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        Self::Internal(anyhow::Error::new(e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let msg = match &self {
            Self::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ResponseModel::<serde_json::Value> {
            code: status.as_u16(),
            msg,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Insert/update error mapping: a uniqueness violation at write time means a
/// concurrent request won the race after our pre-check passed.
pub fn conflict_on_unique(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            let msg = match db.constraint() {
                Some("users_username_key") => "Username already registered",
                Some("users_email_key") => "Email already registered",
                _ => "Already registered",
            };
            return AppError::Conflict(msg.into());
        }
    }
    AppError::from(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_kinds() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::invalid_credentials().status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Authorization("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::invalid_token().status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn invalid_credentials_message_is_stable() {
        // Both login failure paths build the error through this helper, so the
        // client cannot tell a bad username from a bad password.
        let a = AppError::invalid_credentials().to_string();
        let b = AppError::invalid_credentials().to_string();
        assert_eq!(a, b);
        assert_eq!(a, "Invalid credentials");
    }

    #[test]
    fn token_errors_are_distinct_kinds() {
        let expired = AppError::TokenExpired;
        let invalid = AppError::invalid_token();
        assert_ne!(expired.to_string(), invalid.to_string());
    }
}
