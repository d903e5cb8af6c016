use axum::extract::FromRef;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, error::AppError, state::AppState};

/// JWT payload. The subject carries the numeric user id serialized as a
/// string; there are no other custom claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: TimeDuration::seconds(cfg.ttl_seconds),
        }
    }

    pub fn sign(&self, user_id: i64) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + self.ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
        };
        let token =
            encode(&Header::default(), &claims, &self.encoding).map_err(anyhow::Error::new)?;
        debug!(user_id, "jwt signed");
        Ok(token)
    }

    /// Verifies signature and expiry, then parses the subject back into the
    /// numeric user id. Expiry is exact: no leeway window.
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::invalid_token(),
            }
        })?;
        let user_id = data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::invalid_token())?;
        debug!(user_id, "jwt verified");
        Ok(user_id)
    }
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
/// The scheme is matched case-insensitively per RFC 7235.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AppError> {
    let value = header.ok_or_else(AppError::invalid_token)?;
    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(AppError::invalid_token)?;
    if !scheme.eq_ignore_ascii_case("Bearer") || token.is_empty() {
        return Err(AppError::invalid_token());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(ttl_seconds: i64) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: "dev-secret".into(),
            ttl_seconds,
        })
    }

    #[test]
    fn sign_and_verify_roundtrip() {
        let keys = make_keys(300);
        let token = keys.sign(42).expect("sign");
        assert_eq!(keys.verify(&token).expect("verify"), 42);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let keys = make_keys(-10);
        let token = keys.sign(7).expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[test]
    fn tampered_signature_is_invalid_not_expired() {
        let keys = make_keys(300);
        let mut token = keys.sign(7).expect("sign");
        let last = token.pop().expect("non-empty token");
        token.push(if last == 'A' { 'B' } else { 'A' });
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::TokenInvalid(_)));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let keys = make_keys(300);
        let other = JwtKeys::new(&JwtConfig {
            secret: "other-secret".into(),
            ttl_seconds: 300,
        });
        let token = keys.sign(7).expect("sign");
        assert!(matches!(
            other.verify(&token).unwrap_err(),
            AppError::TokenInvalid(_)
        ));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let keys = make_keys(300);
        assert!(matches!(
            keys.verify("not.a.jwt").unwrap_err(),
            AppError::TokenInvalid(_)
        ));
    }

    #[test]
    fn non_numeric_subject_is_invalid() {
        let keys = make_keys(300);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: "alice".into(),
            iat: now,
            exp: now + 300,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(matches!(
            keys.verify(&token).unwrap_err(),
            AppError::TokenInvalid(_)
        ));
    }

    #[test]
    fn extract_bearer_handles_schemes() {
        assert_eq!(extract_bearer(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(Some("bearer abc")).unwrap(), "abc");
        assert_eq!(extract_bearer(Some("BEARER abc")).unwrap(), "abc");
        assert!(extract_bearer(None).is_err());
        assert!(extract_bearer(Some("Basic abc")).is_err());
        assert!(extract_bearer(Some("Bearer")).is_err());
        assert!(extract_bearer(Some("Bearer ")).is_err());
    }
}
