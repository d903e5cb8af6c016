use axum::extract::FromRef;
use rand::Rng;
use redis::{aio::ConnectionManager, AsyncCommands};
use tracing::debug;
use uuid::Uuid;

use crate::{config::CaptchaConfig, error::AppError, state::AppState};

const CAPTCHA_KEY_PREFIX: &str = "usergate:captcha:login";
const RATE_KEY_PREFIX: &str = "usergate:captcha:rate";

// No ambiguous glyphs (0/O, 1/I/l).
const CODE_CHARSET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";
const CODE_LEN: usize = 4;

/// Redis-backed captcha challenge store. Entries are single-use: the first
/// verification attempt consumes the entry whether or not the answer matched,
/// so a correct code cannot be replayed within its TTL.
#[derive(Clone)]
pub struct CaptchaStore {
    conn: ConnectionManager,
    ttl_seconds: u64,
    rate_limit_times: u32,
    rate_limit_seconds: u64,
}

impl FromRef<AppState> for CaptchaStore {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.redis.clone(), &state.config.captcha)
    }
}

impl CaptchaStore {
    pub fn new(conn: ConnectionManager, cfg: &CaptchaConfig) -> Self {
        Self {
            conn,
            ttl_seconds: cfg.ttl_seconds,
            rate_limit_times: cfg.rate_limit_times,
            rate_limit_seconds: cfg.rate_limit_seconds,
        }
    }

    pub fn generate_code() -> String {
        let mut rng = rand::thread_rng();
        (0..CODE_LEN)
            .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
            .collect()
    }

    /// Stores a fresh challenge and returns `(uuid, code)`.
    pub async fn issue(&self) -> Result<(String, String), AppError> {
        let uuid = Uuid::new_v4().to_string();
        let code = Self::generate_code();
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(
            format!("{CAPTCHA_KEY_PREFIX}:{uuid}"),
            &code,
            self.ttl_seconds,
        )
        .await?;
        debug!(%uuid, "captcha issued");
        Ok((uuid, code))
    }

    /// Checks the client answer against the stored challenge. GETDEL consumes
    /// the entry atomically before the answer is judged, so concurrent
    /// attempts on one uuid can never both observe the code.
    pub async fn verify(&self, uuid: &str, answer: &str) -> Result<(), AppError> {
        let key = format!("{CAPTCHA_KEY_PREFIX}:{uuid}");
        let mut conn = self.conn.clone();
        let stored: Option<String> = conn.get_del(&key).await?;
        let stored =
            stored.ok_or_else(|| AppError::Captcha("Captcha expired or not found".into()))?;
        if !codes_match(&stored, answer) {
            return Err(AppError::Captcha("Incorrect captcha".into()));
        }
        Ok(())
    }

    /// Fixed-window rate limit on captcha issuance, keyed per client.
    pub async fn check_rate_limit(&self, client: &str) -> Result<(), AppError> {
        let key = format!("{RATE_KEY_PREFIX}:{client}");
        let mut conn = self.conn.clone();
        let count: u32 = conn.incr(&key, 1).await?;
        if count == 1 {
            conn.expire::<_, ()>(&key, self.rate_limit_seconds as i64)
                .await?;
        }
        if count > self.rate_limit_times {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}

fn codes_match(stored: &str, answer: &str) -> bool {
    stored.eq_ignore_ascii_case(answer.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_uses_charset() {
        let code = CaptchaStore::generate_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
    }

    #[test]
    fn comparison_is_case_insensitive_and_trims() {
        assert!(codes_match("AB3D", "ab3d"));
        assert!(codes_match("AB3D", " AB3D "));
        assert!(!codes_match("AB3D", "AB3C"));
        assert!(!codes_match("AB3D", ""));
    }
}
