use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    pub ttl_seconds: u64,
    pub rate_limit_times: u32,
    pub rate_limit_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub jwt: JwtConfig,
    pub captcha: CaptchaConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            ttl_seconds: std::env::var("JWT_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 60 * 24),
        };
        let captcha = CaptchaConfig {
            ttl_seconds: std::env::var("CAPTCHA_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(300),
            rate_limit_times: std::env::var("CAPTCHA_RATE_LIMIT_TIMES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5),
            rate_limit_seconds: std::env::var("CAPTCHA_RATE_LIMIT_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(10),
        };
        Ok(Self {
            database_url,
            redis_url,
            jwt,
            captcha,
        })
    }
}
