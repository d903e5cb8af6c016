use crate::config::AppConfig;
use anyhow::Context;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let client =
            redis::Client::open(config.redis_url.as_str()).context("create redis client")?;
        let redis = ConnectionManager::new(client)
            .await
            .context("connect to redis")?;

        Ok(Self { db, redis, config })
    }
}
