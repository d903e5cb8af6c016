use sqlx::{PgExecutor, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;

const USER_COLUMNS: &str =
    "id, uuid, username, password_hash, salt, email, status, is_superuser, avatar, phone, \
     join_time, last_login_time";

impl User {
    pub async fn find_by_id(
        db: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_username(
        db: impl PgExecutor<'_>,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_email(
        db: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Inserts a new active, non-superuser account. The uniqueness
    /// constraints on username/email are the final authority; callers map a
    /// violation here to a conflict.
    pub async fn create(
        db: impl PgExecutor<'_>,
        username: &str,
        email: &str,
        password_hash: &str,
        salt: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (uuid, username, email, password_hash, salt) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(salt)
        .fetch_one(db)
        .await
    }

    pub async fn update_login_time(
        db: impl PgExecutor<'_>,
        id: i64,
        login_time: OffsetDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET last_login_time = $2 WHERE id = $1")
            .bind(id)
            .bind(login_time)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_userinfo(
        db: impl PgExecutor<'_>,
        id: i64,
        username: &str,
        email: &str,
        phone: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET username = $2, email = $3, phone = $4 WHERE id = $1")
                .bind(id)
                .bind(username)
                .bind(email)
                .bind(phone)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_avatar(
        db: impl PgExecutor<'_>,
        id: i64,
        url: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
            .bind(id)
            .bind(url)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Replaces the stored hash and salt. The salt is normally the account's
    /// original one; it only changes for pre-migration rows that had none.
    pub async fn reset_password(
        db: impl PgExecutor<'_>,
        id: i64,
        password_hash: &str,
        salt: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, salt = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(salt)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(db: impl PgExecutor<'_>, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Fuzzy-filtered page, newest joins first.
    pub async fn list(
        db: impl PgExecutor<'_>,
        username: Option<&str>,
        phone: Option<&str>,
        status: Option<i16>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"
        ));
        push_filters(&mut qb, username, phone, status);
        qb.push(" ORDER BY join_time DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
        qb.build_query_as::<User>().fetch_all(db).await
    }

    pub async fn count(
        db: impl PgExecutor<'_>,
        username: Option<&str>,
        phone: Option<&str>,
        status: Option<i16>,
    ) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users WHERE 1 = 1");
        push_filters(&mut qb, username, phone, status);
        qb.build_query_scalar::<i64>().fetch_one(db).await
    }
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    username: Option<&str>,
    phone: Option<&str>,
    status: Option<i16>,
) {
    if let Some(username) = username {
        qb.push(" AND username ILIKE ");
        qb.push_bind(format!("%{username}%"));
    }
    if let Some(phone) = phone {
        qb.push(" AND phone LIKE ");
        qb.push_bind(format!("%{phone}%"));
    }
    if let Some(status) = status {
        qb.push(" AND status = ");
        qb.push_bind(status);
    }
}
