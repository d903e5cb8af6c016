use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::info;

use crate::{
    auth::{
        extractors::require_superuser,
        password::{generate_salt, hash_password, parse_salt, verify_password},
    },
    error::{conflict_on_unique, AppError},
    pagination::{PageData, PageParams},
    users::{
        dto::{AvatarRequest, ListUsersQuery, RegisterRequest, ResetPasswordRequest, UpdateUserRequest},
        repo_types::{User, UserInfo},
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^1[3-9]\d{9}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

pub(crate) fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Registration. Pre-checks, hashing and the insert run inside one
/// transaction; the unique constraints catch any concurrent duplicate that
/// slips past the pre-checks.
pub async fn register(db: &PgPool, req: RegisterRequest) -> Result<UserInfo, AppError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if req.password.is_empty() {
        return Err(AppError::Validation("Password is empty".into()));
    }
    if username.is_empty() {
        return Err(AppError::Validation("Username is empty".into()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }

    let salt = generate_salt();
    let password = req.password;
    let hashing_salt = salt.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, &hashing_salt))
        .await
        .map_err(anyhow::Error::new)??;

    let mut tx = db.begin().await?;
    if User::find_by_username(&mut *tx, &username).await?.is_some() {
        return Err(AppError::Conflict("Username already registered".into()));
    }
    if User::find_by_email(&mut *tx, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }
    let user = User::create(&mut *tx, &username, &email, &hash, salt.as_str())
        .await
        .map_err(conflict_on_unique)?;
    tx.commit().await?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user.into())
}

/// Password reset: old password must verify, confirmation must match, and the
/// account's original salt is reused for the new hash.
pub async fn pwd_reset(db: &PgPool, req: ResetPasswordRequest) -> Result<(), AppError> {
    let mut tx = db.begin().await?;
    let user = User::find_by_username(&mut *tx, &req.username)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

    let old_password = req.old_password;
    let stored_hash = user.password_hash.clone();
    let matched = tokio::task::spawn_blocking(move || verify_password(&old_password, &stored_hash))
        .await
        .map_err(anyhow::Error::new)??;
    if !matched {
        return Err(AppError::Authentication("Old password is incorrect".into()));
    }

    if req.new_password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match".into()));
    }

    let salt = match user.salt.as_deref() {
        Some(stored) => parse_salt(stored)?,
        // Pre-migration row; give it a salt now.
        None => generate_salt(),
    };
    let new_password = req.new_password;
    let hashing_salt = salt.clone();
    let hash = tokio::task::spawn_blocking(move || hash_password(&new_password, &hashing_salt))
        .await
        .map_err(anyhow::Error::new)??;

    User::reset_password(&mut *tx, user.id, &hash, salt.as_str()).await?;
    tx.commit().await?;

    info!(user_id = user.id, "password reset");
    Ok(())
}

pub async fn get_userinfo(db: &PgPool, username: &str) -> Result<UserInfo, AppError> {
    let user = User::find_by_username(db, username)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;
    Ok(user.into())
}

/// Profile update. Editing someone else's profile needs superuser; changing
/// username or email re-runs the uniqueness checks scoped to other rows.
pub async fn update(
    db: &PgPool,
    current: &User,
    username: &str,
    req: UpdateUserRequest,
) -> Result<u64, AppError> {
    let new_username = req.username.trim().to_string();
    let new_email = req.email.trim().to_lowercase();

    if new_username.is_empty() {
        return Err(AppError::Validation("Username is empty".into()));
    }
    if !is_valid_email(&new_email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if let Some(phone) = req.phone.as_deref() {
        if !is_valid_phone(phone) {
            return Err(AppError::Validation("Invalid phone number format".into()));
        }
    }

    let mut tx = db.begin().await?;
    let target = User::find_by_username(&mut *tx, username)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;
    if target.id != current.id {
        require_superuser(current)?;
    }

    if target.username != new_username
        && User::find_by_username(&mut *tx, &new_username)
            .await?
            .is_some()
    {
        return Err(AppError::Conflict("Username already registered".into()));
    }
    if target.email != new_email && User::find_by_email(&mut *tx, &new_email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let count = User::update_userinfo(
        &mut *tx,
        target.id,
        &new_username,
        &new_email,
        req.phone.as_deref(),
    )
    .await
    .map_err(conflict_on_unique)?;
    tx.commit().await?;

    info!(user_id = target.id, "user info updated");
    Ok(count)
}

pub async fn update_avatar(
    db: &PgPool,
    current: &User,
    username: &str,
    req: AvatarRequest,
) -> Result<u64, AppError> {
    if !is_valid_http_url(&req.url) {
        return Err(AppError::Validation("Avatar must be an HTTP URL".into()));
    }

    let mut tx = db.begin().await?;
    let target = User::find_by_username(&mut *tx, username)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;
    if target.id != current.id {
        require_superuser(current)?;
    }

    let count = User::update_avatar(&mut *tx, target.id, &req.url).await?;
    tx.commit().await?;
    Ok(count)
}

/// Deletion is superuser-only and removes the row outright.
pub async fn delete(db: &PgPool, current: &User, username: &str) -> Result<u64, AppError> {
    require_superuser(current)?;

    let mut tx = db.begin().await?;
    let target = User::find_by_username(&mut *tx, username)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;
    let count = User::delete(&mut *tx, target.id).await?;
    tx.commit().await?;

    info!(user_id = target.id, username, "user deleted");
    Ok(count)
}

pub async fn list_users(db: &PgPool, q: ListUsersQuery) -> Result<PageData<UserInfo>, AppError> {
    let params = PageParams::new(q.page, q.size);
    let username = q.username.as_deref();
    let phone = q.phone.as_deref();

    let total = User::count(db, username, phone, q.status).await?;
    let users = User::list(
        db,
        username,
        phone,
        q.status,
        params.limit(),
        params.offset(),
    )
    .await?;
    let items = users.into_iter().map(UserInfo::from).collect();
    Ok(PageData::new(items, total, params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@no-tld"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn phone_validation() {
        assert!(is_valid_phone("13812345678"));
        assert!(is_valid_phone("19912345678"));
        assert!(!is_valid_phone("12812345678"));
        assert!(!is_valid_phone("1381234567"));
        assert!(!is_valid_phone("138123456789"));
        assert!(!is_valid_phone("abc"));
    }

    #[test]
    fn avatar_url_validation() {
        assert!(is_valid_http_url("https://cdn.example.com/a.png"));
        assert!(is_valid_http_url("http://cdn.example.com/a.png"));
        assert!(!is_valid_http_url("ftp://cdn.example.com/a.png"));
        assert!(!is_valid_http_url("cdn.example.com/a.png"));
    }
}
