use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. Credentials never leave this type: the
/// public projection is [`UserInfo`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub uuid: Uuid,
    pub username: String,
    pub password_hash: String,
    /// b64 salt, generated once at registration. Null only for rows that
    /// predate the salt column.
    pub salt: Option<String>,
    pub email: String,
    /// 0 disabled, 1 active.
    pub status: i16,
    pub is_superuser: bool,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub join_time: OffsetDateTime,
    pub last_login_time: Option<OffsetDateTime>,
}

/// Public part of the user returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub status: i16,
    pub is_superuser: bool,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub join_time: OffsetDateTime,
    pub last_login_time: Option<OffsetDateTime>,
}

impl From<User> for UserInfo {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            uuid: u.uuid,
            username: u.username,
            email: u.email,
            status: u.status,
            is_superuser: u.is_superuser,
            avatar: u.avatar,
            phone: u.phone,
            join_time: u.join_time,
            last_login_time: u.last_login_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_info_exposes_no_credentials() {
        let info = UserInfo {
            id: 1,
            uuid: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            status: 1,
            is_superuser: false,
            avatar: None,
            phone: None,
            join_time: OffsetDateTime::now_utc(),
            last_login_time: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(!json.contains("password"));
        assert!(!json.contains("salt"));
    }
}
