use serde::Deserialize;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Request body for password reset.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub username: String,
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Request body for profile update.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Request body for avatar update.
#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub url: String,
}

/// Query string for the paginated user listing.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub status: Option<i16>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_fields_are_all_optional() {
        let q: ListUsersQuery = serde_json::from_str("{}").unwrap();
        assert!(q.username.is_none());
        assert!(q.page.is_none());

        let q: ListUsersQuery =
            serde_json::from_str(r#"{"username":"ali","status":1,"page":2,"size":50}"#).unwrap();
        assert_eq!(q.username.as_deref(), Some("ali"));
        assert_eq!(q.status, Some(1));
        assert_eq!(q.page, Some(2));
    }
}
