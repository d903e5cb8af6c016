use serde::{Deserialize, Serialize};

use crate::users::repo_types::UserInfo;

/// Request body for login with captcha.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha: String,
    /// Captcha session id handed out together with the challenge.
    pub uuid: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserInfo,
}

/// Captcha challenge handed to the client.
#[derive(Debug, Serialize)]
pub struct CaptchaDetail {
    pub uuid: String,
    pub image_type: String,
    pub image: String,
}
