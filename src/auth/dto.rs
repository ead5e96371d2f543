use serde::{Deserialize, Serialize};

/// Registration input. Empty strings count as missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub surname: String,
    pub phone_number: String,
    pub password: String,
    pub balance: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

/// Body of logout, refresh and lookup-by-session calls.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionRequest {
    pub session: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewPasswordRequest {
    pub id: String,
    pub new_password: String,
    /// Only consulted in verified reset mode.
    pub session: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registered {
    pub user_id: i64,
    pub session: String,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedIn {
    pub user_id: i64,
    pub name: String,
    pub surname: String,
    pub phone_number: String,
    pub balance: f64,
    pub session: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotatedSession {
    pub session: String,
}
