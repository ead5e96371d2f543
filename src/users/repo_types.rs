use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub phone_number: String,
    pub balance: f64,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash, not exposed in JSON
    pub session: Option<String>,
}

/// Public projection used by the directory endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub phone_number: String,
    pub balance: f64,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            surname: u.surname,
            phone_number: u.phone_number,
            balance: u.balance,
        }
    }
}

/// Row to insert at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub phone_number: String,
    pub balance: f64,
    pub password_hash: String,
    pub session: String,
}

/// Partial profile update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone_number: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.surname.is_none() && self.phone_number.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 7,
            name: "Ann".into(),
            surname: "Li".into(),
            phone_number: "+1000".into(),
            balance: 0.0,
            password_hash: "$2b$04$secret".into(),
            session: Some("tok".into()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("secret"));
        assert!(json.contains("\"session\":\"tok\""));
    }
}
