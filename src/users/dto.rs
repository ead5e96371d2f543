use serde::{Deserialize, Serialize};

/// `?id=` lookup used by the query-style routes.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdQuery {
    pub id: String,
}

/// Partial profile update body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted_id: i64,
}
