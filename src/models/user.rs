use serde::{Deserialize, Serialize};

/// User record stored in redb
/// Uses Unix timestamp for compact storage with bincode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    /// OAuth subject identifier, set once the account has signed in with Google
    pub google_id: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    /// When the user was created (Unix timestamp)
    pub created_at: i64,
}

/// User model for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl User {
    pub fn from_record(id: &str, record: &UserRecord) -> Self {
        Self {
            id: id.to_string(),
            email: record.email.clone(),
            name: record.name.clone(),
            picture: record.picture.clone(),
        }
    }
}

/// Canonical form of an email used as the uniqueness key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
