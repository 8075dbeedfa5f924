//! User record owned by the authentication collaborator

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Opaque credential produced by the authentication collaborator
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
