use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A row of the `users` table.
///
/// Deliberately not `Serialize`: the credential column must never reach a response.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Validated field set handed to the gateway on signup.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}
