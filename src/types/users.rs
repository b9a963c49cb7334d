use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::DbUser;

/// Body of `POST /signup`.
///
/// Absent fields decode as empty strings so the service owns the
/// required-field check.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Externally visible projection of a user. Carries no credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbUser> for UserView {
    fn from(d: DbUser) -> Self {
        Self {
            id: d.id,
            name: d.name,
            email: d.email,
            created_at: d.created_at,
        }
    }
}
