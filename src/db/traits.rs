use async_trait::async_trait;

use crate::db::models::{DbUser, NewUser};
use crate::error::StoreError;

/// Persistence contract the user service is written against.
///
/// One statement per call, no retries. Errors are returned as classified by
/// [`StoreError`] and never interpreted here.
#[async_trait]
pub trait UserGateway: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<DbUser, StoreError>;

    /// All users ordered by ascending id.
    async fn list_users(&self) -> Result<Vec<DbUser>, StoreError>;
}
