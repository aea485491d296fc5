use crate::database::DbError;
use crate::database::app_user::{User, UserPreferences};
use async_trait::async_trait;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<User>, DbError>;

    /// Preferences fall back to defaults for users that never set any.
    async fn get_preferences(&self, user_id: &str) -> Result<UserPreferences, DbError>;
}
