use crate::access::{Permission, Principal};
use crate::api::album::error::AlbumError;
use crate::database::DbError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Answers which of a set of ids a user may act on with a given permission.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn check_access(
        &self,
        user_id: &str,
        permission: Permission,
        ids: &HashSet<String>,
    ) -> Result<HashSet<String>, DbError>;
}

/// Narrows candidate ids to the ones a principal is allowed to touch.
///
/// `filter` silently drops denied ids and is meant for bulk endpoints.
/// `require` is all-or-nothing and is meant for single-resource mutations.
#[derive(Clone)]
pub struct AccessFilter {
    repository: Arc<dyn AccessRepository>,
}

impl AccessFilter {
    pub fn new(repository: Arc<dyn AccessRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn filter(
        &self,
        auth: &Principal,
        permission: Permission,
        ids: &[String],
    ) -> Result<HashSet<String>, AlbumError> {
        let candidates: HashSet<String> = ids.iter().cloned().collect();
        if candidates.is_empty() {
            return Ok(HashSet::new());
        }

        let allowed = self
            .repository
            .check_access(&auth.user_id, permission, &candidates)
            .await?;

        // Never hand back ids that were not asked about.
        let allowed: HashSet<String> = allowed.intersection(&candidates).cloned().collect();
        debug!(
            "{permission}: {} of {} ids allowed",
            allowed.len(),
            candidates.len()
        );
        Ok(allowed)
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn require(
        &self,
        auth: &Principal,
        permission: Permission,
        ids: &[String],
    ) -> Result<(), AlbumError> {
        let allowed = self.filter(auth, permission, ids).await?;
        if ids.iter().all(|id| allowed.contains(id)) {
            Ok(())
        } else {
            Err(AlbumError::Forbidden(format!("Not found or no {permission} access")))
        }
    }
}
