use crate::access::Principal;
use crate::alert;
use crate::api::album::error::AlbumError;
use crate::api::album::interfaces::AlbumUserResponse;
use crate::database::album::album::Album;
use crate::database::album::album_user::{AlbumUser, AlbumUserGrant};
use crate::database::{MembershipStore, UserStore};
use crate::events::{AlbumEvent, EventEmitter};
use crate::sharing::{SharingAuthority, SharingClientError};
use futures_util::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of a sequential loop that stops at the first hard failure.
#[derive(Debug)]
pub struct SequentialOutcome {
    pub completed: Vec<String>,
    /// The item that failed, with its error.
    pub failure: Option<(String, AlbumError)>,
    /// Items that were never attempted.
    pub pending: Vec<String>,
}

impl SequentialOutcome {
    pub fn into_result(self) -> Result<Vec<String>, AlbumError> {
        match self.failure {
            None => Ok(self.completed),
            Some((item, err)) => {
                if !self.pending.is_empty() {
                    warn!(
                        "Stopped at {item}, not attempted: {}",
                        self.pending.join(", ")
                    );
                }
                Err(err)
            }
        }
    }
}

fn remote_error(context: &str, err: SharingClientError) -> AlbumError {
    match err {
        SharingClientError::NotConfigured(_) | SharingClientError::InvalidEndpoint { .. } => {
            err.into()
        }
        other => AlbumError::RemoteServerError(format!("{context}: {}", other.detail())),
    }
}

/// Prefers the status message the authority embedded in its response body.
fn share_error(err: SharingClientError) -> AlbumError {
    match err {
        SharingClientError::Rejected {
            service_message: Some(message),
            ..
        } => AlbumError::RemoteServerError(message),
        other => remote_error("Failed to share album", other),
    }
}

/// Mirrors collaborator changes to the sharing authority before touching local state.
#[derive(Clone)]
pub struct SharingDelegate {
    authority: Arc<dyn SharingAuthority>,
    users: Arc<dyn UserStore>,
    albums: Arc<dyn MembershipStore>,
    events: Arc<dyn EventEmitter>,
}

impl SharingDelegate {
    pub fn new(
        authority: Arc<dyn SharingAuthority>,
        users: Arc<dyn UserStore>,
        albums: Arc<dyn MembershipStore>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            authority,
            users,
            albums,
            events,
        }
    }

    /// The live roster of an album, restricted to users known locally.
    #[instrument(skip(self, auth, album), fields(album_id = %album.id))]
    pub async fn list_collaborators(
        &self,
        auth: &Principal,
        album: &Album,
    ) -> Result<Vec<AlbumUserResponse>, AlbumError> {
        let roster = self
            .authority
            .shared_users(&album.id, &album.owner_id, &auth.user_id)
            .await
            .map_err(|err| remote_error("Failed to fetch shared users", err))?;

        let users = try_join_all(roster.iter().map(|entry| self.users.get(&entry.user_id))).await?;

        Ok(roster
            .into_iter()
            .zip(users)
            .filter_map(|(entry, user)| {
                let Some(user) = user else {
                    debug!("Dropping unknown user {} from roster", entry.user_id);
                    return None;
                };
                Some(AlbumUserResponse {
                    user,
                    role: entry.role.unwrap_or_default(),
                })
            })
            .collect())
    }

    /// Fails unless the authority confirms `auth` originally owns every album.
    ///
    /// Albums are checked one at a time; a failed call aborts immediately,
    /// albums that are not owned are collected and named together.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn check_original_ownership(
        &self,
        auth: &Principal,
        album_ids: &[String],
    ) -> Result<(), AlbumError> {
        let mut not_owned = Vec::new();
        for album_id in album_ids {
            let is_owner = self
                .authority
                .is_album_owner(album_id, &auth.user_id)
                .await
                .map_err(|err| {
                    remote_error(&format!("Ownership check failed for album {album_id}"), err)
                })?;
            if !is_owner {
                not_owned.push(album_id.clone());
            }
        }

        if not_owned.is_empty() {
            Ok(())
        } else {
            warn!("Not the original owner of {:?}", not_owned);
            Err(AlbumError::NotOriginalOwner(not_owned))
        }
    }

    /// Invites each grant in turn and stops at the first failure.
    ///
    /// A local collaborator row is only written after the authority accepted
    /// the invite.
    #[instrument(skip(self, album, grants), fields(album_id = %album.id))]
    pub async fn invite_users(&self, album: &Album, grants: &[AlbumUserGrant]) -> SequentialOutcome {
        let mut completed: Vec<String> = Vec::with_capacity(grants.len());
        let mut invited: HashSet<&str> = HashSet::new();

        for (index, grant) in grants.iter().enumerate() {
            if let Err(err) = self.invite_user(album, grant, &invited).await {
                return SequentialOutcome {
                    completed,
                    failure: Some((grant.user_id.clone(), err)),
                    pending: grants[index + 1..]
                        .iter()
                        .map(|g| g.user_id.clone())
                        .collect(),
                };
            }
            invited.insert(&grant.user_id);
            completed.push(grant.user_id.clone());
        }

        SequentialOutcome {
            completed,
            failure: None,
            pending: Vec::new(),
        }
    }

    async fn invite_user(
        &self,
        album: &Album,
        grant: &AlbumUserGrant,
        invited: &HashSet<&str>,
    ) -> Result<(), AlbumError> {
        let user_id = grant.user_id.as_str();
        if album.owner_id == user_id {
            return Err(AlbumError::Validation(
                "Cannot be shared with owner".to_owned(),
            ));
        }
        if album.has_collaborator(user_id) || invited.contains(user_id) {
            return Err(AlbumError::Conflict("User already added".to_owned()));
        }
        if self.users.get(user_id).await?.is_none() {
            return Err(AlbumError::NotFound("User not found".to_owned()));
        }

        self.authority
            .share_album(&album.owner_id, &album.id, user_id, grant.role)
            .await
            .map_err(share_error)?;

        if let Err(err) = self
            .albums
            .create_album_user(&AlbumUser {
                album_id: album.id.clone(),
                user_id: user_id.to_owned(),
                role: grant.role,
            })
            .await
        {
            alert!(
                "Album {} shared with {user_id} remotely but not stored locally: {err}",
                album.id
            );
            return Err(err.into());
        }
        self.events.emit(AlbumEvent::AlbumInvite {
            album_id: album.id.clone(),
            user_id: user_id.to_owned(),
        });
        info!("Shared album {} with {user_id} as {}", album.id, grant.role);
        Ok(())
    }

    /// Removes a user at the authority, then locally.
    ///
    /// A user without a local collaborator row is not an error once the
    /// authority accepted the removal.
    #[instrument(skip(self, album), fields(album_id = %album.id))]
    pub async fn remove_user(&self, album: &Album, user_id: &str) -> Result<(), AlbumError> {
        self.authority
            .remove_user(&album.owner_id, &album.id, user_id)
            .await
            .map_err(|err| remote_error("Failed to remove user from album", err))?;

        if self.albums.delete_album_user(&album.id, user_id).await? {
            info!("Removed {user_id} from album {}", album.id);
        } else {
            debug!("{user_id} had no collaborator entry on album {}", album.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::database::album::album::{AssetOrder, NewAlbum};
    use crate::database::album::album_user::AlbumUserRole;
    use crate::database::app_user::User;
    use crate::sharing::RemoteAlbumUser;
    use async_trait::async_trait;
    use chrono::Utc;
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Records calls and answers from a fixed script.
    #[derive(Default)]
    struct ScriptedAuthority {
        roster: Vec<RemoteAlbumUser>,
        owned: HashSet<String>,
        reject_share_for: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedAuthority {
        fn record(&self, call: String) {
            self.calls.lock().expect("lock").push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl SharingAuthority for ScriptedAuthority {
        async fn shared_users(
            &self,
            album_id: &str,
            _owner_id: &str,
            _current_user_id: &str,
        ) -> Result<Vec<RemoteAlbumUser>, SharingClientError> {
            self.record(format!("roster {album_id}"));
            Ok(self.roster.clone())
        }

        async fn share_album(
            &self,
            _owner_id: &str,
            _album_id: &str,
            user_id: &str,
            _role: AlbumUserRole,
        ) -> Result<(), SharingClientError> {
            self.record(format!("share {user_id}"));
            if self.reject_share_for.as_deref() == Some(user_id) {
                return Err(SharingClientError::Rejected {
                    status: StatusCode::BAD_REQUEST,
                    message: "Bad Request".to_owned(),
                    service_message: Some("User has sharing disabled".to_owned()),
                });
            }
            Ok(())
        }

        async fn remove_user(
            &self,
            _owner_id: &str,
            _album_id: &str,
            user_id: &str,
        ) -> Result<(), SharingClientError> {
            self.record(format!("remove {user_id}"));
            Ok(())
        }

        async fn is_album_owner(
            &self,
            album_id: &str,
            _user_id: &str,
        ) -> Result<bool, SharingClientError> {
            self.record(format!("is_owner {album_id}"));
            Ok(self.owned.contains(album_id))
        }
    }

    struct NoEvents;

    impl EventEmitter for NoEvents {
        fn emit(&self, _event: AlbumEvent) {}
    }

    fn user(id: &str) -> User {
        User {
            id: id.to_owned(),
            name: id.to_uppercase(),
            email: format!("{id}@example.com"),
            avatar_color: None,
            profile_image_path: String::new(),
            profile_changed_at: Utc::now(),
        }
    }

    fn grant(user_id: &str) -> AlbumUserGrant {
        AlbumUserGrant {
            user_id: user_id.to_owned(),
            role: AlbumUserRole::Editor,
        }
    }

    async fn setup(authority: ScriptedAuthority) -> (Arc<ScriptedAuthority>, SharingDelegate, Album) {
        let store = Arc::new(MemoryStore::default());
        for id in ["owner", "u2", "u3"] {
            store.insert_user(user(id)).await;
        }
        let album = store
            .create(
                NewAlbum {
                    owner_id: "owner".to_owned(),
                    album_name: "Trip".to_owned(),
                    description: String::new(),
                    album_thumbnail_asset_id: None,
                    order: AssetOrder::Desc,
                },
                &[],
                &[grant("u3")],
            )
            .await
            .expect("album");
        let authority = Arc::new(authority);
        let delegate =
            SharingDelegate::new(authority.clone(), store.clone(), store, Arc::new(NoEvents));
        (authority, delegate, album)
    }

    #[tokio::test]
    async fn test_roster_drops_unknown_users_and_defaults_role() {
        let (_, delegate, album) = setup(ScriptedAuthority {
            roster: vec![
                RemoteAlbumUser {
                    user_id: "u2".to_owned(),
                    role: None,
                },
                RemoteAlbumUser {
                    user_id: "ghost".to_owned(),
                    role: Some(AlbumUserRole::Editor),
                },
            ],
            ..ScriptedAuthority::default()
        })
        .await;

        let roster = delegate
            .list_collaborators(&Principal::new("owner"), &album)
            .await
            .expect("roster");
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].user.id, "u2");
        assert_eq!(roster[0].role, AlbumUserRole::Viewer);
    }

    #[tokio::test]
    async fn test_ownership_names_every_album_not_owned() {
        let (authority, delegate, _) = setup(ScriptedAuthority {
            owned: HashSet::from(["b".to_owned()]),
            ..ScriptedAuthority::default()
        })
        .await;

        let album_ids: Vec<String> = ["a", "b", "c"].map(String::from).to_vec();
        let err = delegate
            .check_original_ownership(&Principal::new("owner"), &album_ids)
            .await
            .expect_err("not owned");
        assert!(matches!(err, AlbumError::NotOriginalOwner(ref ids) if ids == &["a", "c"]));
        assert_eq!(authority.calls(), vec!["is_owner a", "is_owner b", "is_owner c"]);
    }

    #[tokio::test]
    async fn test_invite_conflict_precedes_remote_call() {
        let (authority, delegate, album) = setup(ScriptedAuthority::default()).await;

        let outcome = delegate
            .invite_users(&album, &[grant("u2"), grant("u3"), grant("owner")])
            .await;

        assert_eq!(outcome.completed, vec!["u2"]);
        assert_eq!(outcome.pending, vec!["owner"]);
        assert!(matches!(outcome.failure, Some((ref id, AlbumError::Conflict(_))) if id == "u3"));
        assert_eq!(authority.calls(), vec!["share u2"]);
    }

    #[tokio::test]
    async fn test_invite_surfaces_embedded_service_message() {
        let (_, delegate, album) = setup(ScriptedAuthority {
            reject_share_for: Some("u2".to_owned()),
            ..ScriptedAuthority::default()
        })
        .await;

        let err = delegate
            .invite_users(&album, &[grant("u2")])
            .await
            .into_result()
            .expect_err("rejected");
        assert!(matches!(err, AlbumError::RemoteServerError(ref m) if m == "User has sharing disabled"));
    }

    #[tokio::test]
    async fn test_invite_rejects_unknown_user_and_repeats() {
        let (authority, delegate, album) = setup(ScriptedAuthority::default()).await;

        let unknown = delegate.invite_users(&album, &[grant("nobody")]).await;
        assert!(matches!(unknown.failure, Some((_, AlbumError::NotFound(_)))));

        let repeated = delegate.invite_users(&album, &[grant("u2"), grant("u2")]).await;
        assert!(matches!(repeated.failure, Some((_, AlbumError::Conflict(_)))));
        assert_eq!(authority.calls(), vec!["share u2"]);
    }

    #[tokio::test]
    async fn test_remove_non_member_still_calls_authority() {
        let (authority, delegate, album) = setup(ScriptedAuthority::default()).await;

        delegate.remove_user(&album, "u2").await.expect("removed");
        assert_eq!(authority.calls(), vec!["remove u2"]);
    }
}
