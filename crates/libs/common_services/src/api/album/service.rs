use crate::access::{AccessFilter, AccessRepository, Permission, Principal};
use crate::api::album::bulk;
use crate::api::album::error::AlbumError;
use crate::api::album::interfaces::{
    AddUsersRequest, AlbumAddOutcome, AlbumResponse, AlbumStatisticsResponse, AlbumUserResponse,
    AlbumsAddAssetsRequest, AlbumsAddAssetsResponse, BulkIdErrorReason, BulkIdResponse,
    CreateAlbumRequest, GetAlbumsParams, UpdateAlbumRequest,
};
use crate::api::album::sharing::SharingDelegate;
use crate::database::album::album::{Album, AlbumAssetCount, AlbumAssetPair, AlbumUpdate, NewAlbum};
use crate::database::album::album_user::AlbumUserRole;
use crate::database::{MembershipStore, UserStore};
use crate::events::{AlbumEvent, EventEmitter};
use crate::sharing::SharingAuthority;
use crate::utils::retain_allowed;
use bon::bon;
use chrono::Utc;
use futures_util::future::try_join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, instrument};

/// Public album operations. Every call is scoped to the acting [`Principal`].
#[derive(Clone)]
pub struct AlbumService {
    albums: Arc<dyn MembershipStore>,
    users: Arc<dyn UserStore>,
    access: AccessFilter,
    sharing: SharingDelegate,
    events: Arc<dyn EventEmitter>,
}

#[bon]
impl AlbumService {
    #[builder]
    pub fn new(
        albums: Arc<dyn MembershipStore>,
        users: Arc<dyn UserStore>,
        access: Arc<dyn AccessRepository>,
        authority: Arc<dyn SharingAuthority>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        let sharing =
            SharingDelegate::new(authority, users.clone(), albums.clone(), events.clone());
        Self {
            albums,
            users,
            access: AccessFilter::new(access),
            sharing,
            events,
        }
    }
}

impl AlbumService {
    //================================================================================
    // Reads
    //================================================================================

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn get_statistics(
        &self,
        auth: &Principal,
    ) -> Result<AlbumStatisticsResponse, AlbumError> {
        let (owned, shared, not_shared) = tokio::try_join!(
            self.albums.get_owned(&auth.user_id),
            self.albums.get_shared(&auth.user_id),
            self.albums.get_not_shared(&auth.user_id),
        )?;
        Ok(AlbumStatisticsResponse {
            owned: owned.len(),
            shared: shared.len(),
            not_shared: not_shared.len(),
        })
    }

    /// Lists albums with their metadata and live roster, one roster call per album.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn get_all(
        &self,
        auth: &Principal,
        params: &GetAlbumsParams,
    ) -> Result<Vec<AlbumResponse>, AlbumError> {
        self.albums.update_thumbnails().await?;

        let albums = match (&params.asset_id, params.shared) {
            (Some(asset_id), _) => {
                self.albums
                    .get_by_asset_id(&auth.user_id, asset_id)
                    .await?
            }
            (None, Some(true)) => self.albums.get_shared(&auth.user_id).await?,
            (None, Some(false)) => self.albums.get_not_shared(&auth.user_id).await?,
            (None, None) => self.albums.get_owned(&auth.user_id).await?,
        };

        let album_ids: Vec<String> = albums.iter().map(|album| album.id.clone()).collect();
        let metadata: HashMap<String, AlbumAssetCount> = self
            .albums
            .get_metadata_for_ids(&album_ids)
            .await?
            .into_iter()
            .map(|m| (m.album_id.clone(), m))
            .collect();
        let rosters = try_join_all(
            albums
                .iter()
                .map(|album| self.sharing.list_collaborators(auth, album)),
        )
        .await?;

        Ok(albums
            .into_iter()
            .zip(rosters)
            .map(|(album, roster)| {
                let album_metadata = metadata.get(&album.id);
                AlbumResponse::new(album, album_metadata, roster)
            })
            .collect())
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn get(
        &self,
        auth: &Principal,
        album_id: &str,
        without_assets: bool,
    ) -> Result<AlbumResponse, AlbumError> {
        self.access
            .require(auth, Permission::AlbumRead, &[album_id.to_owned()])
            .await?;
        self.albums.update_thumbnails().await?;
        let album = self.find_or_fail(album_id, !without_assets).await?;

        let album_ids = [album.id.clone()];
        let (metadata, roster) = tokio::try_join!(
            async { Ok::<_, AlbumError>(self.albums.get_metadata_for_ids(&album_ids).await?) },
            self.sharing.list_collaborators(auth, &album),
        )?;

        let mut response = AlbumResponse::new(album, metadata.first(), roster);
        if response.shared {
            response.contributor_counts =
                Some(self.albums.get_contributor_counts(album_id).await?);
        }
        Ok(response)
    }

    //================================================================================
    // Album lifecycle
    //================================================================================

    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn create(
        &self,
        auth: &Principal,
        request: CreateAlbumRequest,
    ) -> Result<AlbumResponse, AlbumError> {
        let mut requested = HashSet::with_capacity(request.album_users.len());
        for grant in &request.album_users {
            if !requested.insert(grant.user_id.as_str()) {
                return Err(AlbumError::Conflict("User already added".to_owned()));
            }
            if self.users.get(&grant.user_id).await?.is_none() {
                return Err(AlbumError::NotFound("User not found".to_owned()));
            }
            if grant.user_id == auth.user_id {
                return Err(AlbumError::Validation(
                    "Cannot share album with owner".to_owned(),
                ));
            }
        }

        let allowed = self
            .access
            .filter(auth, Permission::AssetShare, &request.asset_ids)
            .await?;
        let asset_ids = retain_allowed(&request.asset_ids, &allowed);
        let preferences = self.users.get_preferences(&auth.user_id).await?;

        let album = self
            .albums
            .create(
                NewAlbum {
                    owner_id: auth.user_id.clone(),
                    album_name: request.album_name,
                    description: request.description.unwrap_or_default(),
                    album_thumbnail_asset_id: asset_ids.first().cloned(),
                    order: preferences.album_default_order,
                },
                &asset_ids,
                &[],
            )
            .await?;
        info!("Created album {} with {} assets", album.id, asset_ids.len());

        // Collaborators go through the sharing authority like any later invite.
        self.sharing
            .invite_users(&album, &request.album_users)
            .await
            .into_result()?;

        let album = self.find_or_fail(&album.id, true).await?;
        let roster = self.local_roster(&album).await?;
        Ok(AlbumResponse::new(album, None, roster))
    }

    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn update(
        &self,
        auth: &Principal,
        album_id: &str,
        request: UpdateAlbumRequest,
    ) -> Result<AlbumResponse, AlbumError> {
        self.access
            .require(auth, Permission::AlbumUpdate, &[album_id.to_owned()])
            .await?;
        self.find_or_fail(album_id, false).await?;

        if let Some(thumbnail_id) = &request.album_thumbnail_asset_id {
            let members = self
                .albums
                .get_asset_ids(album_id, std::slice::from_ref(thumbnail_id))
                .await?;
            if members.is_empty() {
                return Err(AlbumError::Validation("Invalid album thumbnail".to_owned()));
            }
        }

        let album = self
            .albums
            .update(
                album_id,
                AlbumUpdate {
                    album_name: request.album_name,
                    description: request.description,
                    album_thumbnail_asset_id: request.album_thumbnail_asset_id,
                    is_activity_enabled: request.is_activity_enabled,
                    order: request.order,
                    updated_at: None,
                },
            )
            .await?;
        let roster = self.local_roster(&album).await?;
        Ok(AlbumResponse::new(album, None, roster))
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn delete(&self, auth: &Principal, album_id: &str) -> Result<(), AlbumError> {
        self.access
            .require(auth, Permission::AlbumDelete, &[album_id.to_owned()])
            .await?;
        self.albums.delete(album_id).await?;
        info!("Deleted album {album_id}");
        Ok(())
    }

    //================================================================================
    // Album assets
    //================================================================================

    /// Adds assets to an album the principal originally owns.
    #[instrument(skip(self, auth, asset_ids), fields(user_id = %auth.user_id))]
    pub async fn add_assets(
        &self,
        auth: &Principal,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<Vec<BulkIdResponse>, AlbumError> {
        let album = self.find_or_fail(album_id, false).await?;
        let target = [album.id.clone()];
        self.access
            .require(auth, Permission::AlbumAssetCreate, &target)
            .await?;
        self.sharing.check_original_ownership(auth, &target).await?;

        let results =
            bulk::add_assets(self.albums.as_ref(), &self.access, auth, album_id, asset_ids).await?;

        if let Some(first_added) = results.iter().find(|r| r.success) {
            self.touch(&album, &first_added.id).await?;
            self.notify_update(&album, &auth.user_id);
        }
        Ok(results)
    }

    /// Adds the same assets to several albums with one membership write.
    ///
    /// Fails as a whole if any permitted album is not originally owned by the
    /// principal, before anything is written.
    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn add_assets_to_albums(
        &self,
        auth: &Principal,
        request: &AlbumsAddAssetsRequest,
    ) -> Result<AlbumsAddAssetsResponse, AlbumError> {
        let no_permission = AlbumsAddAssetsResponse {
            success: false,
            error: Some(BulkIdErrorReason::NoPermission),
            albums: Vec::new(),
        };

        let allowed_albums = self
            .access
            .filter(auth, Permission::AlbumAssetCreate, &request.album_ids)
            .await?;
        let album_ids = retain_allowed(&request.album_ids, &allowed_albums);
        self.sharing
            .check_original_ownership(auth, &album_ids)
            .await?;
        if album_ids.is_empty() {
            return Ok(no_permission);
        }

        let allowed_assets = self
            .access
            .filter(auth, Permission::AssetShare, &request.asset_ids)
            .await?;
        let asset_ids = retain_allowed(&request.asset_ids, &allowed_assets);
        if asset_ids.is_empty() {
            return Ok(no_permission);
        }

        let mut outcomes = Vec::with_capacity(album_ids.len());
        let mut pairs = Vec::new();
        for album_id in &album_ids {
            let existing = self.albums.get_asset_ids(album_id, &asset_ids).await?;
            let added: Vec<String> = asset_ids
                .iter()
                .filter(|id| !existing.contains(*id))
                .cloned()
                .collect();
            let error = added.is_empty().then_some(BulkIdErrorReason::Duplicate);
            pairs.extend(added.iter().map(|asset_id| AlbumAssetPair {
                album_id: album_id.clone(),
                asset_id: asset_id.clone(),
            }));
            outcomes.push(AlbumAddOutcome {
                album_id: album_id.clone(),
                added,
                error,
            });
        }

        if pairs.is_empty() {
            let error = outcomes
                .iter()
                .rev()
                .find_map(|outcome| outcome.error)
                .unwrap_or(BulkIdErrorReason::Duplicate);
            return Ok(AlbumsAddAssetsResponse {
                success: false,
                error: Some(error),
                albums: outcomes,
            });
        }

        self.albums.add_asset_ids_to_albums(&pairs).await?;
        info!(
            "Added {} memberships across {} albums",
            pairs.len(),
            outcomes.iter().filter(|o| !o.added.is_empty()).count()
        );

        for outcome in &outcomes {
            let Some(first_added) = outcome.added.first() else {
                continue;
            };
            let album = self.find_or_fail(&outcome.album_id, false).await?;
            self.touch(&album, first_added).await?;
            self.notify_update(&album, &auth.user_id);
        }

        Ok(AlbumsAddAssetsResponse {
            success: true,
            error: None,
            albums: outcomes,
        })
    }

    #[instrument(skip(self, auth, asset_ids), fields(user_id = %auth.user_id))]
    pub async fn remove_assets(
        &self,
        auth: &Principal,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<Vec<BulkIdResponse>, AlbumError> {
        self.access
            .require(auth, Permission::AlbumAssetDelete, &[album_id.to_owned()])
            .await?;
        let album = self.find_or_fail(album_id, false).await?;

        let results = bulk::remove_assets(
            self.albums.as_ref(),
            &self.access,
            auth,
            album_id,
            asset_ids,
            Permission::AlbumDelete,
        )
        .await?;

        let thumbnail_removed = album
            .album_thumbnail_asset_id
            .as_ref()
            .is_some_and(|thumb| results.iter().any(|r| r.success && &r.id == thumb));
        if thumbnail_removed {
            let repaired = self.albums.update_thumbnails().await?;
            info!("Thumbnail of album {album_id} was removed, repaired {repaired} albums");
        }
        Ok(results)
    }

    //================================================================================
    // Album users
    //================================================================================

    #[instrument(skip(self, auth, request), fields(user_id = %auth.user_id))]
    pub async fn add_users(
        &self,
        auth: &Principal,
        album_id: &str,
        request: &AddUsersRequest,
    ) -> Result<AlbumResponse, AlbumError> {
        self.access
            .require(auth, Permission::AlbumShare, &[album_id.to_owned()])
            .await?;
        let album = self.find_or_fail(album_id, false).await?;

        self.sharing
            .invite_users(&album, &request.album_users)
            .await
            .into_result()?;

        let album = self.find_or_fail(album_id, false).await?;
        let roster = self.local_roster(&album).await?;
        Ok(AlbumResponse::new(album, None, roster))
    }

    /// Removes a collaborator. `"me"` stands for the principal, who may always leave.
    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn remove_user(
        &self,
        auth: &Principal,
        album_id: &str,
        user_id: &str,
    ) -> Result<(), AlbumError> {
        let user_id = auth.resolve_user_id(user_id);
        let album = self.find_or_fail(album_id, false).await?;

        if album.owner_id == user_id {
            return Err(AlbumError::Validation(
                "Cannot remove album owner".to_owned(),
            ));
        }
        if auth.user_id != user_id {
            self.access
                .require(auth, Permission::AlbumShare, &[album_id.to_owned()])
                .await?;
        }

        self.sharing.remove_user(&album, &user_id).await
    }

    #[instrument(skip(self, auth), fields(user_id = %auth.user_id))]
    pub async fn update_user(
        &self,
        auth: &Principal,
        album_id: &str,
        user_id: &str,
        role: AlbumUserRole,
    ) -> Result<(), AlbumError> {
        self.access
            .require(auth, Permission::AlbumShare, &[album_id.to_owned()])
            .await?;
        if self
            .albums
            .update_album_user(album_id, user_id, role)
            .await?
        {
            info!("Changed role of {user_id} on album {album_id} to {role}");
            Ok(())
        } else {
            Err(AlbumError::NotFound("Album not shared with user".to_owned()))
        }
    }

    //================================================================================
    // Helpers
    //================================================================================

    async fn find_or_fail(&self, album_id: &str, with_assets: bool) -> Result<Album, AlbumError> {
        self.albums
            .get_by_id(album_id, with_assets)
            .await?
            .ok_or_else(|| AlbumError::NotFound("Album not found".to_owned()))
    }

    /// Bumps `updated_at` and fills an empty thumbnail with `first_added`.
    async fn touch(&self, album: &Album, first_added: &str) -> Result<(), AlbumError> {
        let thumbnail = album
            .album_thumbnail_asset_id
            .clone()
            .unwrap_or_else(|| first_added.to_owned());
        self.albums
            .update(
                &album.id,
                AlbumUpdate {
                    album_thumbnail_asset_id: Some(thumbnail),
                    updated_at: Some(Utc::now()),
                    ..AlbumUpdate::default()
                },
            )
            .await?;
        Ok(())
    }

    fn notify_update(&self, album: &Album, actor_id: &str) {
        for recipient_id in album.recipients_except(actor_id) {
            self.events.emit(AlbumEvent::AlbumUpdate {
                album_id: album.id.clone(),
                recipient_id,
            });
        }
    }

    /// Collaborators as stored locally, joined with their user records.
    async fn local_roster(&self, album: &Album) -> Result<Vec<AlbumUserResponse>, AlbumError> {
        let users = try_join_all(
            album
                .album_users
                .iter()
                .map(|album_user| self.users.get(&album_user.user_id)),
        )
        .await?;
        Ok(album
            .album_users
            .iter()
            .zip(users)
            .filter_map(|(album_user, user)| {
                user.map(|user| AlbumUserResponse {
                    user,
                    role: album_user.role,
                })
            })
            .collect())
    }
}
