use crate::database::DbError;
use crate::database::album::album::{
    Album, AlbumAssetCount, AlbumAssetPair, AlbumUpdate, ContributorCount, NewAlbum,
};
use crate::database::album::album_user::{AlbumUser, AlbumUserGrant, AlbumUserRole};
use async_trait::async_trait;
use std::collections::HashSet;

/// Persistence of albums, their member assets and their collaborator entries.
///
/// Implementations own their consistency: adds are deduplicated on
/// `(album, asset)` and deleting an album cascades to its membership,
/// collaborator and share-link rows.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    //================================================================================
    // Core Album Management
    //================================================================================

    async fn get_by_id(&self, album_id: &str, with_assets: bool)
    -> Result<Option<Album>, DbError>;

    /// Creates an album owned by `album.owner_id` with initial members and collaborators.
    async fn create(
        &self,
        album: NewAlbum,
        asset_ids: &[String],
        album_users: &[AlbumUserGrant],
    ) -> Result<Album, DbError>;

    async fn update(&self, album_id: &str, update: AlbumUpdate) -> Result<Album, DbError>;

    async fn delete(&self, album_id: &str) -> Result<(), DbError>;

    /// Albums visible to `user_id` (owned or shared with them) containing `asset_id`.
    async fn get_by_asset_id(&self, user_id: &str, asset_id: &str) -> Result<Vec<Album>, DbError>;

    async fn get_owned(&self, owner_id: &str) -> Result<Vec<Album>, DbError>;

    /// Owned albums with collaborators or share links, plus albums shared with the user.
    async fn get_shared(&self, user_id: &str) -> Result<Vec<Album>, DbError>;

    /// Owned albums without collaborators and without share links.
    async fn get_not_shared(&self, owner_id: &str) -> Result<Vec<Album>, DbError>;

    async fn get_metadata_for_ids(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<AlbumAssetCount>, DbError>;

    async fn get_contributor_counts(&self, album_id: &str)
    -> Result<Vec<ContributorCount>, DbError>;

    //================================================================================
    // Album Asset Management
    //================================================================================

    /// The subset of `asset_ids` that are currently members of the album.
    async fn get_asset_ids(
        &self,
        album_id: &str,
        asset_ids: &[String],
    ) -> Result<HashSet<String>, DbError>;

    async fn add_asset_ids(&self, album_id: &str, asset_ids: &[String]) -> Result<(), DbError>;

    async fn remove_asset_ids(&self, album_id: &str, asset_ids: &[String])
    -> Result<(), DbError>;

    /// Writes all pairs in one batch.
    async fn add_asset_ids_to_albums(&self, values: &[AlbumAssetPair]) -> Result<(), DbError>;

    /// Repairs every album whose thumbnail is unset or no longer a member.
    ///
    /// Returns the number of albums that were changed.
    async fn update_thumbnails(&self) -> Result<u64, DbError>;

    //================================================================================
    // Album Collaborator Management
    //================================================================================

    async fn create_album_user(&self, album_user: &AlbumUser) -> Result<(), DbError>;

    /// Returns `false` if the user had no collaborator entry on the album.
    async fn update_album_user(
        &self,
        album_id: &str,
        user_id: &str,
        role: AlbumUserRole,
    ) -> Result<bool, DbError>;

    /// Returns `false` if the user had no collaborator entry on the album.
    async fn delete_album_user(&self, album_id: &str, user_id: &str) -> Result<bool, DbError>;
}
