mod client;
mod endpoints;
mod error;
mod interfaces;

pub use client::*;
pub use endpoints::*;
pub use error::*;
pub use interfaces::RemoteAlbumUser;

use crate::database::album::album_user::AlbumUserRole;
use async_trait::async_trait;

/// The external authority that owns the truth about who an album is shared with.
#[async_trait]
pub trait SharingAuthority: Send + Sync {
    /// Roster of users the album is shared with.
    async fn shared_users(
        &self,
        album_id: &str,
        owner_id: &str,
        current_user_id: &str,
    ) -> Result<Vec<RemoteAlbumUser>, SharingClientError>;

    async fn share_album(
        &self,
        owner_id: &str,
        album_id: &str,
        user_id: &str,
        role: AlbumUserRole,
    ) -> Result<(), SharingClientError>;

    async fn remove_user(
        &self,
        owner_id: &str,
        album_id: &str,
        user_id: &str,
    ) -> Result<(), SharingClientError>;

    /// Whether `user_id` is the original owner of the album.
    async fn is_album_owner(&self, album_id: &str, user_id: &str)
    -> Result<bool, SharingClientError>;
}
