use crate::database::album::album_user::AlbumUserRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedUsersRequest<'a> {
    pub album_owner_id: &'a str,
    pub album_id: &'a str,
    pub current_user_id: &'a str,
}

/// `current_user_id` is the album owner on whose behalf the share happens.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareAlbumRequest<'a> {
    pub current_user_id: &'a str,
    pub album_id: &'a str,
    pub share_with_user_id: &'a str,
    pub user_role: AlbumUserRole,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveUserRequest<'a> {
    pub current_user_id: &'a str,
    pub album_id: &'a str,
    pub delete_from_album_user_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsOwnerRequest<'a> {
    pub album_id: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub payload: T,
}

#[derive(Debug, Deserialize)]
pub struct SharedUsersPayload {
    #[serde(default)]
    pub users: Vec<RemoteAlbumUser>,
}

/// One roster entry as reported by the authority.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAlbumUser {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<AlbumUserRole>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsOwnerPayload {
    pub is_owner: bool,
}
