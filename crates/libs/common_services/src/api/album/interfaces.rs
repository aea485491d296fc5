use crate::database::album::album::{Album, AlbumAssetCount, AssetOrder, ContributorCount};
use crate::database::album::album_user::{AlbumUserGrant, AlbumUserRole};
use crate::database::app_user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// --- Request Payloads ---

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlbumRequest {
    pub album_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub asset_ids: Vec<String>,
    #[serde(default)]
    pub album_users: Vec<AlbumUserGrant>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlbumRequest {
    pub album_name: Option<String>,
    pub description: Option<String>,
    /// Must be a current member of the album.
    pub album_thumbnail_asset_id: Option<String>,
    pub is_activity_enabled: Option<bool>,
    pub order: Option<AssetOrder>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BulkIdsRequest {
    pub ids: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsAddAssetsRequest {
    pub album_ids: Vec<String>,
    pub asset_ids: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddUsersRequest {
    pub album_users: Vec<AlbumUserGrant>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlbumUserRequest {
    pub role: AlbumUserRole,
}

// --- Query Parameters ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct GetAlbumsParams {
    /// Only albums containing this asset.
    pub asset_id: Option<String>,
    /// `true` for shared albums, `false` for albums shared with nobody.
    pub shared: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AlbumInfoParams {
    pub without_assets: Option<bool>,
}

// --- Response Payloads ---

/// Why a single id in a bulk request was not applied.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BulkIdErrorReason {
    Duplicate,
    NoPermission,
    NotFound,
    Unknown,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkIdResponse {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkIdErrorReason>,
}

impl BulkIdResponse {
    #[must_use]
    pub fn ok(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(id: &str, reason: BulkIdErrorReason) -> Self {
        Self {
            id: id.to_owned(),
            success: false,
            error: Some(reason),
        }
    }
}

/// What a multi-album add did to one album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumAddOutcome {
    pub album_id: String,
    pub added: Vec<String>,
    pub error: Option<BulkIdErrorReason>,
}

/// Aggregate result of adding assets to several albums.
///
/// Only `success` and `error` go over the wire; `albums` keeps the per-album
/// detail for callers inside the process.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumsAddAssetsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkIdErrorReason>,
    #[serde(skip)]
    pub albums: Vec<AlbumAddOutcome>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumStatisticsResponse {
    pub owned: usize,
    pub shared: usize,
    pub not_shared: usize,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumUserResponse {
    pub user: User,
    pub role: AlbumUserRole,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AlbumResponse {
    pub id: String,
    pub owner_id: String,
    pub album_name: String,
    pub description: String,
    pub album_thumbnail_asset_id: Option<String>,
    pub is_activity_enabled: bool,
    pub order: AssetOrder,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub shared: bool,
    pub has_shared_link: bool,
    pub album_users: Vec<AlbumUserResponse>,
    pub assets: Vec<String>,
    pub asset_count: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub last_modified_asset_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributor_counts: Option<Vec<ContributorCount>>,
}

impl AlbumResponse {
    /// Builds the response from an album and its live roster.
    ///
    /// `shared` is derived from the roster and share links, never from the
    /// persisted collaborator rows.
    #[must_use]
    pub fn new(
        album: Album,
        metadata: Option<&AlbumAssetCount>,
        album_users: Vec<AlbumUserResponse>,
    ) -> Self {
        let has_shared_link = !album.shared_link_ids.is_empty();
        let asset_count = metadata.map_or(album.asset_ids.len() as i64, |m| m.asset_count);
        Self {
            shared: has_shared_link || !album_users.is_empty(),
            has_shared_link,
            album_users,
            asset_count,
            start_date: metadata.and_then(|m| m.start_date),
            end_date: metadata.and_then(|m| m.end_date),
            last_modified_asset_timestamp: metadata.and_then(|m| m.last_modified_asset_timestamp),
            contributor_counts: None,
            id: album.id,
            owner_id: album.owner_id,
            album_name: album.album_name,
            description: album.description,
            album_thumbnail_asset_id: album.album_thumbnail_asset_id,
            is_activity_enabled: album.is_activity_enabled,
            order: album.order,
            created_at: album.created_at,
            updated_at: album.updated_at,
            assets: album.asset_ids,
        }
    }
}
