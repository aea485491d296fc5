use crate::database::album::album_user::AlbumUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::fmt::Display;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq, Default,
)]
#[sqlx(type_name = "asset_order", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetOrder {
    Asc,
    #[default]
    Desc,
}

impl Display for AssetOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        };
        f.write_str(s)
    }
}

/// A single album row, without its relations.
#[derive(Debug, Clone, FromRow)]
pub struct AlbumRow {
    pub id: String,
    pub owner_id: String,
    pub album_name: String,
    pub description: String,
    pub asset_order: AssetOrder,
    pub album_thumbnail_asset_id: Option<String>,
    pub is_activity_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An album together with its members, collaborators and share links.
///
/// `asset_ids` is only populated when the album was loaded with assets.
#[derive(Debug, Clone)]
pub struct Album {
    pub id: String,
    pub owner_id: String,
    pub album_name: String,
    pub description: String,
    pub order: AssetOrder,
    pub album_thumbnail_asset_id: Option<String>,
    pub is_activity_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub asset_ids: Vec<String>,
    pub album_users: Vec<AlbumUser>,
    pub shared_link_ids: Vec<String>,
}

impl Album {
    #[must_use]
    pub fn from_row(
        row: AlbumRow,
        asset_ids: Vec<String>,
        album_users: Vec<AlbumUser>,
        shared_link_ids: Vec<String>,
    ) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            album_name: row.album_name,
            description: row.description,
            order: row.asset_order,
            album_thumbnail_asset_id: row.album_thumbnail_asset_id,
            is_activity_enabled: row.is_activity_enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
            asset_ids,
            album_users,
            shared_link_ids,
        }
    }

    #[must_use]
    pub fn has_collaborator(&self, user_id: &str) -> bool {
        self.album_users.iter().any(|u| u.user_id == user_id)
    }

    /// Everyone who should hear about a change to this album, except `actor_id`.
    #[must_use]
    pub fn recipients_except(&self, actor_id: &str) -> Vec<String> {
        self.album_users
            .iter()
            .map(|u| u.user_id.as_str())
            .chain(std::iter::once(self.owner_id.as_str()))
            .filter(|user_id| *user_id != actor_id)
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// Values for a new album row.
#[derive(Debug, Clone)]
pub struct NewAlbum {
    pub owner_id: String,
    pub album_name: String,
    pub description: String,
    pub album_thumbnail_asset_id: Option<String>,
    pub order: AssetOrder,
}

/// Partial update of an album; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct AlbumUpdate {
    pub album_name: Option<String>,
    pub description: Option<String>,
    pub album_thumbnail_asset_id: Option<String>,
    pub is_activity_enabled: Option<bool>,
    pub order: Option<AssetOrder>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Aggregate metadata of the assets in an album.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumAssetCount {
    pub album_id: String,
    pub asset_count: i64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub last_modified_asset_timestamp: Option<DateTime<Utc>>,
}

/// Number of assets in an album, per asset owner.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContributorCount {
    pub user_id: String,
    pub asset_count: i64,
}

/// One membership row to write in a batched multi-album add.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumAssetPair {
    pub album_id: String,
    pub asset_id: String,
}
