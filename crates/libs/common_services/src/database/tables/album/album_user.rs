use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::fmt::Display;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, ToSchema, PartialEq, Eq, Default,
)]
#[sqlx(type_name = "album_user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AlbumUserRole {
    Editor,
    #[default]
    Viewer,
}

impl Display for AlbumUserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        };
        f.write_str(s)
    }
}

/// A collaborator entry: a non-owner user's role on an album.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumUser {
    pub album_id: String,
    pub user_id: String,
    pub role: AlbumUserRole,
}

/// A requested grant, before it is attached to an album.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AlbumUserGrant {
    pub user_id: String,
    #[serde(default = "default_grant_role")]
    pub role: AlbumUserRole,
}

// New collaborators may add photos unless told otherwise.
const fn default_grant_role() -> AlbumUserRole {
    AlbumUserRole::Editor
}
