use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

/// Actions that are checked against a set of album or asset ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    AlbumRead,
    AlbumUpdate,
    AlbumDelete,
    AlbumShare,
    AlbumAssetCreate,
    AlbumAssetDelete,
    AssetShare,
}

impl Permission {
    /// Only the album owner holds this permission, collaborators never do.
    #[must_use]
    pub const fn is_owner_only(self) -> bool {
        matches!(self, Self::AlbumUpdate | Self::AlbumDelete | Self::AlbumShare)
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AlbumRead => "album.read",
            Self::AlbumUpdate => "album.update",
            Self::AlbumDelete => "album.delete",
            Self::AlbumShare => "album.share",
            Self::AlbumAssetCreate => "albumAsset.create",
            Self::AlbumAssetDelete => "albumAsset.delete",
            Self::AssetShare => "asset.share",
        };
        f.write_str(s)
    }
}
