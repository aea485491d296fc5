use crate::database::album::album::AssetOrder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_color: Option<String>,
    pub profile_image_path: String,
    pub profile_changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, FromRow, PartialEq, Eq)]
pub struct UserPreferences {
    pub album_default_order: AssetOrder,
}
