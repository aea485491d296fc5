use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// The slice of an asset the album core cares about.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct Asset {
    pub id: String,
    pub owner_id: String,
    pub file_created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
