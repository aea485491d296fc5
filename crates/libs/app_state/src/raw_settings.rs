use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub logging: LoggingSettings,
    pub api: ApiSettings,
    pub secrets: SecretSettings,
    pub database: DatabaseSettings,
    /// Endpoints of the external sharing authority.
    #[serde(default)]
    pub sharing: SharingSettings,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Configuration for the API server.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub host: String,
    pub port: u32,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSettings {
    pub jwt: String,
    pub database_url: String,
}

/// Database connection and related configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub min_connection: u32,
    pub max_lifetime: u64,
    pub idle_timeout: u64,
    pub acquire_timeout: u64,
    /// Length of generated `id` to use for albums in database.
    pub album_id_length: usize,
}

/// Raw endpoint values for the sharing authority.
///
/// Every field is optional here so a partially configured file still parses;
/// the sharing client refuses to start unless all of them are present.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SharingSettings {
    /// Roster lookup: which users an album is shared with.
    pub shared_users_url: Option<String>,
    /// Invite a user to an album.
    pub share_album_url: Option<String>,
    /// Remove a user from a shared album.
    pub remove_user_url: Option<String>,
    /// Original ownership check.
    pub is_owner_url: Option<String>,
}
