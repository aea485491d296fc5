use crate::{ApiSettings, DatabaseSettings, LoggingSettings, RawSettings, SecretSettings, SharingSettings};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub logging: LoggingSettings,
    pub api: ApiSettings,
    pub secrets: SecretSettings,
    pub database: DatabaseSettings,
    pub sharing: SharingSettings,
}

impl From<RawSettings> for AppSettings {
    fn from(raw: RawSettings) -> Self {
        let sharing = SharingSettings {
            shared_users_url: non_blank(raw.sharing.shared_users_url),
            share_album_url: non_blank(raw.sharing.share_album_url),
            remove_user_url: non_blank(raw.sharing.remove_user_url),
            is_owner_url: non_blank(raw.sharing.is_owner_url),
        };

        Self {
            logging: raw.logging,
            api: raw.api,
            secrets: raw.secrets,
            database: raw.database,
            sharing,
        }
    }
}

// An empty env override (`APP__SHARING__IS_OWNER_URL=`) counts as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
