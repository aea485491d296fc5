use crate::sharing::SharingClientError;
use app_state::SharingSettings;
use url::Url;

/// Validated endpoints of the sharing authority, one per remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharingEndpoints {
    pub shared_users: Url,
    pub share_album: Url,
    pub remove_user: Url,
    pub is_owner: Url,
}

impl TryFrom<&SharingSettings> for SharingEndpoints {
    type Error = SharingClientError;

    fn try_from(settings: &SharingSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            shared_users: parse_endpoint("shared_users_url", settings.shared_users_url.as_deref())?,
            share_album: parse_endpoint("share_album_url", settings.share_album_url.as_deref())?,
            remove_user: parse_endpoint("remove_user_url", settings.remove_user_url.as_deref())?,
            is_owner: parse_endpoint("is_owner_url", settings.is_owner_url.as_deref())?,
        })
    }
}

fn parse_endpoint(field: &'static str, value: Option<&str>) -> Result<Url, SharingClientError> {
    let value = value.ok_or(SharingClientError::NotConfigured(field))?;
    Url::parse(value).map_err(|source| SharingClientError::InvalidEndpoint { field, source })
}
