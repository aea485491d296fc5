use crate::database::album::album_user::AlbumUserRole;
use crate::sharing::interfaces::{
    Envelope, IsOwnerPayload, IsOwnerRequest, RemoteAlbumUser, RemoveUserRequest,
    ShareAlbumRequest, SharedUsersPayload, SharedUsersRequest,
};
use crate::sharing::{SharingAuthority, SharingClientError, SharingEndpoints};
use app_state::SharingSettings;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

/// Outcome of one request/response exchange with the authority.
///
/// The body is parsed once, here; callers only ever see a decoded payload or
/// a typed failure.
#[derive(Debug)]
pub enum AuthorityResponse {
    Ok(Value),
    RemoteError {
        status: StatusCode,
        message: String,
        service_message: Option<String>,
    },
    TransportError(reqwest::Error),
}

impl AuthorityResponse {
    fn into_value(self) -> Result<Value, SharingClientError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::RemoteError {
                status,
                message,
                service_message,
            } => Err(SharingClientError::Rejected {
                status,
                message,
                service_message,
            }),
            Self::TransportError(err) => Err(SharingClientError::Transport(err)),
        }
    }

    /// Decodes `{"payload": T}` from a successful response.
    fn into_payload<T: DeserializeOwned>(self) -> Result<T, SharingClientError> {
        let envelope: Envelope<T> = serde_json::from_value(self.into_value()?)?;
        Ok(envelope.payload)
    }
}

fn body_message(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(ToOwned::to_owned)
}

/// HTTP client for the sharing authority. Every operation is a JSON `POST`.
#[derive(Clone)]
pub struct SharingClient {
    http_client: Client,
    endpoints: SharingEndpoints,
}

impl SharingClient {
    /// Fails if any endpoint is missing or not a valid URL.
    pub fn new(http_client: Client, settings: &SharingSettings) -> Result<Self, SharingClientError> {
        Ok(Self::with_endpoints(
            http_client,
            SharingEndpoints::try_from(settings)?,
        ))
    }

    #[must_use]
    pub const fn with_endpoints(http_client: Client, endpoints: SharingEndpoints) -> Self {
        Self {
            http_client,
            endpoints,
        }
    }

    async fn exchange<B: Serialize + Sync>(&self, url: &Url, body: &B) -> AuthorityResponse {
        let response = match self.http_client.post(url.clone()).json(body).send().await {
            Ok(response) => response,
            Err(err) => return AuthorityResponse::TransportError(err),
        };

        let status = response.status();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => return AuthorityResponse::TransportError(err),
        };
        let parsed = serde_json::from_slice::<Value>(&bytes).ok();

        if status.is_success() {
            debug!("{url} answered {status}");
            return AuthorityResponse::Ok(parsed.unwrap_or(Value::Null));
        }

        let message = parsed
            .as_ref()
            .and_then(|body| body_message(body, "/message"))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned());
        let service_message = parsed
            .as_ref()
            .and_then(|body| body_message(body, "/serviceStatus/message"));
        warn!("{url} rejected request with {status}: {message}");
        AuthorityResponse::RemoteError {
            status,
            message,
            service_message,
        }
    }
}

#[async_trait]
impl SharingAuthority for SharingClient {
    #[instrument(skip(self))]
    async fn shared_users(
        &self,
        album_id: &str,
        owner_id: &str,
        current_user_id: &str,
    ) -> Result<Vec<RemoteAlbumUser>, SharingClientError> {
        let request = SharedUsersRequest {
            album_owner_id: owner_id,
            album_id,
            current_user_id,
        };
        let payload: SharedUsersPayload = self
            .exchange(&self.endpoints.shared_users, &request)
            .await
            .into_payload()?;
        Ok(payload.users)
    }

    #[instrument(skip(self))]
    async fn share_album(
        &self,
        owner_id: &str,
        album_id: &str,
        user_id: &str,
        role: AlbumUserRole,
    ) -> Result<(), SharingClientError> {
        let request = ShareAlbumRequest {
            current_user_id: owner_id,
            album_id,
            share_with_user_id: user_id,
            user_role: role,
        };
        self.exchange(&self.endpoints.share_album, &request)
            .await
            .into_value()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_user(
        &self,
        owner_id: &str,
        album_id: &str,
        user_id: &str,
    ) -> Result<(), SharingClientError> {
        let request = RemoveUserRequest {
            current_user_id: owner_id,
            album_id,
            delete_from_album_user_id: user_id,
        };
        self.exchange(&self.endpoints.remove_user, &request)
            .await
            .into_value()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_album_owner(
        &self,
        album_id: &str,
        user_id: &str,
    ) -> Result<bool, SharingClientError> {
        let request = IsOwnerRequest { album_id, user_id };
        let payload: IsOwnerPayload = self
            .exchange(&self.endpoints.is_owner, &request)
            .await
            .into_payload()?;
        Ok(payload.is_owner)
    }
}
