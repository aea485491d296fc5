use crate::api_state::ApiContext;
use crate::auth::error::AuthError;
use crate::auth::middlewares::common::{decode_token, extract_context, extract_token};
use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
};
use common_services::access::Principal;

/// Authenticated caller. Inserts its [`Principal`] into the request
/// extensions for handlers behind the protected routes.
#[derive(Clone, Debug)]
pub struct ApiUser(pub Principal);

impl<S> FromRequestParts<S> for ApiUser
where
    S: Send + Sync,
    State<ApiContext>: FromRequestParts<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let context = extract_context(parts, state).await?;
        let claims = decode_token(&token, &context.settings.secrets.jwt)?;
        let principal = Principal::new(claims.sub);
        parts.extensions.insert(principal.clone());
        Ok(Self(principal))
    }
}
