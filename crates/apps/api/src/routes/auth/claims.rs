use serde::{Deserialize, Serialize};

/// Bearer token claims. Tokens are minted by the identity provider in front
/// of this service; `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    pub exp: i64,
}
