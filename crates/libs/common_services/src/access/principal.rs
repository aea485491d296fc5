/// Path alias for "the calling user".
pub const SELF_ALIAS: &str = "me";

/// The authenticated user issuing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
}

impl Principal {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Resolves `"me"` to this principal's id, passes every other id through.
    #[must_use]
    pub fn resolve_user_id(&self, user_id: &str) -> String {
        if user_id == SELF_ALIAS {
            self.user_id.clone()
        } else {
            user_id.to_owned()
        }
    }
}
