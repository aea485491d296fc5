use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SharingClientError {
    #[error("Sharing endpoint `{0}` is not configured")]
    NotConfigured(&'static str),

    #[error("Sharing endpoint `{field}` is not a valid URL: {source}")]
    InvalidEndpoint {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The authority answered with a non-success status.
    ///
    /// `message` is the body's `message` or else the status reason,
    /// `service_message` the body's `serviceStatus.message` when present.
    #[error("Remote server returned {status}: {message}")]
    Rejected {
        status: StatusCode,
        message: String,
        service_message: Option<String>,
    },

    #[error("Malformed response from sharing authority: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SharingClientError {
    /// The most specific human readable reason for the failure.
    ///
    /// For a rejection this is the remote's own message, for everything else
    /// the error's display text.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
