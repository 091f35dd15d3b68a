use thiserror::Error;

#[derive(Debug, Error)]
pub enum BroadcasterError {
    #[error("Slack API unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Slack API rejected request: {0}")]
    UpstreamRejected(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Pagination exceeded the limit of {0} pages")]
    PageLimitExceeded(usize),

    #[error("Failed to fetch Slack data (channels: {}, users: {})", describe(.channels), describe(.users))]
    DirectoryFetch {
        channels: Option<String>,
        users: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BroadcasterError {
    /// Transport-level failures may succeed on a second attempt; Slack-side rejections won't
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }

    /// Upstream error text without our prefix (e.g. `channel_not_found`)
    pub fn detail(&self) -> String {
        match self {
            Self::UpstreamUnavailable(detail) | Self::UpstreamRejected(detail) => detail.clone(),
            other => other.to_string(),
        }
    }
}

fn describe(failure: &Option<String>) -> &str {
    failure.as_deref().unwrap_or("OK")
}

pub type Result<T> = std::result::Result<T, BroadcasterError>;
