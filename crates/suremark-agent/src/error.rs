use thiserror::Error;

use suremark_db::DbError;
use suremark_poster::PosterError;

/// Terminal failure states of the publish pipeline.
///
/// `AlreadyProcessed` is a no-op signal rather than a real failure: the URL
/// reached a successful terminal state in some earlier run, and the pipeline
/// refuses to repeat it.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL was already posted successfully: {url}")]
    AlreadyProcessed { url: String },

    #[error("content extraction produced an incomplete record for {url}")]
    ExtractionIncomplete { url: String },

    #[error("posting failed: {0}")]
    Posting(#[from] PosterError),

    #[error("store error: {0}")]
    Store(#[from] DbError),
}

impl AgentError {
    /// Seconds the caller should wait before retrying, when the failure is
    /// the posting client's rate limit.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            AgentError::Posting(PosterError::RateLimited { retry_after_secs }) => {
                Some(*retry_after_secs)
            }
            _ => None,
        }
    }
}
