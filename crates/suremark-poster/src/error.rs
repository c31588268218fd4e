use thiserror::Error;

#[derive(Debug, Error)]
pub enum PosterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("message is {length} characters; the limit is {limit}")]
    MessageTooLong { length: usize, limit: usize },

    #[error("rate limited by X (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("X API error (status {status}): {detail}")]
    Api { status: u16, detail: String },

    #[error("X API response missing {field}")]
    MalformedResponse { field: &'static str },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
