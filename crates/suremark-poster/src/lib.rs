//! Client for creating posts on X via the v2 API.
//!
//! Authenticates with an OAuth2 user-context bearer token. The caller is
//! expected to hold all four credential values (client id/secret and the
//! user access/refresh tokens); only the access token is sent on requests.

pub mod error;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

pub use error::PosterError;

/// Hard character limit enforced before any network call.
pub const MAX_POST_CHARS: usize = 280;

const DEFAULT_BASE_URL: &str = "https://api.x.com";

/// Retry-after applied to 429 responses that carry no `Retry-After` header:
/// one full rate-limit window.
const DEFAULT_RETRY_AFTER_SECS: u64 = 900;

/// The four credential values required to post.
#[derive(Clone)]
pub struct XCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for XCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

const CREDENTIAL_VARS: [&str; 4] = [
    "SUREMARK_X_CLIENT_ID",
    "SUREMARK_X_CLIENT_SECRET",
    "SUREMARK_X_ACCESS_TOKEN",
    "SUREMARK_X_REFRESH_TOKEN",
];

impl XCredentials {
    /// Read the four credential values from the environment. Returns `None`
    /// unless all four are present and non-empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key))
    }

    /// True when all four credential values are configured.
    #[must_use]
    pub fn configured() -> bool {
        Self::from_env().is_some()
    }

    /// Build credentials using the provided env-var lookup function — the
    /// parsing logic decoupled from the process environment for tests.
    fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let mut values = CREDENTIAL_VARS
            .iter()
            .map(|var| lookup(var).ok().filter(|v| !v.is_empty()));
        Some(Self {
            client_id: values.next()??,
            client_secret: values.next()??,
            access_token: values.next()??,
            refresh_token: values.next()??,
        })
    }
}

/// A post accepted by the remote API.
#[derive(Debug, Clone)]
pub struct PostedTweet {
    pub id: String,
    pub url: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: Option<CreateTweetData>,
}

#[derive(Deserialize)]
struct CreateTweetData {
    id: String,
}

/// Client for the X v2 API.
///
/// Use [`XClient::new`] for production or [`XClient::with_base_url`] to
/// point at a mock server in tests.
pub struct XClient {
    client: Client,
    credentials: XCredentials,
    base_url: Url,
}

impl XClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(credentials: XCredentials, timeout_secs: u64) -> Result<Self, PosterError> {
        Self::with_base_url(credentials, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PosterError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`PosterError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        credentials: XCredentials,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PosterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("suremark-agent/0.1 (verification-announcer)")
            .build()?;
        let base_url = Url::parse(base_url).map_err(|e| PosterError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            credentials,
            base_url,
        })
    }

    /// Create a post, optionally as a reply to `in_reply_to`.
    ///
    /// The message length is validated against [`MAX_POST_CHARS`] before any
    /// network call is made.
    ///
    /// # Errors
    ///
    /// - [`PosterError::MessageTooLong`] — `text` exceeds the limit (no
    ///   request is sent).
    /// - [`PosterError::RateLimited`] — HTTP 429; carries the server's
    ///   `Retry-After` when present, else a full rate window.
    /// - [`PosterError::Api`] — any other non-2xx status, with the remote
    ///   error detail verbatim.
    /// - [`PosterError::MalformedResponse`] — 2xx body without a post id.
    /// - [`PosterError::Http`] — network or TLS failure.
    pub async fn post_message(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> Result<PostedTweet, PosterError> {
        let length = text.chars().count();
        if length > MAX_POST_CHARS {
            return Err(PosterError::MessageTooLong {
                length,
                limit: MAX_POST_CHARS,
            });
        }

        let mut body = json!({ "text": text });
        if let Some(reply_id) = in_reply_to {
            body["reply"] = json!({ "in_reply_to_tweet_id": reply_id });
        }

        let url = self.endpoint("/2/tweets")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.credentials.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(PosterError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(PosterError::Api {
                status: status.as_u16(),
                detail: Self::error_detail(response).await,
            });
        }

        let parsed: CreateTweetResponse = response.json().await?;
        let id = parsed
            .data
            .map(|d| d.id)
            .ok_or(PosterError::MalformedResponse { field: "data.id" })?;

        tracing::debug!(post_id = %id, "X accepted the post");

        Ok(PostedTweet {
            url: format!("https://x.com/i/web/status/{id}"),
            id,
            posted_at: Utc::now(),
        })
    }

    /// Check that the configured access token identifies a user.
    ///
    /// Returns `Ok(false)` on an auth rejection (401/403) rather than an
    /// error, so callers can distinguish bad credentials from transport
    /// failures.
    ///
    /// # Errors
    ///
    /// - [`PosterError::RateLimited`] — HTTP 429.
    /// - [`PosterError::Api`] — any other unexpected status.
    /// - [`PosterError::Http`] — network or TLS failure.
    pub async fn verify_credentials(&self) -> Result<bool, PosterError> {
        let url = self.endpoint("/2/users/me")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.credentials.access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(false);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PosterError::RateLimited {
                retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
            });
        }
        Err(PosterError::Api {
            status: status.as_u16(),
            detail: Self::error_detail(response).await,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PosterError> {
        self.base_url
            .join(path)
            .map_err(|e| PosterError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// The remote error message, preferring the JSON `detail` field the v2
    /// API uses, falling back to the raw body.
    async fn error_detail(response: reqwest::Response) -> String {
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("title"))
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or(body)
    }
}
