//! Best-effort content extraction, one strategy per platform.
//!
//! Extraction never fails: fetch and parse problems fold into
//! [`Extraction::Fallback`] carrying platform-appropriate placeholder text,
//! so the pipeline always has a record to work with. The microblog strategy
//! derives its record from the URL path and never touches the network.

pub mod fetch;
mod html;
mod strategies;

use chrono::Utc;
use suremark_core::{truncate_chars, Platform, PostData, MAX_CONTENT_CHARS, MAX_TITLE_CHARS};
use url::Url;

pub use fetch::{FetchError, PageFetcher};
use strategies::{strategy_for, PageFields, Strategy, StrategyKind};

/// Outcome of one extraction attempt.
///
/// Both variants carry a complete record; the variant says whether the
/// fields came from the live page or are placeholders, so tests and callers
/// can tell which branch fired without reading logs.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Fields read from the page (or derived from the URL).
    Extracted(PostData),
    /// Placeholder record; `reason` says why the real fields are absent.
    Fallback { data: PostData, reason: String },
}

impl Extraction {
    #[must_use]
    pub fn data(&self) -> &PostData {
        match self {
            Extraction::Extracted(data) | Extraction::Fallback { data, .. } => data,
        }
    }

    #[must_use]
    pub fn into_data(self) -> PostData {
        match self {
            Extraction::Extracted(data) | Extraction::Fallback { data, .. } => data,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback { .. })
    }
}

/// Dispatches URLs to the per-platform strategies.
pub struct ContentExtractor {
    fetcher: PageFetcher,
}

impl ContentExtractor {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: PageFetcher::new(timeout_secs, user_agent)?,
        })
    }

    #[must_use]
    pub fn with_fetcher(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Extract a best-effort record for `url`.
    ///
    /// Never returns an error: fetch-based strategies fall back to their
    /// placeholder record on any fetch failure, and the identifier-based
    /// strategy falls back when the path carries no identifier.
    pub async fn extract(&self, url: &Url, platform: Platform) -> Extraction {
        let strategy = strategy_for(platform);

        match &strategy.kind {
            StrategyKind::IdentifierBased { derive } => match derive(url) {
                Some(fields) => Extraction::Extracted(build_record(url, platform, fields)),
                None => Extraction::Fallback {
                    data: placeholder_record(url, platform, strategy),
                    reason: "URL path carries no post identifier".to_string(),
                },
            },
            StrategyKind::FetchBased { read } => {
                match self.fetcher.fetch_html(url.as_str()).await {
                    Ok(body) => Extraction::Extracted(build_record(url, platform, read(&body))),
                    Err(e) => {
                        tracing::warn!(
                            url = %url,
                            platform = %platform,
                            error = %e,
                            "page fetch failed; using placeholder content"
                        );
                        Extraction::Fallback {
                            data: placeholder_record(url, platform, strategy),
                            reason: e.to_string(),
                        }
                    }
                }
            }
        }
    }
}

fn build_record(url: &Url, platform: Platform, fields: PageFields) -> PostData {
    PostData {
        url: url.as_str().to_owned(),
        platform,
        title: fields.title.map(|t| truncate_chars(&t, MAX_TITLE_CHARS)),
        content: fields.content.map(|c| truncate_chars(&c, MAX_CONTENT_CHARS)),
        author: fields.author,
        captured_at: Utc::now(),
        suremark_username: None,
    }
}

fn placeholder_record(url: &Url, platform: Platform, strategy: &Strategy) -> PostData {
    PostData {
        url: url.as_str().to_owned(),
        platform,
        title: Some(strategy.placeholder_title.to_string()),
        content: Some(strategy.placeholder_content.to_string()),
        author: None,
        captured_at: Utc::now(),
        suremark_username: None,
    }
}
