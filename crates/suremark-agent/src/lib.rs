//! Dedup-and-publish pipeline: the state machine coordinating
//! classification, extraction, composition, posting, and the store.
//!
//! The pipeline's one hard invariant: a URL that has ever been posted
//! successfully is never posted again. The store's unique index on `url` is
//! the final arbiter between racing processes; everything here treats the
//! losing side of that race as a benign signal.
//!
//! The store, posting client, and extractor are consumed through small
//! async traits so the whole pipeline runs under test without a database or
//! network.

pub mod batch;
pub mod error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use suremark_core::{classify, Platform, TemplateSet};
use suremark_db::{DbError, InsertOutcome, NewProcessedPost};
use suremark_extractor::{ContentExtractor, Extraction};
use suremark_poster::{PostedTweet, PosterError, XClient};

pub use batch::BatchSummary;
pub use error::AgentError;

/// Store operations the pipeline needs.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Whether a `success = true` row exists for `url`.
    async fn has_successful(&self, url: &str) -> Result<bool, DbError>;

    /// Insert a row; a unique-URL conflict comes back as
    /// [`InsertOutcome::DuplicateUrl`], not an error.
    async fn insert(&self, post: &NewProcessedPost<'_>) -> Result<InsertOutcome, DbError>;

    /// Promote an existing non-success row to a successful post, attaching
    /// the remote reference. Returns `false` when no such row was updated.
    async fn mark_success(
        &self,
        url: &str,
        post_id: &str,
        post_url: &str,
        posted_at: DateTime<Utc>,
    ) -> Result<bool, DbError>;
}

/// The remote posting client.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn post_message(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> Result<PostedTweet, PosterError>;
}

/// Content extraction. Infallible by contract; failures surface as the
/// fallback variant of [`Extraction`].
#[async_trait]
pub trait Extract: Send + Sync {
    async fn extract(&self, url: &Url, platform: Platform) -> Extraction;
}

/// Production store backed by the `processed_posts` table.
pub struct PgStore {
    pool: sqlx::PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn has_successful(&self, url: &str) -> Result<bool, DbError> {
        Ok(suremark_db::find_successful_by_url(&self.pool, url)
            .await?
            .is_some())
    }

    async fn insert(&self, post: &NewProcessedPost<'_>) -> Result<InsertOutcome, DbError> {
        suremark_db::insert_processed_post(&self.pool, post).await
    }

    async fn mark_success(
        &self,
        url: &str,
        post_id: &str,
        post_url: &str,
        posted_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        suremark_db::mark_success(&self.pool, url, post_id, post_url, posted_at).await
    }
}

#[async_trait]
impl Publisher for XClient {
    async fn post_message(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
    ) -> Result<PostedTweet, PosterError> {
        XClient::post_message(self, text, in_reply_to).await
    }
}

#[async_trait]
impl Extract for ContentExtractor {
    async fn extract(&self, url: &Url, platform: Platform) -> Extraction {
        ContentExtractor::extract(self, url, platform).await
    }
}

/// Successful terminal states of one pipeline run.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// The announcement went out and the outcome is recorded.
    Posted {
        platform: Platform,
        post_id: String,
        post_url: String,
        message: String,
    },
    /// Dry run: the message was composed and a non-success row recorded;
    /// the posting client was never contacted.
    DryRunRecorded {
        platform: Platform,
        message: String,
    },
}

/// The coordinating agent. One instance serves any number of sequential
/// [`process`](Agent::process) and [`run_batch`](Agent::run_batch) calls.
pub struct Agent<S, P, E> {
    store: S,
    poster: P,
    extractor: E,
    templates: TemplateSet,
    dashboard_url: String,
    default_username: String,
}

impl<S: PostStore, P: Publisher, E: Extract> Agent<S, P, E> {
    pub fn new(
        store: S,
        poster: P,
        extractor: E,
        templates: TemplateSet,
        dashboard_url: impl Into<String>,
        default_username: impl Into<String>,
    ) -> Self {
        Self {
            store,
            poster,
            extractor,
            templates,
            dashboard_url: dashboard_url.into(),
            default_username: default_username.into(),
        }
    }

    /// Run the full pipeline for one URL.
    ///
    /// Steps: validate the URL, short-circuit on a prior success, classify,
    /// extract (fail-soft), compose, then either record a dry run or post
    /// and record. A success row is only ever written after the remote post
    /// succeeded; a failed post leaves no trace and a later retry is not
    /// blocked.
    ///
    /// # Errors
    ///
    /// See [`AgentError`] for the terminal failure states. Duplicate-URL
    /// conflicts on the two insert sites are recovered internally and do not
    /// surface.
    pub async fn process(
        &self,
        raw_url: &str,
        suremark_username: Option<&str>,
        custom_message: Option<&str>,
        dry_run: bool,
    ) -> Result<ProcessOutcome, AgentError> {
        let url = Url::parse(raw_url).map_err(|e| AgentError::InvalidUrl {
            url: raw_url.to_owned(),
            reason: e.to_string(),
        })?;

        if self.store.has_successful(url.as_str()).await? {
            tracing::info!(url = %url, "URL already posted successfully; skipping");
            return Err(AgentError::AlreadyProcessed {
                url: url.to_string(),
            });
        }

        let platform = classify(&url);
        tracing::debug!(url = %url, platform = %platform, "classified URL");

        let extraction = self.extractor.extract(&url, platform).await;
        if let Extraction::Fallback { reason, .. } = &extraction {
            tracing::warn!(url = %url, reason = %reason, "extraction used placeholder content");
        }
        let mut data = extraction.into_data();
        if data.url.is_empty() {
            return Err(AgentError::ExtractionIncomplete {
                url: url.to_string(),
            });
        }

        let username = suremark_username.unwrap_or(&self.default_username);
        data.suremark_username = Some(username.to_owned());

        let message =
            self.templates
                .compose(platform, username, &self.dashboard_url, custom_message);
        tracing::debug!(url = %url, chars = message.chars().count(), "composed announcement");

        if dry_run {
            let record = NewProcessedPost {
                url: url.as_str(),
                platform: platform.as_str(),
                processed_at: data.captured_at,
                suremark_username: data.suremark_username.as_deref(),
                title: data.title.as_deref(),
                content: data.content.as_deref(),
                author: data.author.as_deref(),
                success: false,
                post_id: None,
                post_url: None,
                posted_at: None,
            };
            match self.store.insert(&record).await? {
                InsertOutcome::Inserted(_) => {
                    tracing::info!(url = %url, "dry run recorded");
                }
                InsertOutcome::DuplicateUrl => {
                    tracing::warn!(url = %url, "dry-run record already exists; keeping the original");
                }
            }
            return Ok(ProcessOutcome::DryRunRecorded { platform, message });
        }

        let posted = self.poster.post_message(&message, None).await?;
        tracing::info!(url = %url, post_id = %posted.id, "posted verification announcement");

        let record = NewProcessedPost {
            url: url.as_str(),
            platform: platform.as_str(),
            processed_at: data.captured_at,
            suremark_username: data.suremark_username.as_deref(),
            title: data.title.as_deref(),
            content: data.content.as_deref(),
            author: data.author.as_deref(),
            success: true,
            post_id: Some(&posted.id),
            post_url: Some(&posted.url),
            posted_at: Some(posted.posted_at),
        };
        match self.store.insert(&record).await? {
            InsertOutcome::Inserted(_) => {}
            InsertOutcome::DuplicateUrl => {
                // An earlier non-success row (dry run, or a concurrent
                // writer) owns the URL key. Promote it if it is not already
                // a recorded success; either way the remote post happened,
                // so the outcome stays Posted.
                let promoted = self
                    .store
                    .mark_success(url.as_str(), &posted.id, &posted.url, posted.posted_at)
                    .await?;
                if promoted {
                    tracing::info!(url = %url, "promoted existing record to posted");
                } else {
                    tracing::warn!(url = %url, "another process already recorded this URL");
                }
            }
        }

        Ok(ProcessOutcome::Posted {
            platform,
            post_id: posted.id,
            post_url: posted.url,
            message,
        })
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }
}
