//! Pipeline tests against in-memory collaborators.
//!
//! The store honours the unique-URL rule the real table enforces, and the
//! poster counts calls, so every dedup property can be asserted without a
//! database or network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use suremark_agent::{Agent, AgentError, Extract, PostStore, ProcessOutcome, Publisher};
use suremark_core::{Platform, PostData, TemplateSet};
use suremark_db::{DbError, InsertOutcome, NewProcessedPost};
use suremark_extractor::Extraction;
use suremark_poster::{PostedTweet, PosterError};

const DASHBOARD: &str = "https://d.example";
const DEFAULT_USERNAME: &str = "suremark";

// ---------------------------------------------------------------------------
// In-memory collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredRow {
    success: bool,
    post_id: Option<String>,
    username: Option<String>,
}

/// Store with the same observable behavior as the real table: one row per
/// URL, conflicts reported as data, successes promotable but never
/// overwritten.
#[derive(Clone, Default)]
struct MemStore {
    rows: Arc<Mutex<HashMap<String, StoredRow>>>,
}

impl MemStore {
    fn row(&self, url: &str) -> Option<StoredRow> {
        self.rows.lock().unwrap().get(url).cloned()
    }

    fn seed_success(&self, url: &str) {
        self.rows.lock().unwrap().insert(
            url.to_string(),
            StoredRow {
                success: true,
                post_id: Some("seeded".to_string()),
                username: None,
            },
        );
    }
}

#[async_trait]
impl PostStore for MemStore {
    async fn has_successful(&self, url: &str) -> Result<bool, DbError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(url)
            .is_some_and(|row| row.success))
    }

    async fn insert(&self, post: &NewProcessedPost<'_>) -> Result<InsertOutcome, DbError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(post.url) {
            return Ok(InsertOutcome::DuplicateUrl);
        }
        let id = rows.len() as i64 + 1;
        rows.insert(
            post.url.to_string(),
            StoredRow {
                success: post.success,
                post_id: post.post_id.map(str::to_owned),
                username: post.suremark_username.map(str::to_owned),
            },
        );
        Ok(InsertOutcome::Inserted(id))
    }

    async fn mark_success(
        &self,
        url: &str,
        post_id: &str,
        _post_url: &str,
        _posted_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(url) {
            Some(row) if !row.success => {
                row.success = true;
                row.post_id = Some(post_id.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Clone, Copy)]
enum PosterMode {
    Succeed,
    FailApi,
    RateLimit,
}

#[derive(Clone)]
struct CountingPoster {
    calls: Arc<AtomicU32>,
    texts: Arc<Mutex<Vec<String>>>,
    mode: Arc<Mutex<PosterMode>>,
}

impl CountingPoster {
    fn new(mode: PosterMode) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            texts: Arc::new(Mutex::new(Vec::new())),
            mode: Arc::new(Mutex::new(mode)),
        }
    }

    fn set_mode(&self, mode: PosterMode) {
        *self.mode.lock().unwrap() = mode;
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_text(&self) -> Option<String> {
        self.texts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Publisher for CountingPoster {
    async fn post_message(
        &self,
        text: &str,
        _in_reply_to: Option<&str>,
    ) -> Result<PostedTweet, PosterError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        match *self.mode.lock().unwrap() {
            PosterMode::Succeed => Ok(PostedTweet {
                id: format!("post-{n}"),
                url: format!("https://x.com/i/web/status/post-{n}"),
                posted_at: Utc::now(),
            }),
            PosterMode::FailApi => Err(PosterError::Api {
                status: 403,
                detail: "duplicate content".to_string(),
            }),
            PosterMode::RateLimit => Err(PosterError::RateLimited {
                retry_after_secs: 900,
            }),
        }
    }
}

/// Extractor returning a fixed record for the URL; no network involved.
struct StubExtractor;

#[async_trait]
impl Extract for StubExtractor {
    async fn extract(&self, url: &Url, platform: Platform) -> Extraction {
        Extraction::Extracted(PostData {
            url: url.as_str().to_owned(),
            platform,
            title: Some("Stub Title".to_string()),
            content: Some("Stub content".to_string()),
            author: None,
            captured_at: Utc::now(),
            suremark_username: None,
        })
    }
}

/// Extractor that loses the URL, simulating an incomplete record.
struct BrokenExtractor;

#[async_trait]
impl Extract for BrokenExtractor {
    async fn extract(&self, _url: &Url, platform: Platform) -> Extraction {
        Extraction::Fallback {
            data: PostData {
                url: String::new(),
                platform,
                title: None,
                content: None,
                author: None,
                captured_at: Utc::now(),
                suremark_username: None,
            },
            reason: "record lost its URL".to_string(),
        }
    }
}

fn agent(
    store: &MemStore,
    poster: &CountingPoster,
) -> Agent<MemStore, CountingPoster, StubExtractor> {
    Agent::new(
        store.clone(),
        poster.clone(),
        StubExtractor,
        TemplateSet::default(),
        DASHBOARD,
        DEFAULT_USERNAME,
    )
}

// ---------------------------------------------------------------------------
// Single-URL pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_url_is_rejected_before_any_collaborator_runs() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);

    let result = agent(&store, &poster)
        .process("not a url", None, None, false)
        .await;

    assert!(matches!(result, Err(AgentError::InvalidUrl { .. })));
    assert_eq!(poster.call_count(), 0);
    assert!(store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn live_post_records_success_after_the_remote_call() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);

    let outcome = agent(&store, &poster)
        .process("https://example.com/article", Some("alice"), None, false)
        .await
        .expect("pipeline should succeed");

    let ProcessOutcome::Posted {
        platform,
        post_id,
        message,
        ..
    } = outcome
    else {
        panic!("expected Posted");
    };
    assert_eq!(platform, Platform::Website);
    assert_eq!(post_id, "post-0");
    assert!(message.contains("@alice"));
    assert!(message.contains(DASHBOARD));

    let row = store.row("https://example.com/article").expect("row written");
    assert!(row.success);
    assert_eq!(row.post_id.as_deref(), Some("post-0"));
    assert_eq!(row.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn second_process_of_a_posted_url_short_circuits() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);
    let agent = agent(&store, &poster);

    agent
        .process("https://example.com/a", None, None, false)
        .await
        .expect("first run should post");

    let second = agent
        .process("https://example.com/a", None, None, false)
        .await;

    assert!(matches!(second, Err(AgentError::AlreadyProcessed { .. })));
    assert_eq!(poster.call_count(), 1, "poster must not be called again");
}

#[tokio::test]
async fn posting_failure_leaves_no_record_and_does_not_block_retry() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::FailApi);
    let agent = agent(&store, &poster);

    let first = agent
        .process("https://example.com/flaky", None, None, false)
        .await;
    assert!(matches!(
        first,
        Err(AgentError::Posting(PosterError::Api { status: 403, .. }))
    ));
    assert!(
        store.row("https://example.com/flaky").is_none(),
        "a failed post must leave no trace"
    );

    poster.set_mode(PosterMode::Succeed);
    let retry = agent
        .process("https://example.com/flaky", None, None, false)
        .await;
    assert!(matches!(retry, Ok(ProcessOutcome::Posted { .. })));
    assert!(store.row("https://example.com/flaky").unwrap().success);
}

#[tokio::test]
async fn rate_limit_surfaces_retry_after() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::RateLimit);

    let result = agent(&store, &poster)
        .process("https://example.com/limited", None, None, false)
        .await;

    let err = result.expect_err("rate limit should fail the item");
    assert_eq!(err.retry_after_secs(), Some(900));
    assert!(store.row("https://example.com/limited").is_none());
}

#[tokio::test]
async fn incomplete_extraction_aborts_before_poster_and_store() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);
    let agent = Agent::new(
        store.clone(),
        poster.clone(),
        BrokenExtractor,
        TemplateSet::default(),
        DASHBOARD,
        DEFAULT_USERNAME,
    );

    let result = agent
        .process("https://example.com/broken", None, None, false)
        .await;

    assert!(matches!(result, Err(AgentError::ExtractionIncomplete { .. })));
    assert_eq!(poster.call_count(), 0);
    assert!(store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn custom_message_overrides_the_template() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);

    agent(&store, &poster)
        .process(
            "https://example.com/custom",
            Some("alice"),
            Some("Checked: {suremark_username} — {dashboard_url}"),
            false,
        )
        .await
        .expect("pipeline should succeed");

    assert_eq!(
        poster.last_text().as_deref(),
        Some(format!("Checked: @alice — {DASHBOARD}").as_str())
    );
}

#[tokio::test]
async fn missing_username_falls_back_to_the_configured_default() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);

    agent(&store, &poster)
        .process("https://example.com/anon", None, None, false)
        .await
        .expect("pipeline should succeed");

    let text = poster.last_text().expect("a message was posted");
    assert!(
        text.contains(&format!("@{DEFAULT_USERNAME}")),
        "expected default attribution in: {text}"
    );
}

// ---------------------------------------------------------------------------
// Dry runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dry_run_records_without_contacting_the_poster() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);

    let outcome = agent(&store, &poster)
        .process("https://example.com/dry", Some("alice"), None, true)
        .await
        .expect("dry run should succeed");

    assert!(matches!(outcome, ProcessOutcome::DryRunRecorded { .. }));
    assert_eq!(poster.call_count(), 0);
    let row = store.row("https://example.com/dry").expect("row written");
    assert!(!row.success, "dry-run rows are never successes");
}

#[tokio::test]
async fn repeated_dry_runs_do_not_error() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);
    let agent = agent(&store, &poster);

    for _ in 0..2 {
        let outcome = agent
            .process("https://example.com/dry-twice", None, None, true)
            .await
            .expect("every dry run should report success");
        assert!(matches!(outcome, ProcessOutcome::DryRunRecorded { .. }));
    }
    assert_eq!(poster.call_count(), 0);
}

#[tokio::test]
async fn live_post_after_dry_run_promotes_the_existing_record() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);
    let agent = agent(&store, &poster);

    agent
        .process("https://example.com/promoted", None, None, true)
        .await
        .expect("dry run should succeed");

    let outcome = agent
        .process("https://example.com/promoted", None, None, false)
        .await
        .expect("live run should post despite the dry-run row");
    assert!(matches!(outcome, ProcessOutcome::Posted { .. }));

    let row = store.row("https://example.com/promoted").unwrap();
    assert!(row.success, "dry-run row should be promoted to a success");

    // The promoted record now blocks further processing.
    let third = agent
        .process("https://example.com/promoted", None, None, false)
        .await;
    assert!(matches!(third, Err(AgentError::AlreadyProcessed { .. })));
    assert_eq!(poster.call_count(), 1);
}

// ---------------------------------------------------------------------------
// Batch driver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_isolates_per_item_failures() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);
    let urls = vec![
        "https://example.com/one".to_string(),
        "not a url".to_string(),
        "https://example.com/three".to_string(),
    ];

    let summary = agent(&store, &poster)
        .run_batch(&urls, None, 0, false)
        .await;

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert!(store.row("https://example.com/one").unwrap().success);
    assert!(store.row("https://example.com/three").unwrap().success);
}

#[tokio::test]
async fn batch_pre_check_skips_prior_successes_without_posting() {
    let store = MemStore::default();
    store.seed_success("https://example.com/done");
    let poster = CountingPoster::new(PosterMode::Succeed);
    let urls = vec![
        "https://example.com/done".to_string(),
        "https://example.com/new".to_string(),
    ];

    let summary = agent(&store, &poster)
        .run_batch(&urls, None, 0, false)
        .await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(poster.call_count(), 1, "skipped items never reach the poster");
}

#[tokio::test]
async fn batch_dry_run_processes_everything_without_posting() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::Succeed);
    let urls = vec![
        "https://example.com/d1".to_string(),
        "https://example.com/d2".to_string(),
    ];

    let summary = agent(&store, &poster).run_batch(&urls, None, 30, true).await;

    // delay_secs is 30 but dry runs never sleep; the test finishing promptly
    // is itself the assertion.
    assert_eq!(summary.processed, 2);
    assert_eq!(poster.call_count(), 0);
}

#[tokio::test]
async fn batch_continues_after_poster_failures() {
    let store = MemStore::default();
    let poster = CountingPoster::new(PosterMode::FailApi);
    let urls = vec![
        "https://example.com/f1".to_string(),
        "https://example.com/f2".to_string(),
    ];

    let summary = agent(&store, &poster)
        .run_batch(&urls, None, 0, false)
        .await;

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.processed, 0);
    assert_eq!(poster.call_count(), 2, "each item is attempted independently");
}
