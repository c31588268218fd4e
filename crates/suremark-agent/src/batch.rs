//! Sequential batch driver over the publish pipeline.

use std::time::Duration;

use url::Url;

use crate::{Agent, Extract, PostStore, ProcessOutcome, Publisher};

/// Aggregate counts for one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// URLs that reached `Posted` or `DryRunRecorded`.
    pub processed: usize,
    /// URLs skipped by the idempotency pre-check.
    pub skipped: usize,
    /// URLs that ended in any other state.
    pub failed: usize,
}

impl<S: PostStore, P: Publisher, E: Extract> Agent<S, P, E> {
    /// Process `urls` strictly in order, one at a time.
    ///
    /// Each URL is first checked against the store alone; a prior success
    /// counts it as skipped without running extraction or posting. Otherwise
    /// the full pipeline runs, and any per-item failure increments `failed`
    /// without aborting the batch. Between live items the driver sleeps
    /// `delay_secs` to stay inside the destination's posting quota — never
    /// after the final item, and never during dry runs.
    pub async fn run_batch(
        &self,
        urls: &[String],
        suremark_username: Option<&str>,
        delay_secs: u64,
        dry_run: bool,
    ) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let total = urls.len();

        for (index, raw_url) in urls.iter().enumerate() {
            // Idempotency pre-check only. Malformed URLs fall through to
            // process(), which rejects them and counts them as failures.
            let already = match Url::parse(raw_url) {
                Ok(parsed) => match self.store().has_successful(parsed.as_str()).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::error!(url = %raw_url, error = %e, "idempotency pre-check failed");
                        summary.failed += 1;
                        continue;
                    }
                },
                Err(_) => false,
            };
            if already {
                tracing::info!(url = %raw_url, "skipping already-processed URL");
                summary.skipped += 1;
                continue;
            }

            match self
                .process(raw_url, suremark_username, None, dry_run)
                .await
            {
                Ok(ProcessOutcome::Posted { post_id, .. }) => {
                    tracing::info!(url = %raw_url, post_id = %post_id, "batch item posted");
                    summary.processed += 1;
                }
                Ok(ProcessOutcome::DryRunRecorded { .. }) => {
                    summary.processed += 1;
                }
                Err(e) => {
                    tracing::error!(url = %raw_url, error = %e, "batch item failed");
                    summary.failed += 1;
                }
            }

            if !dry_run && delay_secs > 0 && index + 1 < total {
                tracing::debug!(delay_secs, "sleeping between posts");
                tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            }
        }

        summary
    }
}
