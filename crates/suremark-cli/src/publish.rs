//! Posting command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Credential configuration is checked before any pipeline
//! work; credential *verification* (a network call) only runs for live
//! posting, never for dry runs.

use std::path::Path;

use anyhow::Context;

use suremark_agent::{Agent, AgentError, PgStore, ProcessOutcome};
use suremark_core::{AppConfig, TemplateSet};
use suremark_extractor::ContentExtractor;
use suremark_poster::{XClient, XCredentials};

/// Build the fully wired agent.
///
/// Fails with a configuration hint when any of the four X credential values
/// is missing, and — for live runs — when X rejects the configured tokens.
async fn build_agent(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    dry_run: bool,
) -> anyhow::Result<Agent<PgStore, XClient, ContentExtractor>> {
    let credentials = XCredentials::from_env().context(
        "X credentials are not configured; set SUREMARK_X_CLIENT_ID, \
         SUREMARK_X_CLIENT_SECRET, SUREMARK_X_ACCESS_TOKEN, and SUREMARK_X_REFRESH_TOKEN",
    )?;

    let poster = XClient::new(credentials, config.fetch_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build X client: {e}"))?;

    if !dry_run {
        let ok = poster
            .verify_credentials()
            .await
            .map_err(|e| anyhow::anyhow!("credential verification failed: {e}"))?;
        anyhow::ensure!(ok, "X rejected the configured credentials; check the tokens");
    }

    let extractor = ContentExtractor::new(config.fetch_timeout_secs, &config.user_agent)
        .map_err(|e| anyhow::anyhow!("failed to build content extractor: {e}"))?;

    Ok(Agent::new(
        PgStore::new(pool.clone()),
        poster,
        extractor,
        TemplateSet::default(),
        config.dashboard_url.clone(),
        config.default_username.clone(),
    ))
}

/// Handle `tweet`: run the full pipeline for one URL and report the outcome.
///
/// An already-processed URL is reported as a notice, not a failure — the
/// guarantee held, nothing went wrong.
///
/// # Errors
///
/// Returns an error for missing/rejected credentials, malformed URLs,
/// posting failures, and store failures.
pub(crate) async fn run_tweet(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    url: &str,
    message: Option<&str>,
    username: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let agent = build_agent(pool, config, dry_run).await?;

    match agent.process(url, username, message, dry_run).await {
        Ok(ProcessOutcome::Posted {
            platform,
            post_url,
            message,
            ..
        }) => {
            println!("posted announcement for {platform} content: {post_url}");
            println!("{message}");
            Ok(())
        }
        Ok(ProcessOutcome::DryRunRecorded { platform, message }) => {
            println!("dry-run: would post this announcement for {platform} content:");
            println!("{message}");
            Ok(())
        }
        Err(AgentError::AlreadyProcessed { url }) => {
            println!("{url} was already posted successfully; nothing to do");
            Ok(())
        }
        Err(e) => {
            if let Some(retry_after) = e.retry_after_secs() {
                anyhow::bail!("{e}; retry in {retry_after}s");
            }
            Err(e.into())
        }
    }
}

/// Handle `batch`: process every URL in `file` and print the summary.
///
/// Per-item failures are absorbed into the failed count by the driver; only
/// setup problems (credentials, unreadable file) abort the run.
///
/// # Errors
///
/// Returns an error for missing/rejected credentials or an unreadable file.
pub(crate) async fn run_batch_file(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    file: &Path,
    delay: Option<u64>,
    username: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read URL file {}", file.display()))?;
    let urls = parse_url_lines(&content);
    if urls.is_empty() {
        println!("no URLs found in {}", file.display());
        return Ok(());
    }

    tracing::info!(count = urls.len(), file = %file.display(), "processing URL batch");

    let agent = build_agent(pool, config, dry_run).await?;
    let delay_secs = delay.unwrap_or(config.post_delay_secs);

    let summary = agent
        .run_batch(&urls, username, delay_secs, dry_run)
        .await;

    println!(
        "batch complete: {} processed, {} skipped, {} failed",
        summary.processed, summary.skipped, summary.failed
    );
    Ok(())
}

/// One URL per line; blank lines and `#` comments are ignored.
fn parse_url_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_url_lines;

    #[test]
    fn parse_url_lines_skips_blanks_and_comments() {
        let content =
            "\n# header comment\nhttps://example.com/a\n\n  https://example.com/b  \n# trailing\n";
        assert_eq!(
            parse_url_lines(content),
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string(),
            ]
        );
    }

    #[test]
    fn parse_url_lines_empty_input_yields_nothing() {
        assert!(parse_url_lines("").is_empty());
        assert!(parse_url_lines("# only comments\n\n").is_empty());
    }
}
