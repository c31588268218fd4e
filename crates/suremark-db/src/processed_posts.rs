//! Database operations for the `processed_posts` table.

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `processed_posts` table.
///
/// `url` is unique across the table; a row with `success = true` corresponds
/// to a real remote post and is never overwritten by a later attempt.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessedPostRow {
    pub id: i64,
    pub public_id: Uuid,
    pub url: String,
    pub platform: String,
    pub processed_at: DateTime<Utc>,
    pub suremark_username: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub success: bool,
    pub post_id: Option<String>,
    pub post_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Borrowed insert payload for one processed post.
pub struct NewProcessedPost<'a> {
    pub url: &'a str,
    pub platform: &'a str,
    pub processed_at: DateTime<Utc>,
    pub suremark_username: Option<&'a str>,
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub author: Option<&'a str>,
    pub success: bool,
    pub post_id: Option<&'a str>,
    pub post_url: Option<&'a str>,
    pub posted_at: Option<DateTime<Utc>>,
}

/// Result of an insert attempt.
///
/// A unique-index conflict on `url` is data, not an error: call sites decide
/// whether the conflict is a benign "someone got there first" signal or
/// something to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(i64),
    DuplicateUrl,
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Insert a processed-post row.
///
/// Returns [`InsertOutcome::DuplicateUrl`] when a row for the same `url`
/// already exists (any success state), instead of surfacing the database
/// error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on any failure other than the unique-URL
/// conflict.
pub async fn insert_processed_post(
    pool: &PgPool,
    post: &NewProcessedPost<'_>,
) -> Result<InsertOutcome, DbError> {
    let metadata = json!({});

    let result = sqlx::query_scalar::<_, i64>(
        "INSERT INTO processed_posts \
             (url, platform, processed_at, suremark_username, title, content, \
              author, success, post_id, post_url, posted_at, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6, \
                 $7, $8, $9, $10, $11, $12::jsonb) \
         RETURNING id",
    )
    .bind(post.url)
    .bind(post.platform)
    .bind(post.processed_at)
    .bind(post.suremark_username)
    .bind(post.title)
    .bind(post.content)
    .bind(post.author)
    .bind(post.success)
    .bind(post.post_id)
    .bind(post.post_url)
    .bind(post.posted_at)
    .bind(metadata)
    .fetch_one(pool)
    .await;

    match result {
        Ok(id) => Ok(InsertOutcome::Inserted(id)),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Ok(InsertOutcome::DuplicateUrl)
        }
        Err(e) => Err(e.into()),
    }
}

/// Promote an existing non-success row for `url` to a successful post,
/// attaching the remote post reference.
///
/// Rows already marked `success = true` are never touched — the guard in the
/// WHERE clause preserves the immutability of recorded successes, so the
/// losing side of a concurrent race updates nothing and returns `false`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_success(
    pool: &PgPool,
    url: &str,
    post_id: &str,
    post_url: &str,
    posted_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let rows_affected = sqlx::query(
        "UPDATE processed_posts SET \
             success   = TRUE, \
             post_id   = $2, \
             post_url  = $3, \
             posted_at = $4 \
         WHERE url = $1 AND success = FALSE",
    )
    .bind(url)
    .bind(post_id)
    .bind(post_url)
    .bind(posted_at)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

/// Attach the remote post reference to an existing row without changing its
/// success state. Out-of-band repair operation; the pipeline itself records
/// references at insert time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn attach_post_ref(
    pool: &PgPool,
    url: &str,
    post_id: &str,
    post_url: &str,
    posted_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let rows_affected = sqlx::query(
        "UPDATE processed_posts SET \
             post_id   = $2, \
             post_url  = $3, \
             posted_at = $4 \
         WHERE url = $1",
    )
    .bind(url)
    .bind(post_id)
    .bind(post_url)
    .bind(posted_at)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected > 0)
}

/// Delete the row for `url`. Out-of-band cleanup only; the pipeline never
/// deletes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_processed_post(pool: &PgPool, url: &str) -> Result<bool, DbError> {
    let rows_affected = sqlx::query("DELETE FROM processed_posts WHERE url = $1")
        .bind(url)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(rows_affected > 0)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

const ROW_COLUMNS: &str = "id, public_id, url, platform, processed_at, suremark_username, \
                           title, content, author, success, post_id, post_url, posted_at, \
                           metadata, created_at";

/// The successful row for `url`, if one exists.
///
/// Only `success = true` rows count — dry-run and failed records never block
/// a retry.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_successful_by_url(
    pool: &PgPool,
    url: &str,
) -> Result<Option<ProcessedPostRow>, DbError> {
    let row = sqlx::query_as::<_, ProcessedPostRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM processed_posts WHERE url = $1 AND success = TRUE"
    ))
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// The most recently processed rows, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<ProcessedPostRow>, DbError> {
    let rows = sqlx::query_as::<_, ProcessedPostRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM processed_posts \
         ORDER BY processed_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Free-text search across title, content, and author, newest first, with
/// optional platform and username filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_processed_posts(
    pool: &PgPool,
    query: &str,
    platform_filter: Option<&str>,
    username_filter: Option<&str>,
    limit: i64,
) -> Result<Vec<ProcessedPostRow>, DbError> {
    let rows = sqlx::query_as::<_, ProcessedPostRow>(&format!(
        "SELECT {ROW_COLUMNS} FROM processed_posts \
         WHERE (title ILIKE '%' || $1 || '%' \
             OR content ILIKE '%' || $1 || '%' \
             OR author ILIKE '%' || $1 || '%') \
           AND ($2::TEXT IS NULL OR platform = $2) \
           AND ($3::TEXT IS NULL OR suremark_username = $3) \
         ORDER BY processed_at DESC, id DESC LIMIT $4"
    ))
    .bind(query)
    .bind(platform_filter)
    .bind(username_filter)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
