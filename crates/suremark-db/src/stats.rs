//! Aggregate queries over `processed_posts` for the `stats` command.

use sqlx::PgPool;

use crate::DbError;

/// Overall row counts.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ProcessedTotals {
    pub total: i64,
    pub succeeded: i64,
    pub failed: i64,
}

/// Successful posts per platform.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlatformCount {
    pub platform: String,
    pub count: i64,
}

/// Successful posts per attributed SureMark username.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsernameCount {
    pub suremark_username: String,
    pub count: i64,
}

/// Successful posts inside the current day / ISO week / month.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct SuccessWindows {
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
}

/// Total, succeeded, and failed/dry-run row counts.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_totals(pool: &PgPool) -> Result<ProcessedTotals, DbError> {
    let totals = sqlx::query_as::<_, ProcessedTotals>(
        "SELECT COUNT(*) AS total, \
                COUNT(*) FILTER (WHERE success) AS succeeded, \
                COUNT(*) FILTER (WHERE NOT success) AS failed \
         FROM processed_posts",
    )
    .fetch_one(pool)
    .await?;

    Ok(totals)
}

/// Successful post counts grouped by platform, largest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_by_platform(pool: &PgPool) -> Result<Vec<PlatformCount>, DbError> {
    let rows = sqlx::query_as::<_, PlatformCount>(
        "SELECT platform, COUNT(*) AS count \
         FROM processed_posts \
         WHERE success \
         GROUP BY platform \
         ORDER BY count DESC, platform",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Successful post counts grouped by attributed username, largest first.
/// Rows without an attribution are excluded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_by_username(pool: &PgPool) -> Result<Vec<UsernameCount>, DbError> {
    let rows = sqlx::query_as::<_, UsernameCount>(
        "SELECT suremark_username, COUNT(*) AS count \
         FROM processed_posts \
         WHERE success AND suremark_username IS NOT NULL \
         GROUP BY suremark_username \
         ORDER BY count DESC, suremark_username",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Successful posts processed today, this week, and this month.
///
/// Window edges come from `date_trunc` in the database's time zone, matching
/// how `processed_at` is recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_success_windows(pool: &PgPool) -> Result<SuccessWindows, DbError> {
    let windows = sqlx::query_as::<_, SuccessWindows>(
        "SELECT \
             COUNT(*) FILTER (WHERE processed_at >= date_trunc('day', NOW())) AS today, \
             COUNT(*) FILTER (WHERE processed_at >= date_trunc('week', NOW())) AS this_week, \
             COUNT(*) FILTER (WHERE processed_at >= date_trunc('month', NOW())) AS this_month \
         FROM processed_posts \
         WHERE success",
    )
    .fetch_one(pool)
    .await?;

    Ok(windows)
}
