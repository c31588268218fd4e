//! Reporting command handlers: `stats` and `search`.

use suremark_core::Platform;

/// Handle `stats`: print overall counts, time windows, and per-platform /
/// per-username breakdowns.
///
/// # Errors
///
/// Returns an error if any aggregate query fails.
pub(crate) async fn run_stats(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let totals = suremark_db::count_totals(pool).await?;
    let windows = suremark_db::count_success_windows(pool).await?;
    let platforms = suremark_db::count_by_platform(pool).await?;
    let usernames = suremark_db::count_by_username(pool).await?;

    println!(
        "processed posts: {} total ({} posted, {} dry-run/failed)",
        totals.total, totals.succeeded, totals.failed
    );
    if totals.total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let rate = totals.succeeded as f64 / totals.total as f64 * 100.0;
        println!("success rate: {rate:.1}%");
    }
    println!(
        "posted today: {} | this week: {} | this month: {}",
        windows.today, windows.this_week, windows.this_month
    );

    if !platforms.is_empty() {
        println!("\nby platform:");
        for row in &platforms {
            println!("  {:<12} {}", row.platform, row.count);
        }
    }

    if !usernames.is_empty() {
        println!("\nby username:");
        for row in &usernames {
            println!("  {:<20} {}", row.suremark_username, row.count);
        }
    }

    Ok(())
}

/// Handle `search`: free-text query with optional platform and username
/// filters.
///
/// # Errors
///
/// Returns an error for an unknown platform filter or a failed query.
pub(crate) async fn run_search(
    pool: &sqlx::PgPool,
    query: &str,
    platform: Option<&str>,
    username: Option<&str>,
    limit: i64,
) -> anyhow::Result<()> {
    if let Some(tag) = platform {
        anyhow::ensure!(
            Platform::parse(tag).is_some(),
            "unknown platform \"{tag}\"; expected twitter, youtube, instagram, or website"
        );
    }

    let rows = suremark_db::search_processed_posts(pool, query, platform, username, limit).await?;

    if rows.is_empty() {
        println!("no processed posts match \"{query}\"");
        return Ok(());
    }

    println!("{} match(es) for \"{query}\":", rows.len());
    for row in &rows {
        let marker = if row.success { "posted" } else { "dry-run" };
        println!(
            "  [{marker}] {} {} — {}",
            row.platform,
            row.processed_at.format("%Y-%m-%d %H:%M"),
            row.url
        );
        if let Some(title) = &row.title {
            println!("           {title}");
        }
    }

    Ok(())
}
