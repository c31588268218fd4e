mod publish;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "suremark")]
#[command(about = "SureMark verification announcement agent")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Post a verification announcement for a single URL
    Tweet {
        /// URL of the post or article to announce
        #[arg(long)]
        url: String,

        /// Custom message; supports {suremark_username} and {dashboard_url}
        #[arg(long)]
        message: Option<String>,

        /// SureMark username to attribute the verification to
        #[arg(long)]
        username: Option<String>,

        /// Compose and record without posting to X
        #[arg(long)]
        dry_run: bool,
    },
    /// Process a file of URLs, one per line
    Batch {
        /// File with one URL per line; blank lines and # comments are ignored
        #[arg(long)]
        file: PathBuf,

        /// Seconds to wait between live posts
        #[arg(long)]
        delay: Option<u64>,

        /// SureMark username to attribute the verifications to
        #[arg(long)]
        username: Option<String>,

        /// Compose and record without posting to X
        #[arg(long)]
        dry_run: bool,
    },
    /// Watch accounts and hashtags for URLs to verify
    Monitor,
    /// Show aggregate processing statistics
    Stats,
    /// Search processed posts
    Search {
        /// Free text matched against title, content, and author
        #[arg(long)]
        query: String,

        /// Restrict to one platform (twitter, youtube, instagram, website)
        #[arg(long)]
        platform: Option<String>,

        /// Restrict to one SureMark username
        #[arg(long)]
        username: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = suremark_core::load_app_config_from_env()?;

    let pool = suremark_db::connect_pool(
        &config.database_url,
        suremark_db::PoolConfig::from_app_config(&config),
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to connect to the store: {e}"))?;

    let result = match cli.command {
        Commands::Tweet {
            url,
            message,
            username,
            dry_run,
        } => {
            publish::run_tweet(
                &pool,
                &config,
                &url,
                message.as_deref(),
                username.as_deref(),
                dry_run,
            )
            .await
        }
        Commands::Batch {
            file,
            delay,
            username,
            dry_run,
        } => {
            publish::run_batch_file(&pool, &config, &file, delay, username.as_deref(), dry_run)
                .await
        }
        Commands::Monitor => {
            println!(
                "monitor is not implemented: account and hashtag watching is out of scope \
                 for this build; use `tweet` or `batch` to process URLs directly"
            );
            Ok(())
        }
        Commands::Stats => report::run_stats(&pool).await,
        Commands::Search {
            query,
            platform,
            username,
            limit,
        } => {
            report::run_search(
                &pool,
                &query,
                platform.as_deref(),
                username.as_deref(),
                limit,
            )
            .await
        }
        Commands::Migrate => {
            suremark_db::run_migrations(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("migration failed: {e}"))?;
            println!("migrations are up to date");
            Ok(())
        }
    };

    pool.close().await;

    result
}
