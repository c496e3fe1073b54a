use anyhow::Context;
use clap::{Parser, Subcommand};
use reddit_client::{Credentials, RedditSession};
use scour_core::{BatchSummary, CleanerConfig};
use scour_pipeline::{BackupLog, Cleaner, MediaArchiver};
use std::path::PathBuf;

const USER_AGENT: &str = concat!("scour/", env!("CARGO_PKG_VERSION"), " (content retirement)");
const BACKUP_FILE: &str = "deleted_content.txt";
const MEDIA_DIR: &str = "post_media";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Retire your Reddit comment and post history",
    long_about = "Walks your Reddit history newest-first and retires matching items: \
                  each one is backed up to an audit log, post media is archived, the \
                  body is overwritten, and the item is deleted, with a randomized \
                  pause between mutations."
)]
struct Cli {
    /// Credentials file: client id, client secret, username, password,
    /// one per line.
    #[arg(long, default_value = "credentials.txt")]
    credentials: PathBuf,

    /// Configuration file; created with defaults on first run.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Preview what would be retired without touching the account.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Remove comments older than the given number of days
    OldComments {
        #[arg(long)]
        days: i64,
    },
    /// Remove comments with negative karma
    NegativeKarma,
    /// Remove comments with at most 1 karma and no replies
    LowEngagement,
    /// Remove every post
    AllPosts,
    /// Remove posts older than the given number of days
    OldPosts {
        #[arg(long)]
        days: i64,
    },
    /// Remove posts scored below the given threshold
    LowKarma {
        #[arg(long)]
        threshold: i64,
    },
    /// Remove comments and posts from one subreddit
    Subreddit { name: String },
    /// Remove comments and posts containing a keyword
    Keyword { keyword: String },
    /// Print the active configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scour=info,scour_pipeline=info,reddit_client=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config =
        CleanerConfig::load_or_init(&cli.config).context("loading configuration")?;
    if cli.dry_run {
        config.dry_run = true;
    }

    if matches!(cli.command, Commands::ShowConfig) {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let credentials =
        Credentials::from_file(&cli.credentials).context("loading credentials")?;
    let session = RedditSession::new(credentials, USER_AGENT)?;
    session
        .login()
        .await
        .context("authenticating with Reddit")?;
    tracing::info!(user = session.username(), dry_run = config.dry_run, "session ready");

    let cleaner = Cleaner::new(
        session,
        config,
        BackupLog::new(BACKUP_FILE),
        MediaArchiver::new(MEDIA_DIR),
    );

    let summary = match cli.command {
        Commands::OldComments { days } => cleaner.remove_old_comments(days).await?,
        Commands::NegativeKarma => cleaner.remove_negative_karma().await?,
        Commands::LowEngagement => cleaner.remove_low_engagement().await?,
        Commands::AllPosts => cleaner.remove_all_posts().await?,
        Commands::OldPosts { days } => cleaner.remove_old_posts(days).await?,
        Commands::LowKarma { threshold } => cleaner.remove_low_karma_posts(threshold).await?,
        Commands::Subreddit { name } => cleaner.remove_by_subreddit(&name).await?,
        Commands::Keyword { keyword } => cleaner.remove_by_keyword(&keyword).await?,
        Commands::ShowConfig => unreachable!("handled above"),
    };

    print_summary(&summary, cleaner.config().dry_run);
    Ok(())
}

fn print_summary(summary: &BatchSummary, dry_run: bool) {
    let verb = if dry_run { "would be retired" } else { "retired" };
    println!(
        "processed {} items: {} {verb}, {} skipped, {} failed",
        summary.processed, summary.retired, summary.skipped, summary.failed
    );
}
