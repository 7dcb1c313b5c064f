//! # subscope CLI
//!
//! The `subscope` binary is the primary interface for the toolkit. It
//! provides commands for database initialization, Reddit ingestion, stored
//! data browsing and search, pain-point extraction, content-idea
//! generation, and starting the JSON API server.
//!
//! ## Usage
//!
//! ```bash
//! subscope --config ./config/subscope.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `subscope init` | Create the SQLite database and run schema migrations |
//! | `subscope add <name>` | Track a subreddit and fetch its metadata |
//! | `subscope refresh <name>` | Fetch one page of posts (optionally comments) |
//! | `subscope refresh-all` | Posts-only refresh of every tracked subreddit |
//! | `subscope comments <post-id>` | Refresh the comment tree for one post |
//! | `subscope subreddits` | List tracked subreddits |
//! | `subscope posts <name>` | List stored posts for a subreddit |
//! | `subscope search "<query>"` | Search stored post titles and bodies |
//! | `subscope pain-points <name>` | Extract pain points from stored text |
//! | `subscope ideas <name>` | Generate content ideas from pain points |
//! | `subscope serve` | Start the JSON API server |

mod analyze;
mod browse;
mod config;
mod db;
mod error;
mod flatten;
mod ideas;
mod ingest;
mod migrate;
mod models;
mod reddit;
mod search;
mod server;
mod store;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// subscope — a subreddit ingestion and audience-insight toolkit.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/subscope.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "subscope",
    about = "subscope — a subreddit ingestion and audience-insight toolkit",
    version,
    long_about = "subscope ingests public Reddit data (subreddit metadata, post listings, nested \
    comment trees) into SQLite, flattens comment trees into parent-linked rows, and layers \
    rule-based pain-point extraction and template-based content-idea generation on top, \
    exposed via this CLI and a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/subscope.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (subreddits, posts, comments). Idempotent — running it multiple
    /// times is safe.
    Init,

    /// Track a subreddit: fetch its metadata and store it.
    ///
    /// Accepts a bare name (`rust`) or a prefixed one (`r/rust`).
    Add {
        /// Subreddit name.
        name: String,
    },

    /// Fetch one page of posts for a tracked subreddit.
    ///
    /// The subreddit must have been added first. With `--comments`, each
    /// post's comment tree is fetched, flattened, and stored as well; a
    /// failure on one post's comments is logged and the run continues.
    Refresh {
        /// Subreddit name or ID.
        subreddit: String,

        /// Listing sort: hot, new, top, or rising.
        #[arg(long)]
        sort: Option<String>,

        /// Timeframe for sort=top: hour, day, week, month, year, or all.
        #[arg(long)]
        timeframe: Option<String>,

        /// Number of posts to fetch (1-100).
        #[arg(long)]
        limit: Option<u32>,

        /// Also refresh each post's comment tree.
        #[arg(long)]
        comments: bool,

        /// Comment tree sort: confidence, top, new, controversial, old,
        /// random, or qa.
        #[arg(long)]
        comment_sort: Option<String>,
    },

    /// Posts-only refresh of every tracked subreddit.
    ///
    /// A failure on one subreddit is logged and the others still refresh;
    /// the summary counts only successful ones.
    RefreshAll {
        /// Listing sort: hot, new, top, or rising.
        #[arg(long)]
        sort: Option<String>,

        /// Timeframe for sort=top.
        #[arg(long)]
        timeframe: Option<String>,

        /// Number of posts to fetch per subreddit (1-100).
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Refresh the comment tree for one stored post.
    Comments {
        /// Post ID (e.g. `t3_abc123`).
        post_id: String,

        /// Comment tree sort: confidence, top, new, controversial, old,
        /// random, or qa.
        #[arg(long)]
        sort: Option<String>,
    },

    /// List tracked subreddits, most subscribed first.
    Subreddits {
        #[arg(long, default_value_t = 25)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// List stored posts for a subreddit.
    Posts {
        /// Subreddit name or ID.
        subreddit: String,

        /// Sort field: created_at, score, comment_count, or title.
        /// Unrecognized fields fall back to created_at.
        #[arg(long, default_value = "created_at")]
        sort_by: String,

        /// Sort order: asc or desc.
        #[arg(long, default_value = "desc")]
        order: String,

        #[arg(long, default_value_t = 25)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Search stored post titles and self-texts.
    Search {
        /// The search query string.
        query: String,

        /// Restrict results to one subreddit (name or ID).
        #[arg(long)]
        subreddit: Option<String>,

        #[arg(long, default_value_t = 25)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Extract pain points from a subreddit's stored posts and comments.
    PainPoints {
        /// Subreddit name or ID.
        subreddit: String,
    },

    /// Generate content ideas from a subreddit's pain points.
    Ideas {
        /// Subreddit name or ID.
        subreddit: String,

        /// Target platform: tiktok, instagram, or all.
        #[arg(long, default_value = "all")]
        platform: String,
    },

    /// Start the JSON API server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// subscope API endpoints.
    Serve,
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Add { name } => {
            ingest::run_add(&cfg, &name).await?;
        }
        Commands::Refresh {
            subreddit,
            sort,
            timeframe,
            limit,
            comments,
            comment_sort,
        } => {
            ingest::run_refresh(
                &cfg,
                &subreddit,
                sort.as_deref(),
                timeframe.as_deref(),
                limit,
                comments,
                comment_sort.as_deref(),
            )
            .await?;
        }
        Commands::RefreshAll {
            sort,
            timeframe,
            limit,
        } => {
            ingest::run_refresh_all(&cfg, sort.as_deref(), timeframe.as_deref(), limit).await?;
        }
        Commands::Comments { post_id, sort } => {
            ingest::run_comments(&cfg, &post_id, sort.as_deref()).await?;
        }
        Commands::Subreddits { limit, offset } => {
            browse::run_subreddits(&cfg, limit, offset).await?;
        }
        Commands::Posts {
            subreddit,
            sort_by,
            order,
            limit,
            offset,
        } => {
            browse::run_posts(&cfg, &subreddit, &sort_by, &order, limit, offset).await?;
        }
        Commands::Search {
            query,
            subreddit,
            limit,
            offset,
        } => {
            search::run_search(&cfg, &query, subreddit.as_deref(), limit, offset).await?;
        }
        Commands::PainPoints { subreddit } => {
            analyze::run_pain_points(&cfg, &subreddit).await?;
        }
        Commands::Ideas {
            subreddit,
            platform,
        } => {
            ideas::run_ideas(&cfg, &subreddit, &platform).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
