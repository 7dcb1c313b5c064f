//! Ingestion orchestration.
//!
//! Sequences the full refresh flow for one subreddit: fetch metadata →
//! fetch one page of posts → optionally fetch, flatten, and store each
//! post's comment tree. A comment-tree failure for one post is logged and
//! the run continues with the next post; a failure fetching the subreddit
//! or the post listing aborts the run. The bulk refresh across all tracked
//! subreddits applies the same accumulate-and-continue policy per
//! subreddit.

use tracing::{debug, warn};

use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::flatten::flatten_comments;
use crate::models::{Comment, CommentSort, Post, PostSort, RefreshSummary, Subreddit, Timeframe};
use crate::reddit::{
    clean_subreddit_name, short_id, validate_subreddit_name, ListingOptions, RedditClient,
};
use crate::store::Store;

/// Options for one refresh run.
#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub listing: ListingOptions,
    /// Also refresh the comment tree of every fetched post.
    pub with_comments: bool,
    pub comment_sort: CommentSort,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            listing: ListingOptions::default(),
            with_comments: false,
            comment_sort: CommentSort::Confidence,
        }
    }
}

impl RefreshOptions {
    /// Resolve CLI/API string inputs against configured defaults. Invalid
    /// values fail with a validation error before anything else runs.
    pub fn resolve(
        config: &Config,
        sort: Option<&str>,
        timeframe: Option<&str>,
        limit: Option<u32>,
        with_comments: bool,
        comment_sort: Option<&str>,
    ) -> Result<Self> {
        let listing = ListingOptions {
            sort: PostSort::parse(sort.unwrap_or(&config.ingest.post_sort))?,
            timeframe: Timeframe::parse(timeframe.unwrap_or(&config.ingest.timeframe))?,
            limit: limit.unwrap_or(config.ingest.post_limit),
        };
        listing.validate()?;

        Ok(Self {
            listing,
            with_comments,
            comment_sort: CommentSort::parse(comment_sort.unwrap_or(&config.ingest.comment_sort))?,
        })
    }
}

/// Orchestrates Reddit fetches, flattening, and storage. Holds explicitly
/// constructed client and store handles; no process-wide state.
pub struct Ingestor {
    client: RedditClient,
    store: Store,
}

impl Ingestor {
    pub fn new(client: RedditClient, store: Store) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fetch and store metadata for a subreddit by name. Accepts an
    /// optional `r/` prefix; the cleaned name must be a valid subreddit
    /// name.
    pub async fn add_subreddit(&self, raw_name: &str) -> Result<Subreddit> {
        let name = clean_subreddit_name(raw_name);
        validate_subreddit_name(&name)?;

        let subreddit = self.client.fetch_subreddit(&name).await?;
        self.store.upsert_subreddit(&subreddit).await?;
        Ok(subreddit)
    }

    /// Refresh one page of posts for a tracked subreddit, optionally
    /// refreshing each post's comments.
    ///
    /// Options are validated before any lookup or network call. The
    /// subreddit must already be stored. A per-post comment failure is
    /// logged and skipped; storage failures always abort.
    pub async fn refresh_posts(
        &self,
        subreddit_id: &str,
        options: &RefreshOptions,
    ) -> Result<Vec<Post>> {
        options.listing.validate()?;

        let subreddit = self.store.subreddit(subreddit_id).await?.ok_or_else(|| {
            Error::NotFound(format!("subreddit {} is not tracked", subreddit_id))
        })?;

        let posts = self
            .client
            .fetch_posts(&subreddit.name, &subreddit.id, &options.listing)
            .await?;

        for post in &posts {
            self.store.upsert_post(post).await?;
        }

        if options.with_comments {
            for post in &posts {
                match self
                    .fetch_and_store_comments(&subreddit.name, post, options.comment_sort)
                    .await
                {
                    Ok(count) => {
                        debug!(post = %post.id, comments = count, "comment tree refreshed")
                    }
                    Err(Error::Upstream(cause)) => {
                        warn!(post = %post.id, error = %cause, "comment refresh failed, continuing");
                    }
                    Err(other) => return Err(other),
                }
            }
        }

        Ok(posts)
    }

    /// Refresh the comment tree for a stored post. Fails with `NotFound`
    /// before issuing any network request when the post (or its subreddit)
    /// is absent from storage.
    pub async fn refresh_comments(&self, post_id: &str, sort: CommentSort) -> Result<Vec<Comment>> {
        let post = self
            .store
            .post(post_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("post {} is not stored", post_id)))?;

        let subreddit = self.store.subreddit(&post.subreddit_id).await?.ok_or_else(|| {
            Error::NotFound(format!("subreddit {} is not tracked", post.subreddit_id))
        })?;

        self.fetch_and_store_comment_list(&subreddit.name, &post, sort)
            .await
    }

    /// Posts-only refresh of every tracked subreddit. A per-subreddit
    /// upstream failure is logged and the remaining subreddits still
    /// refresh; the summary counts only successful ones.
    pub async fn refresh_all(&self, options: &RefreshOptions) -> Result<RefreshSummary> {
        options.listing.validate()?;

        let subreddits = self.store.all_subreddits().await?;
        let posts_only = RefreshOptions {
            with_comments: false,
            ..options.clone()
        };

        let mut summary = RefreshSummary::default();
        for subreddit in subreddits {
            match self.refresh_posts(&subreddit.id, &posts_only).await {
                Ok(posts) => {
                    summary.subreddits_updated += 1;
                    summary.posts_found += posts.len() as u64;
                }
                Err(Error::Upstream(cause)) => {
                    warn!(subreddit = %subreddit.name, error = %cause, "refresh failed, continuing");
                }
                Err(other) => return Err(other),
            }
        }

        Ok(summary)
    }

    async fn fetch_and_store_comments(
        &self,
        subreddit_name: &str,
        post: &Post,
        sort: CommentSort,
    ) -> Result<usize> {
        let comments = self
            .fetch_and_store_comment_list(subreddit_name, post, sort)
            .await?;
        Ok(comments.len())
    }

    async fn fetch_and_store_comment_list(
        &self,
        subreddit_name: &str,
        post: &Post,
        sort: CommentSort,
    ) -> Result<Vec<Comment>> {
        let nodes = self
            .client
            .fetch_comment_tree(subreddit_name, short_id(&post.id), sort)
            .await?;

        let comments = flatten_comments(&post.id, &nodes);
        for comment in &comments {
            self.store.upsert_comment(comment).await?;
        }
        Ok(comments)
    }
}

/// Resolve CLI input to a stored subreddit: by canonical name first, then
/// by raw ID.
pub async fn resolve_subreddit(store: &Store, name_or_id: &str) -> Result<Subreddit> {
    let name = clean_subreddit_name(name_or_id);
    if let Some(subreddit) = store.subreddit_by_name(&name).await? {
        return Ok(subreddit);
    }
    if let Some(subreddit) = store.subreddit(name_or_id).await? {
        return Ok(subreddit);
    }
    Err(Error::NotFound(format!(
        "subreddit '{}' is not tracked; run `subscope add {}` first",
        name, name
    )))
}

fn build_ingestor(config: &Config, pool: sqlx::SqlitePool) -> Result<Ingestor> {
    let client = RedditClient::new(&config.reddit)?;
    Ok(Ingestor::new(client, Store::new(pool)))
}

// ============ CLI entry points ============

pub async fn run_add(config: &Config, name: &str) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let ingestor = build_ingestor(config, pool.clone())?;

    let subreddit = ingestor.add_subreddit(name).await?;

    println!("add r/{}", subreddit.name);
    println!("  id: {}", subreddit.id);
    println!("  subscribers: {}", subreddit.subscriber_count);
    println!("ok");

    pool.close().await;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn run_refresh(
    config: &Config,
    name_or_id: &str,
    sort: Option<&str>,
    timeframe: Option<&str>,
    limit: Option<u32>,
    with_comments: bool,
    comment_sort: Option<&str>,
) -> anyhow::Result<()> {
    let options = RefreshOptions::resolve(config, sort, timeframe, limit, with_comments, comment_sort)?;

    let pool = db::connect(config).await?;
    let ingestor = build_ingestor(config, pool.clone())?;

    let subreddit = resolve_subreddit(ingestor.store(), name_or_id).await?;
    let posts = ingestor.refresh_posts(&subreddit.id, &options).await?;

    println!("refresh r/{}", subreddit.name);
    println!("  posts: {}", posts.len());
    if options.with_comments {
        println!("  comment trees refreshed for each post");
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

pub async fn run_refresh_all(
    config: &Config,
    sort: Option<&str>,
    timeframe: Option<&str>,
    limit: Option<u32>,
) -> anyhow::Result<()> {
    let options = RefreshOptions::resolve(config, sort, timeframe, limit, false, None)?;

    let pool = db::connect(config).await?;
    let ingestor = build_ingestor(config, pool.clone())?;

    let summary = ingestor.refresh_all(&options).await?;

    println!("refresh all");
    println!("  subreddits updated: {}", summary.subreddits_updated);
    println!("  posts found: {}", summary.posts_found);
    println!("ok");

    pool.close().await;
    Ok(())
}

pub async fn run_comments(config: &Config, post_id: &str, sort: Option<&str>) -> anyhow::Result<()> {
    let sort = CommentSort::parse(sort.unwrap_or(&config.ingest.comment_sort))?;

    let pool = db::connect(config).await?;
    let ingestor = build_ingestor(config, pool.clone())?;

    let comments = ingestor.refresh_comments(post_id, sort).await?;

    println!("comments {}", post_id);
    println!("  stored: {}", comments.len());
    println!("ok");

    pool.close().await;
    Ok(())
}
