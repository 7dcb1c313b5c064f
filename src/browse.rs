//! Read-only listing commands over stored data.

use crate::config::Config;
use crate::db;
use crate::ingest::resolve_subreddit;
use crate::store::Store;

pub async fn run_subreddits(config: &Config, limit: i64, offset: i64) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store = Store::new(pool.clone());

    let subreddits = store.list_subreddits(limit, offset).await?;

    if subreddits.is_empty() {
        println!("No subreddits.");
        pool.close().await;
        return Ok(());
    }

    for sub in &subreddits {
        println!("r/{}", sub.name);
        println!("    id:          {}", sub.id);
        println!("    subscribers: {}", sub.subscriber_count);
        if !sub.description.is_empty() {
            let excerpt: String = sub.description.chars().take(120).collect();
            println!("    about:       {}", excerpt.replace('\n', " "));
        }
        println!();
    }

    pool.close().await;
    Ok(())
}

pub async fn run_posts(
    config: &Config,
    name_or_id: &str,
    sort_by: &str,
    order: &str,
    limit: i64,
    offset: i64,
) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store = Store::new(pool.clone());

    let subreddit = resolve_subreddit(&store, name_or_id).await?;
    let posts = store
        .list_posts(&subreddit.id, sort_by, order, limit, offset)
        .await?;

    if posts.is_empty() {
        println!("No posts stored for r/{}.", subreddit.name);
        pool.close().await;
        return Ok(());
    }

    println!("posts in r/{} ({})", subreddit.name, posts.len());
    for post in &posts {
        println!("[{}] {}", post.score, post.title);
        println!("    id: {}  comments: {}  author: {}", post.id, post.comment_count, post.author);
    }

    pool.close().await;
    Ok(())
}
