//! Stored-post search for the CLI.

use crate::config::Config;
use crate::db;
use crate::ingest::resolve_subreddit;
use crate::store::Store;

pub async fn run_search(
    config: &Config,
    query: &str,
    subreddit: Option<&str>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = Store::new(pool.clone());

    let scope = match subreddit {
        Some(name_or_id) => Some(resolve_subreddit(&store, name_or_id).await?.id),
        None => None,
    };

    let posts = store
        .search_posts(query, scope.as_deref(), limit, offset)
        .await?;

    if posts.is_empty() {
        println!("No results.");
        pool.close().await;
        return Ok(());
    }

    for (i, post) in posts.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(post.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        println!("{}. [{}] {}", i + 1, post.score, post.title);
        println!("    author: {}", post.author);
        println!("    posted: {}", date);
        println!("    id: {}", post.id);
        if let Some(ref body) = post.self_text {
            let excerpt: String = body.chars().take(160).collect();
            println!("    excerpt: \"{}\"", excerpt.replace('\n', " "));
        }
        println!();
    }

    pool.close().await;
    Ok(())
}
