use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Create subreddits table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subreddits (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            display_name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            subscriber_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            is_over_18 INTEGER NOT NULL DEFAULT 0,
            url TEXT NOT NULL,
            icon_url TEXT,
            last_updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create posts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            subreddit_id TEXT NOT NULL,
            title TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '[deleted]',
            created_at INTEGER NOT NULL,
            score INTEGER NOT NULL DEFAULT 0,
            upvote_ratio REAL NOT NULL DEFAULT 0.0,
            comment_count INTEGER NOT NULL DEFAULT 0,
            permalink TEXT NOT NULL,
            url TEXT NOT NULL,
            is_self INTEGER NOT NULL DEFAULT 0,
            self_text TEXT,
            last_updated INTEGER NOT NULL,
            FOREIGN KEY (subreddit_id) REFERENCES subreddits(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create comments table. parent_id points at either the owning post or
    // another comment in the same tree, so it carries no FOREIGN KEY of its
    // own; the flattener guarantees the linkage.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            parent_id TEXT NOT NULL,
            author TEXT NOT NULL DEFAULT '[deleted]',
            body TEXT NOT NULL,
            score INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            permalink TEXT NOT NULL DEFAULT '',
            last_updated INTEGER NOT NULL,
            FOREIGN KEY (post_id) REFERENCES posts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_subreddits_name ON subreddits(name)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_subreddit_id ON posts(subreddit_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id)")
        .execute(pool)
        .await?;

    Ok(())
}
