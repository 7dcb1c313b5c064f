//! SQLite-backed storage for subreddits, posts, and comments.
//!
//! All writes are idempotent upserts keyed by the platform ID: submitting
//! the same ID twice leaves one row reflecting the latest submission, with
//! `last_updated` refreshed. Values always reach SQLite as bound
//! parameters; the only text interpolated into a query string is a
//! whitelisted sort column.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::Result;
use crate::models::{Comment, Post, Subreddit};

/// Storage handle around a shared connection pool. Cheap to clone; intended
/// to be constructed once and passed into the orchestrator and server.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ============ Upserts ============

    pub async fn upsert_subreddit(&self, subreddit: &Subreddit) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO subreddits (id, name, display_name, description, subscriber_count, created_at, is_over_18, url, icon_url, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                display_name = excluded.display_name,
                description = excluded.description,
                subscriber_count = excluded.subscriber_count,
                created_at = excluded.created_at,
                is_over_18 = excluded.is_over_18,
                url = excluded.url,
                icon_url = excluded.icon_url,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&subreddit.id)
        .bind(&subreddit.name)
        .bind(&subreddit.display_name)
        .bind(&subreddit.description)
        .bind(subreddit.subscriber_count)
        .bind(subreddit.created_at)
        .bind(subreddit.is_over_18)
        .bind(&subreddit.url)
        .bind(&subreddit.icon_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn upsert_post(&self, post: &Post) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO posts (id, subreddit_id, title, author, created_at, score, upvote_ratio, comment_count, permalink, url, is_self, self_text, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                subreddit_id = excluded.subreddit_id,
                title = excluded.title,
                author = excluded.author,
                created_at = excluded.created_at,
                score = excluded.score,
                upvote_ratio = excluded.upvote_ratio,
                comment_count = excluded.comment_count,
                permalink = excluded.permalink,
                url = excluded.url,
                is_self = excluded.is_self,
                self_text = excluded.self_text,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&post.id)
        .bind(&post.subreddit_id)
        .bind(&post.title)
        .bind(&post.author)
        .bind(post.created_at)
        .bind(post.score)
        .bind(post.upvote_ratio)
        .bind(post.comment_count)
        .bind(&post.permalink)
        .bind(&post.url)
        .bind(post.is_self)
        .bind(&post.self_text)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn upsert_comment(&self, comment: &Comment) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, parent_id, author, body, score, created_at, permalink, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                post_id = excluded.post_id,
                parent_id = excluded.parent_id,
                author = excluded.author,
                body = excluded.body,
                score = excluded.score,
                created_at = excluded.created_at,
                permalink = excluded.permalink,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.post_id)
        .bind(&comment.parent_id)
        .bind(&comment.author)
        .bind(&comment.body)
        .bind(comment.score)
        .bind(comment.created_at)
        .bind(&comment.permalink)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ============ Lookups ============

    pub async fn subreddit(&self, id: &str) -> Result<Option<Subreddit>> {
        let row = sqlx::query("SELECT * FROM subreddits WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_subreddit(&r)))
    }

    pub async fn subreddit_by_name(&self, name: &str) -> Result<Option<Subreddit>> {
        let row = sqlx::query("SELECT * FROM subreddits WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_subreddit(&r)))
    }

    pub async fn post(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| row_to_post(&r)))
    }

    // ============ Listings ============

    pub async fn list_subreddits(&self, limit: i64, offset: i64) -> Result<Vec<Subreddit>> {
        let rows = sqlx::query(
            "SELECT * FROM subreddits ORDER BY subscriber_count DESC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_subreddit).collect())
    }

    /// Every tracked subreddit, most subscribed first. Used by the bulk
    /// refresh, which must visit all of them.
    pub async fn all_subreddits(&self) -> Result<Vec<Subreddit>> {
        let rows = sqlx::query("SELECT * FROM subreddits ORDER BY subscriber_count DESC, id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_subreddit).collect())
    }

    pub async fn list_posts(
        &self,
        subreddit_id: &str,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        // Only a whitelisted column name reaches the query string; values
        // are always bound.
        let order_clause = post_order_clause(sort_by, sort_order);
        let sql = format!(
            "SELECT * FROM posts WHERE subreddit_id = ? ORDER BY {} LIMIT ? OFFSET ?",
            order_clause
        );

        let rows = sqlx::query(&sql)
            .bind(subreddit_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(row_to_post).collect())
    }

    pub async fn list_comments(&self, post_id: &str, limit: i64, offset: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            "SELECT * FROM comments WHERE post_id = ? ORDER BY score DESC, created_at DESC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_comment).collect())
    }

    /// Substring search over post titles and self-texts, optionally scoped
    /// to one subreddit.
    pub async fn search_posts(
        &self,
        text: &str,
        subreddit_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>> {
        let pattern = format!("%{}%", escape_like(text));

        let rows = if let Some(subreddit_id) = subreddit_id {
            sqlx::query(
                r#"
                SELECT * FROM posts
                WHERE (title LIKE ? ESCAPE '\' OR self_text LIKE ? ESCAPE '\')
                  AND subreddit_id = ?
                ORDER BY score DESC, created_at DESC, id ASC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(&pattern)
            .bind(&pattern)
            .bind(subreddit_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT * FROM posts
                WHERE (title LIKE ? ESCAPE '\' OR self_text LIKE ? ESCAPE '\')
                ORDER BY score DESC, created_at DESC, id ASC
                LIMIT ? OFFSET ?
                "#,
            )
            .bind(&pattern)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows.iter().map(row_to_post).collect())
    }
}

/// Map a requested sort onto a safe ORDER BY clause. Unrecognized fields
/// fall back to `created_at DESC` wholesale; a recognized field with an
/// unrecognized order falls back to descending. Never errors.
fn post_order_clause(sort_by: &str, sort_order: &str) -> String {
    let column = match sort_by {
        "created_at" | "score" | "comment_count" | "title" => sort_by,
        _ => return "created_at DESC, id ASC".to_string(),
    };
    let direction = match sort_order {
        "asc" => "ASC",
        _ => "DESC",
    };
    format!("{} {}, id ASC", column, direction)
}

fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn row_to_subreddit(row: &SqliteRow) -> Subreddit {
    Subreddit {
        id: row.get("id"),
        name: row.get("name"),
        display_name: row.get("display_name"),
        description: row.get("description"),
        subscriber_count: row.get("subscriber_count"),
        created_at: row.get("created_at"),
        is_over_18: row.get("is_over_18"),
        url: row.get("url"),
        icon_url: row.get("icon_url"),
        last_updated: row.get("last_updated"),
    }
}

fn row_to_post(row: &SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        subreddit_id: row.get("subreddit_id"),
        title: row.get("title"),
        author: row.get("author"),
        created_at: row.get("created_at"),
        score: row.get("score"),
        upvote_ratio: row.get("upvote_ratio"),
        comment_count: row.get("comment_count"),
        permalink: row.get("permalink"),
        url: row.get("url"),
        is_self: row.get("is_self"),
        self_text: row.get("self_text"),
        last_updated: row.get("last_updated"),
    }
}

fn row_to_comment(row: &SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        parent_id: row.get("parent_id"),
        author: row.get("author"),
        body: row.get("body"),
        score: row.get("score"),
        created_at: row.get("created_at"),
        permalink: row.get("permalink"),
        last_updated: row.get("last_updated"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn test_store() -> Store {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        migrate::run_migrations(&pool).await.unwrap();
        Store::new(pool)
    }

    fn subreddit(id: &str, name: &str, subscribers: i64) -> Subreddit {
        Subreddit {
            id: id.to_string(),
            name: name.to_string(),
            display_name: format!("r/{}", name),
            description: String::new(),
            subscriber_count: subscribers,
            created_at: 1_600_000_000,
            is_over_18: false,
            url: format!("https://www.reddit.com/r/{}/", name),
            icon_url: None,
            last_updated: 0,
        }
    }

    fn post(id: &str, subreddit_id: &str, title: &str, score: i64, created_at: i64) -> Post {
        Post {
            id: id.to_string(),
            subreddit_id: subreddit_id.to_string(),
            title: title.to_string(),
            author: "alice".to_string(),
            created_at,
            score,
            upvote_ratio: 0.9,
            comment_count: 0,
            permalink: format!("/r/test/comments/{}/", id),
            url: format!("https://www.reddit.com/r/test/comments/{}/", id),
            is_self: true,
            self_text: Some(format!("body of {}", title)),
            last_updated: 0,
        }
    }

    fn comment(id: &str, post_id: &str, score: i64, created_at: i64) -> Comment {
        Comment {
            id: id.to_string(),
            post_id: post_id.to_string(),
            parent_id: post_id.to_string(),
            author: "bob".to_string(),
            body: "a comment".to_string(),
            score,
            created_at,
            permalink: String::new(),
            last_updated: 0,
        }
    }

    #[tokio::test]
    async fn test_upsert_subreddit_idempotent() {
        let store = test_store().await;

        let mut sub = subreddit("t5_a", "rust", 100);
        store.upsert_subreddit(&sub).await.unwrap();

        sub.subscriber_count = 250;
        sub.description = "updated".to_string();
        store.upsert_subreddit(&sub).await.unwrap();

        let all = store.all_subreddits().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].subscriber_count, 250);
        assert_eq!(all[0].description, "updated");
        assert!(all[0].last_updated > 0);
    }

    #[tokio::test]
    async fn test_upsert_post_second_write_wins() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "rust", 1)).await.unwrap();

        let mut p = post("t3_x", "t5_a", "first title", 10, 100);
        store.upsert_post(&p).await.unwrap();

        p.title = "second title".to_string();
        p.score = -3;
        store.upsert_post(&p).await.unwrap();

        let posts = store.list_posts("t5_a", "created_at", "desc", 10, 0).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "second title");
        assert_eq!(posts[0].score, -3);
    }

    #[tokio::test]
    async fn test_list_subreddits_by_subscribers() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "small", 10)).await.unwrap();
        store.upsert_subreddit(&subreddit("t5_b", "big", 1000)).await.unwrap();
        store.upsert_subreddit(&subreddit("t5_c", "mid", 500)).await.unwrap();

        let subs = store.list_subreddits(10, 0).await.unwrap();
        let names: Vec<&str> = subs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["big", "mid", "small"]);
    }

    #[tokio::test]
    async fn test_list_posts_unknown_sort_falls_back() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "rust", 1)).await.unwrap();
        store.upsert_post(&post("t3_old", "t5_a", "old", 100, 100)).await.unwrap();
        store.upsert_post(&post("t3_new", "t5_a", "new", 1, 200)).await.unwrap();

        // Unrecognized sort field: newest first, regardless of the order arg.
        let posts = store.list_posts("t5_a", "bogus", "asc", 10, 0).await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["t3_new", "t3_old"]);
    }

    #[tokio::test]
    async fn test_list_posts_by_score_asc() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "rust", 1)).await.unwrap();
        store.upsert_post(&post("t3_hi", "t5_a", "high", 50, 100)).await.unwrap();
        store.upsert_post(&post("t3_lo", "t5_a", "low", 2, 200)).await.unwrap();

        let posts = store.list_posts("t5_a", "score", "asc", 10, 0).await.unwrap();
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["t3_lo", "t3_hi"]);
    }

    #[tokio::test]
    async fn test_list_comments_score_then_recency() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "rust", 1)).await.unwrap();
        store.upsert_post(&post("t3_x", "t5_a", "p", 1, 1)).await.unwrap();

        store.upsert_comment(&comment("t1_a", "t3_x", 5, 100)).await.unwrap();
        store.upsert_comment(&comment("t1_b", "t3_x", 9, 50)).await.unwrap();
        store.upsert_comment(&comment("t1_c", "t3_x", 5, 200)).await.unwrap();

        let comments = store.list_comments("t3_x", 10, 0).await.unwrap();
        let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["t1_b", "t1_c", "t1_a"]);
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let store = test_store().await;
        let err = store.upsert_comment(&comment("t1_a", "t3_missing", 1, 1)).await;
        assert!(err.is_err(), "dangling foreign key must be rejected");
    }

    #[tokio::test]
    async fn test_search_matches_title_and_body() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "rust", 1)).await.unwrap();
        store.upsert_subreddit(&subreddit("t5_b", "python", 1)).await.unwrap();

        store.upsert_post(&post("t3_1", "t5_a", "borrow checker woes", 10, 1)).await.unwrap();
        let mut p2 = post("t3_2", "t5_a", "unrelated", 5, 2);
        p2.self_text = Some("fighting the borrow checker again".to_string());
        store.upsert_post(&p2).await.unwrap();
        store.upsert_post(&post("t3_3", "t5_b", "borrow nothing", 99, 3)).await.unwrap();

        let hits = store.search_posts("borrow", None, 10, 0).await.unwrap();
        assert_eq!(hits.len(), 3);

        let scoped = store.search_posts("borrow", Some("t5_a"), 10, 0).await.unwrap();
        let ids: Vec<&str> = scoped.iter().map(|p| p.id.as_str()).collect();
        // score desc within the subreddit
        assert_eq!(ids, vec!["t3_1", "t3_2"]);
    }

    #[tokio::test]
    async fn test_search_escapes_like_wildcards() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "rust", 1)).await.unwrap();
        store.upsert_post(&post("t3_1", "t5_a", "100% honest question", 1, 1)).await.unwrap();
        store.upsert_post(&post("t3_2", "t5_a", "100 percent other", 1, 2)).await.unwrap();

        let hits = store.search_posts("100%", None, 10, 0).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["t3_1"]);
    }

    #[tokio::test]
    async fn test_subreddit_by_name() {
        let store = test_store().await;
        store.upsert_subreddit(&subreddit("t5_a", "rust", 1)).await.unwrap();

        let found = store.subreddit_by_name("rust").await.unwrap();
        assert_eq!(found.map(|s| s.id), Some("t5_a".to_string()));
        assert!(store.subreddit_by_name("absent").await.unwrap().is_none());
    }

    #[test]
    fn test_post_order_clause_whitelist() {
        assert_eq!(post_order_clause("score", "asc"), "score ASC, id ASC");
        assert_eq!(post_order_clause("title", "desc"), "title DESC, id ASC");
        assert_eq!(post_order_clause("bogus", "asc"), "created_at DESC, id ASC");
        assert_eq!(post_order_clause("score", "sideways"), "score DESC, id ASC");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
