//! Read-only client for the public Reddit JSON endpoints.
//!
//! Three endpoints are used, all unauthenticated:
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /r/{name}/about.json` | Subreddit metadata |
//! | `GET /r/{name}/{sort}.json?limit=N[&t=timeframe]` | One page of post summaries |
//! | `GET /r/{name}/comments/{short}.json?sort={sort}` | Full comment tree for a post |
//!
//! Listing items arrive as `{"kind": "...", "data": {...}}` things. Comment
//! nodes are modeled as the tagged [`CommentNode`] variant so the "skip
//! non-comment kinds" rule in the flattener is explicit rather than a string
//! comparison. Requests carry a fixed user-agent and a bounded timeout;
//! network failures, non-2xx statuses, and malformed JSON all surface as
//! [`Error::Upstream`] with the cause attached. Retries, if any, belong to
//! the caller.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::config::RedditConfig;
use crate::error::{Error, Result};
use crate::models::{CommentSort, Post, PostSort, Subreddit, Timeframe, DELETED};

/// Options for one page of the post listing endpoint.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    pub sort: PostSort,
    /// Only sent upstream when `sort` is `top`.
    pub timeframe: Timeframe,
    pub limit: u32,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            sort: PostSort::Hot,
            timeframe: Timeframe::Week,
            limit: 25,
        }
    }
}

impl ListingOptions {
    /// Rejects out-of-range limits before any network call.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.limit) {
            return Err(Error::Validation(format!(
                "limit must be in [1, 100], got {}",
                self.limit
            )));
        }
        Ok(())
    }
}

static NAME_RE: OnceLock<Regex> = OnceLock::new();

/// Subreddit names are 3 to 21 word characters.
pub fn validate_subreddit_name(name: &str) -> Result<()> {
    let re = NAME_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{3,21}$").expect("valid pattern"));
    if re.is_match(name) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "'{}' is not a valid subreddit name",
            name
        )))
    }
}

/// Strip an optional `r/` or `/r/` prefix and surrounding whitespace from
/// user-supplied subreddit input.
pub fn clean_subreddit_name(raw: &str) -> String {
    let s = raw.trim();
    let s = s
        .strip_prefix("/r/")
        .or_else(|| s.strip_prefix("r/"))
        .unwrap_or(s);
    s.to_string()
}

/// The short form of a platform fullname, for building API paths
/// (`t3_abc123` → `abc123`). Prefixes are opaque tags; nothing else is read
/// from them.
pub fn short_id(fullname: &str) -> &str {
    fullname
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(fullname)
}

// ============ Wire types ============

/// Generic `{"kind": ..., "data": ...}` envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Thing<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListingData<T> {
    #[serde(default = "Vec::new")]
    pub children: Vec<T>,
}

pub(crate) type Listing<T> = Thing<ListingData<T>>;

#[derive(Debug, Clone, Deserialize)]
struct AboutData {
    /// Fullname (`t5_…`) — the platform calls this field `name`.
    name: String,
    display_name: String,
    #[serde(default)]
    display_name_prefixed: Option<String>,
    #[serde(default)]
    public_description: String,
    #[serde(default)]
    subscribers: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    over18: bool,
    #[serde(default)]
    url: String,
    #[serde(default)]
    icon_img: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PostChild {
    kind: String,
    data: PostData,
}

#[derive(Debug, Clone, Deserialize)]
struct PostData {
    /// Fullname (`t3_…`).
    name: String,
    title: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    upvote_ratio: f64,
    #[serde(default)]
    num_comments: i64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    is_self: bool,
    #[serde(default)]
    selftext: Option<String>,
}

/// One node of the nested reply structure.
///
/// Every listing item carries a kind tag; only `t1` nodes are comments.
/// Anything else (`more` stubs, the `t3` post that leads the first listing)
/// deserializes as [`CommentNode::Other`] and is skipped by the flattener.
#[derive(Debug, Clone)]
pub enum CommentNode {
    Comment(Box<CommentData>),
    Other,
}

impl<'de> Deserialize<'de> for CommentNode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawNode {
            kind: String,
            #[serde(default)]
            data: serde_json::Value,
        }

        let raw = RawNode::deserialize(deserializer)?;
        if raw.kind == "t1" {
            let data: CommentData =
                serde_json::from_value(raw.data).map_err(serde::de::Error::custom)?;
            Ok(CommentNode::Comment(Box::new(data)))
        } else {
            Ok(CommentNode::Other)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentData {
    /// Short ID (`abc123`); the fullname is derived via [`CommentData::fullname`].
    pub id: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub permalink: String,
    /// The nested listing of replies. The API sends an empty string instead
    /// of a listing when there are none.
    #[serde(default, deserialize_with = "deserialize_replies")]
    pub replies: Vec<CommentNode>,
}

impl CommentData {
    pub fn fullname(&self) -> String {
        format!("t1_{}", self.id)
    }
}

fn deserialize_replies<'de, D>(deserializer: D) -> std::result::Result<Vec<CommentNode>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Replies {
        Listing(Listing<CommentNode>),
        // "" or null when the node has no replies
        Empty(serde::de::IgnoredAny),
    }

    Ok(match Replies::deserialize(deserializer)? {
        Replies::Listing(listing) => listing.data.children,
        Replies::Empty(_) => Vec::new(),
    })
}

// ============ Client ============

pub struct RedditClient {
    http: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    pub fn new(config: &RedditConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch subreddit metadata. The caller is responsible for validating
    /// the name first.
    pub async fn fetch_subreddit(&self, name: &str) -> Result<Subreddit> {
        let url = format!("{}/r/{}/about.json", self.base_url, name);
        let about: Thing<AboutData> = self.get_json(&url, &[]).await?;
        Ok(self.map_subreddit(about.data))
    }

    /// Fetch one page of post summaries for a subreddit.
    pub async fn fetch_posts(
        &self,
        subreddit_name: &str,
        subreddit_id: &str,
        options: &ListingOptions,
    ) -> Result<Vec<Post>> {
        options.validate()?;

        let url = format!(
            "{}/r/{}/{}.json",
            self.base_url,
            subreddit_name,
            options.sort.as_str()
        );
        let mut query = vec![("limit", options.limit.to_string())];
        if options.sort == PostSort::Top {
            query.push(("t", options.timeframe.as_str().to_string()));
        }

        let listing: Listing<PostChild> = self.get_json(&url, &query).await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .filter(|child| child.kind == "t3")
            .map(|child| map_post(child.data, subreddit_id))
            .collect())
    }

    /// Fetch the full comment tree for a post and return its top-level
    /// nodes. The endpoint responds with two listings; the first repeats the
    /// post itself and is skipped.
    pub async fn fetch_comment_tree(
        &self,
        subreddit_name: &str,
        post_short_id: &str,
        sort: CommentSort,
    ) -> Result<Vec<CommentNode>> {
        let url = format!(
            "{}/r/{}/comments/{}.json",
            self.base_url, subreddit_name, post_short_id
        );
        let listings: Vec<Listing<CommentNode>> = self
            .get_json(&url, &[("sort", sort.as_str().to_string())])
            .await?;

        Ok(listings
            .into_iter()
            .nth(1)
            .map(|listing| listing.data.children)
            .unwrap_or_default())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }

    fn map_subreddit(&self, data: AboutData) -> Subreddit {
        let now = chrono::Utc::now().timestamp();
        let display_name = data
            .display_name_prefixed
            .unwrap_or_else(|| format!("r/{}", data.display_name));

        Subreddit {
            id: data.name,
            name: data.display_name,
            display_name,
            description: data.public_description,
            subscriber_count: data.subscribers.max(0),
            created_at: data.created_utc as i64,
            is_over_18: data.over18,
            url: format!("{}{}", self.base_url, data.url),
            icon_url: data.icon_img.filter(|s| !s.is_empty()),
            last_updated: now,
        }
    }
}

fn map_post(data: PostData, subreddit_id: &str) -> Post {
    Post {
        id: data.name,
        subreddit_id: subreddit_id.to_string(),
        title: data.title,
        author: data.author.unwrap_or_else(|| DELETED.to_string()),
        created_at: data.created_utc as i64,
        score: data.score,
        upvote_ratio: data.upvote_ratio.clamp(0.0, 1.0),
        comment_count: data.num_comments.max(0),
        permalink: data.permalink,
        url: data.url,
        is_self: data.is_self,
        self_text: data.selftext.filter(|s| !s.is_empty()),
        last_updated: chrono::Utc::now().timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_options_limit_bounds() {
        let mut opts = ListingOptions::default();
        assert!(opts.validate().is_ok());

        opts.limit = 0;
        assert!(matches!(opts.validate(), Err(Error::Validation(_))));

        opts.limit = 150;
        assert!(matches!(opts.validate(), Err(Error::Validation(_))));

        opts.limit = 100;
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_subreddit_name_validation() {
        assert!(validate_subreddit_name("rust").is_ok());
        assert!(validate_subreddit_name("ADHD_parenting").is_ok());
        assert!(validate_subreddit_name("abc").is_ok());

        // Too short, too long, bad characters
        assert!(validate_subreddit_name("ab").is_err());
        assert!(validate_subreddit_name("a_name_well_over_twenty_one_chars").is_err());
        assert!(validate_subreddit_name("bad name").is_err());
        assert!(validate_subreddit_name("r/rust").is_err());
        assert!(validate_subreddit_name("").is_err());
    }

    #[test]
    fn test_clean_subreddit_name() {
        assert_eq!(clean_subreddit_name("rust"), "rust");
        assert_eq!(clean_subreddit_name("r/rust"), "rust");
        assert_eq!(clean_subreddit_name("/r/rust"), "rust");
        assert_eq!(clean_subreddit_name("  r/rust  "), "rust");
    }

    #[test]
    fn test_short_id_strips_prefix() {
        assert_eq!(short_id("t3_abc123"), "abc123");
        assert_eq!(short_id("t1_def"), "def");
        assert_eq!(short_id("noprefix"), "noprefix");
    }

    #[test]
    fn test_comment_node_tagged_parse() {
        let json = r#"{
            "kind": "t1",
            "data": {
                "id": "c1",
                "author": "alice",
                "body": "hello",
                "score": 4,
                "created_utc": 1700000000.0,
                "permalink": "/r/test/comments/abc/x/c1/",
                "replies": ""
            }
        }"#;
        let node: CommentNode = serde_json::from_str(json).unwrap();
        match node {
            CommentNode::Comment(data) => {
                assert_eq!(data.fullname(), "t1_c1");
                assert_eq!(data.author.as_deref(), Some("alice"));
                assert!(data.replies.is_empty());
            }
            CommentNode::Other => panic!("expected a comment node"),
        }
    }

    #[test]
    fn test_non_comment_kind_parses_as_other() {
        let json = r#"{"kind": "more", "data": {"count": 12, "children": ["t1_x"]}}"#;
        let node: CommentNode = serde_json::from_str(json).unwrap();
        assert!(matches!(node, CommentNode::Other));
    }

    #[test]
    fn test_nested_replies_parse() {
        let json = r#"{
            "kind": "t1",
            "data": {
                "id": "c1",
                "author": "alice",
                "body": "parent",
                "replies": {
                    "kind": "Listing",
                    "data": {
                        "children": [
                            {"kind": "t1", "data": {"id": "c2", "author": "bob", "body": "child", "replies": ""}},
                            {"kind": "more", "data": {"count": 3}}
                        ]
                    }
                }
            }
        }"#;
        let node: CommentNode = serde_json::from_str(json).unwrap();
        let CommentNode::Comment(data) = node else {
            panic!("expected a comment node");
        };
        assert_eq!(data.replies.len(), 2);
        assert!(matches!(data.replies[0], CommentNode::Comment(_)));
        assert!(matches!(data.replies[1], CommentNode::Other));
    }
}
