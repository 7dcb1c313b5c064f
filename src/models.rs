//! Core data models used throughout subscope.
//!
//! These types represent the subreddits, posts, and comments that flow
//! through the ingestion pipeline, plus the listing options accepted by the
//! Reddit API endpoints.

use serde::Serialize;

use crate::error::{Error, Result};

/// Marker value the platform substitutes for a removed author or body.
pub const DELETED: &str = "[deleted]";

/// Subreddit metadata, keyed by the platform fullname (`t5_…`).
#[derive(Debug, Clone, Serialize)]
pub struct Subreddit {
    pub id: String,
    /// Canonical, prefix-stripped name (`rust`, not `r/rust`).
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub subscriber_count: i64,
    pub created_at: i64,
    pub is_over_18: bool,
    pub url: String,
    pub icon_url: Option<String>,
    /// Epoch seconds of the last successful upsert.
    pub last_updated: i64,
}

/// A post summary, keyed by the platform fullname (`t3_…`).
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub subreddit_id: String,
    pub title: String,
    pub author: String,
    pub created_at: i64,
    pub score: i64,
    pub upvote_ratio: f64,
    pub comment_count: i64,
    pub permalink: String,
    pub url: String,
    pub is_self: bool,
    pub self_text: Option<String>,
    pub last_updated: i64,
}

/// A flattened comment, keyed by the platform fullname (`t1_…`).
///
/// `parent_id` is the owning post's ID for top-level comments, or another
/// comment's ID for replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub parent_id: String,
    pub author: String,
    pub body: String,
    pub score: i64,
    pub created_at: i64,
    pub permalink: String,
    pub last_updated: i64,
}

/// Post listing sort accepted by the listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSort {
    Hot,
    New,
    Top,
    Rising,
}

impl PostSort {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "hot" => Ok(Self::Hot),
            "new" => Ok(Self::New),
            "top" => Ok(Self::Top),
            "rising" => Ok(Self::Rising),
            other => Err(Error::Validation(format!(
                "unknown post sort '{}': use hot, new, top, or rising",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::New => "new",
            Self::Top => "top",
            Self::Rising => "rising",
        }
    }
}

/// Timeframe qualifier, only meaningful when the sort is `top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Timeframe {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(Error::Validation(format!(
                "unknown timeframe '{}': use hour, day, week, month, year, or all",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

/// Comment tree sort accepted by the comments endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSort {
    Confidence,
    Top,
    New,
    Controversial,
    Old,
    Random,
    Qa,
}

impl CommentSort {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "confidence" => Ok(Self::Confidence),
            "top" => Ok(Self::Top),
            "new" => Ok(Self::New),
            "controversial" => Ok(Self::Controversial),
            "old" => Ok(Self::Old),
            "random" => Ok(Self::Random),
            "qa" => Ok(Self::Qa),
            other => Err(Error::Validation(format!(
                "unknown comment sort '{}': use confidence, top, new, controversial, old, random, or qa",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confidence => "confidence",
            Self::Top => "top",
            Self::New => "new",
            Self::Controversial => "controversial",
            Self::Old => "old",
            Self::Random => "random",
            Self::Qa => "qa",
        }
    }
}

/// Target platform for content-idea generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Tiktok,
    Instagram,
    All,
}

impl Platform {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "tiktok" => Ok(Self::Tiktok),
            "instagram" => Ok(Self::Instagram),
            "all" => Ok(Self::All),
            other => Err(Error::Validation(format!(
                "unknown platform '{}': use tiktok, instagram, or all",
                other
            ))),
        }
    }
}

/// Accumulated result of a bulk refresh across all tracked subreddits.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshSummary {
    pub subreddits_updated: u64,
    pub posts_found: u64,
}
