//! Rule-based pain-point extraction.
//!
//! Scans stored post titles, self-texts, and comment bodies for sentences
//! that read like a stated problem or need. Two passes: a keyword match
//! over individual sentences, and a set of capture patterns over the whole
//! text ("struggling with …", "hard to …", "any tips for …"). Results are
//! deduplicated in first-seen order; short fragments are dropped.

use regex::Regex;

use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::ingest::resolve_subreddit;
use crate::store::Store;

/// Sentences and captures shorter than this are noise, not pain points.
const MIN_POINT_LEN: usize = 10;

const KEYWORDS: &[&str] = &[
    "challenge",
    "problem",
    "struggle",
    "difficult",
    "hard",
    "issue",
    "trouble",
    "worry",
    "concerned",
    "frustrating",
    "overwhelmed",
    "anxious",
    "tired",
    "exhausted",
    "help",
    "advice",
    "suggestion",
    "tips",
];

const PATTERNS: &[&str] = &[
    r"(?i)(?:struggle|struggling) with\s+([^.!?]+)[.!?]",
    r"(?i)(?:difficult|hard) to\s+([^.!?]+)[.!?]",
    r"(?i)(?:problem|issue|challenge) (?:with|is|in)\s+([^.!?]+)[.!?]",
    r"(?i)(?:need|looking for) (?:help|advice|guidance)\s+([^.!?]+)[.!?]",
    r"(?i)how (?:do|can) (?:i|you|we)\s+([^.!?]+)[.!?]",
    r"(?i)any tips for\s+([^.!?]+)[.!?]",
];

pub struct PainPointExtractor {
    patterns: Vec<Regex>,
}

impl Default for PainPointExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PainPointExtractor {
    pub fn new() -> Self {
        Self {
            patterns: PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("valid pattern"))
                .collect(),
        }
    }

    /// Extract pain-point sentences from one text.
    pub fn extract(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut points: Vec<String> = Vec::new();

        for sentence in split_sentences(text) {
            let lower = sentence.to_lowercase();
            if KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                points.push(sentence.trim().to_string());
            }
        }

        for pattern in &self.patterns {
            for captures in pattern.captures_iter(text) {
                if let Some(m) = captures.get(1) {
                    points.push(m.as_str().trim().to_string());
                }
            }
        }

        dedup_in_order(points)
    }

    /// Extract and merge pain points from a batch of texts, deduplicated
    /// across the whole batch in first-seen order.
    pub fn extract_all<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut points = Vec::new();
        for text in texts {
            points.extend(self.extract(text));
        }
        dedup_in_order(points)
    }
}

/// Split on terminal punctuation followed by whitespace. A trailing
/// fragment without punctuation still counts as a sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut at_boundary = false;

    for (idx, ch) in text.char_indices() {
        if at_boundary && ch.is_whitespace() {
            sentences.push(&text[start..idx]);
            start = idx + ch.len_utf8();
            at_boundary = false;
        } else {
            at_boundary = matches!(ch, '.' | '!' | '?');
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences.into_iter().map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn dedup_in_order(points: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for point in points {
        if point.len() > MIN_POINT_LEN && !unique.contains(&point) {
            unique.push(point);
        }
    }
    unique
}

/// Run the extractor over everything stored for one subreddit: post titles,
/// self-texts, and comment bodies, in listing order.
pub async fn pain_points_for_subreddit(
    store: &Store,
    subreddit_id: &str,
    extractor: &PainPointExtractor,
) -> Result<Vec<String>> {
    // Negative LIMIT means unbounded in SQLite.
    let posts = store
        .list_posts(subreddit_id, "created_at", "desc", -1, 0)
        .await?;

    let mut texts = Vec::new();
    for post in posts {
        let comments = store.list_comments(&post.id, -1, 0).await?;
        texts.push(post.title);
        if let Some(body) = post.self_text {
            texts.push(body);
        }
        texts.extend(comments.into_iter().map(|c| c.body));
    }

    Ok(extractor.extract_all(texts.iter().map(String::as_str)))
}

pub async fn run_pain_points(config: &Config, name_or_id: &str) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let store = Store::new(pool.clone());

    let subreddit = resolve_subreddit(&store, name_or_id).await?;
    let extractor = PainPointExtractor::new();
    let points = pain_points_for_subreddit(&store, &subreddit.id, &extractor).await?;

    if points.is_empty() {
        println!("No pain points found for r/{}.", subreddit.name);
    } else {
        println!("pain points for r/{} ({})", subreddit.name, points.len());
        for (i, point) in points.iter().enumerate() {
            println!("{}. {}", i + 1, point);
        }
    }

    pool.close().await;
    Ok(())
}
