//! Template-based content-idea generation.
//!
//! Turns extracted pain points into short-form content-idea strings for two
//! fixed platforms (TikTok and Instagram) by cycling a template table per
//! platform. When no pain points exist, a canned set of community-oriented
//! ideas is returned instead.

use serde::Serialize;

use crate::analyze::{pain_points_for_subreddit, PainPointExtractor};
use crate::config::Config;
use crate::db;
use crate::error::Result;
use crate::ingest::resolve_subreddit;
use crate::models::Platform;
use crate::store::Store;

/// At most this many pain points feed the generator.
const MAX_POINTS: usize = 3;

const TIKTOK_TEMPLATES: &[&str] = &[
    "Short video idea: Create a video addressing '{point}' with a surprising solution at the end.",
    "Hook concept: Start with 'Did you know?' and then address '{point}' with a quick practical hack.",
    "Personal story: Share your 30-second story of overcoming '{point}' with actionable takeaways.",
    "Comparison video: Do a side-by-side showing the wrong vs. right way to handle '{point}'.",
    "POV concept: Create a POV video showing the daily struggle with '{point}' and a moment of victory.",
];

const INSTAGRAM_TEMPLATES: &[&str] = &[
    "Carousel idea: Create a slideshow with 5 evidence-based strategies to address '{point}'.",
    "Infographic concept: Share a visually appealing breakdown of the science behind '{point}'.",
    "Before/after post: Show a transformation journey related to overcoming '{point}'.",
    "Tutorial reel: Demonstrate a 3-step process viewers can follow to overcome '{point}'.",
    "Quote series: Share powerful statements that resonate with people experiencing '{point}'.",
];

const TIKTOK_FALLBACK: &[&str] = &[
    "Day in the life: Create a 'day in the life' video showing how members of the community handle a typical day.",
    "Quick tip video: Share a practical tip that helped someone overcome a common challenge in the community.",
    "Expert interview: Film a quick Q&A with a specialist about the most common questions in the community.",
];

const INSTAGRAM_FALLBACK: &[&str] = &[
    "Resource roundup: Create a carousel post with 5 helpful resources for the community.",
    "Before/after journey: Share a transformation story showing progress in a challenge area.",
    "Community spotlight: Feature stories from your community with permission, highlighting creative solutions.",
];

/// Generated ideas, grouped by platform. A platform not selected stays
/// empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IdeaSet {
    pub tiktok: Vec<String>,
    pub instagram: Vec<String>,
}

/// Generate content ideas from pain points for the selected platform(s).
pub fn generate_ideas(pain_points: &[String], platform: Platform) -> IdeaSet {
    let want_tiktok = matches!(platform, Platform::Tiktok | Platform::All);
    let want_instagram = matches!(platform, Platform::Instagram | Platform::All);

    let mut ideas = IdeaSet::default();

    if pain_points.is_empty() {
        if want_tiktok {
            ideas.tiktok = TIKTOK_FALLBACK.iter().map(|s| s.to_string()).collect();
        }
        if want_instagram {
            ideas.instagram = INSTAGRAM_FALLBACK.iter().map(|s| s.to_string()).collect();
        }
        return ideas;
    }

    for (i, point) in pain_points.iter().take(MAX_POINTS).enumerate() {
        if want_tiktok {
            ideas
                .tiktok
                .push(TIKTOK_TEMPLATES[i % TIKTOK_TEMPLATES.len()].replace("{point}", point));
        }
        if want_instagram {
            ideas.instagram.push(
                INSTAGRAM_TEMPLATES[i % INSTAGRAM_TEMPLATES.len()].replace("{point}", point),
            );
        }
    }

    ideas
}

/// Pain points plus generated ideas for one stored subreddit.
pub async fn ideas_for_subreddit(
    store: &Store,
    subreddit_id: &str,
    platform: Platform,
) -> Result<(Vec<String>, IdeaSet)> {
    let extractor = PainPointExtractor::new();
    let points = pain_points_for_subreddit(store, subreddit_id, &extractor).await?;
    let ideas = generate_ideas(&points, platform);
    Ok((points, ideas))
}

pub async fn run_ideas(config: &Config, name_or_id: &str, platform: &str) -> anyhow::Result<()> {
    let platform = Platform::parse(platform)?;

    let pool = db::connect(config).await?;
    let store = Store::new(pool.clone());

    let subreddit = resolve_subreddit(&store, name_or_id).await?;
    let (points, ideas) = ideas_for_subreddit(&store, &subreddit.id, platform).await?;

    println!("content ideas for r/{}", subreddit.name);
    println!("  pain points considered: {}", points.len());
    if !ideas.tiktok.is_empty() {
        println!("tiktok:");
        for idea in &ideas.tiktok {
            println!("  - {}", idea);
        }
    }
    if !ideas.instagram.is_empty() {
        println!("instagram:");
        for idea in &ideas.instagram {
            println!("  - {}", idea);
        }
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("pain point number {}", i)).collect()
    }

    #[test]
    fn test_fallback_when_no_points() {
        let ideas = generate_ideas(&[], Platform::All);
        assert_eq!(ideas.tiktok.len(), TIKTOK_FALLBACK.len());
        assert_eq!(ideas.instagram.len(), INSTAGRAM_FALLBACK.len());
    }

    #[test]
    fn test_templates_interpolate_points() {
        let ideas = generate_ideas(&points(2), Platform::All);
        assert_eq!(ideas.tiktok.len(), 2);
        assert!(ideas.tiktok[0].contains("pain point number 0"));
        assert!(ideas.instagram[1].contains("pain point number 1"));
        assert!(!ideas.tiktok[0].contains("{point}"));
    }

    #[test]
    fn test_at_most_three_points_used() {
        let ideas = generate_ideas(&points(10), Platform::All);
        assert_eq!(ideas.tiktok.len(), 3);
        assert_eq!(ideas.instagram.len(), 3);
    }

    #[test]
    fn test_platform_selector() {
        let ideas = generate_ideas(&points(2), Platform::Tiktok);
        assert_eq!(ideas.tiktok.len(), 2);
        assert!(ideas.instagram.is_empty());

        let ideas = generate_ideas(&points(2), Platform::Instagram);
        assert!(ideas.tiktok.is_empty());
        assert_eq!(ideas.instagram.len(), 2);
    }
}
