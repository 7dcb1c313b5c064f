use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedditConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.reddit.com".to_string()
}
fn default_user_agent() -> String {
    concat!("subscope/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_post_limit")]
    pub post_limit: u32,
    #[serde(default = "default_post_sort")]
    pub post_sort: String,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default = "default_comment_sort")]
    pub comment_sort: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            post_limit: default_post_limit(),
            post_sort: default_post_sort(),
            timeframe: default_timeframe(),
            comment_sort: default_comment_sort(),
        }
    }
}

fn default_post_limit() -> u32 {
    25
}
fn default_post_sort() -> String {
    "hot".to_string()
}
fn default_timeframe() -> String {
    "week".to_string()
}
fn default_comment_sort() -> String {
    "confidence".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Bearer token required on `/api` routes. Falls back to the
    /// `SUBSCOPE_API_TOKEN` environment variable; unset means open access.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl ServerConfig {
    pub fn resolved_auth_token(&self) -> Option<String> {
        self.auth_token
            .clone()
            .or_else(|| std::env::var("SUBSCOPE_API_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.reddit.timeout_secs == 0 {
        anyhow::bail!("reddit.timeout_secs must be > 0");
    }

    if config.reddit.base_url.is_empty() {
        anyhow::bail!("reddit.base_url must not be empty");
    }

    if !(1..=100).contains(&config.ingest.post_limit) {
        anyhow::bail!("ingest.post_limit must be in [1, 100]");
    }

    Ok(config)
}
