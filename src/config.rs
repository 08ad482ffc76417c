//! Runtime configuration loaded from `config.yaml`.
//!
//! Every field carries a serde default, so a missing file or an empty one
//! yields the built-in settings. Scoring weights and keyword lists live here
//! rather than in code: they are hand-tuned data, not logic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::models::{CompanyHiring, CompanyRaising, FundingInfo, NewsletterType, SponsorInfo};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub fetch: FetchConfig,
    pub sources: SourcesConfig,
    pub scoring: ScoringConfig,
    pub prompt: PromptConfig,
}

impl AppConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info", skip_all)]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No config file given; using defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: AppConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(Error::Config("fetch.concurrency must be at least 1".into()));
        }
        if self.prompt.max_articles == 0 {
            return Err(Error::Config("prompt.max_articles must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub image_model: String,
    pub image_size: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Retries on top of the first attempt; 0 means a single attempt.
    pub max_retries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1792x1024".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout_secs: 180,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout_secs: 20,
            user_agent: concat!("runway_press/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
}

impl FeedSource {
    fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub hacker_news_base_url: String,
    /// How many top stories to fetch item details for.
    pub hacker_news_limit: usize,
    pub rss_feeds: Vec<FeedSource>,
    pub github_trending: bool,
    pub github_trending_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            hacker_news_base_url: "https://hacker-news.firebaseio.com/v0".to_string(),
            hacker_news_limit: 30,
            rss_feeds: vec![
                FeedSource::new("TechCrunch", "https://techcrunch.com/category/artificial-intelligence/feed/"),
                FeedSource::new("VentureBeat", "https://venturebeat.com/category/ai/feed/"),
                FeedSource::new("MIT Technology Review", "https://www.technologyreview.com/feed/"),
                FeedSource::new("The Verge", "https://www.theverge.com/rss/ai-artificial-intelligence/index.xml"),
                FeedSource::new("Ars Technica", "https://feeds.arstechnica.com/arstechnica/technology-lab"),
            ],
            github_trending: true,
            github_trending_url: "https://github.com/trending?since=daily".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Reputation weight per source name, matched case-insensitively.
    pub source_weights: BTreeMap<String, f64>,
    pub default_source_weight: f64,
    pub recency_24h_bonus: f64,
    pub recency_48h_bonus: f64,
    pub recency_week_bonus: f64,
    pub keyword_bonus: f64,
    pub type_keyword_bonus: f64,
    pub tag_bonus: f64,
    pub ai_keywords: Vec<String>,
    pub type_keywords: BTreeMap<NewsletterType, Vec<String>>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let source_weights = [
            ("Hacker News", 8.0),
            ("TechCrunch", 9.0),
            ("VentureBeat", 8.0),
            ("MIT Technology Review", 9.0),
            ("The Verge", 7.0),
            ("Ars Technica", 7.0),
            ("GitHub Trending", 7.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let type_keywords = [
            (
                NewsletterType::WeeklyDigest,
                strings(&["funding", "acquisition", "launch", "raises", "release", "announces", "partnership"]),
            ),
            (
                NewsletterType::InnovationReport,
                strings(&["research", "breakthrough", "open source", "model", "benchmark", "paper", "architecture"]),
            ),
            (
                NewsletterType::BusinessCareers,
                strings(&["hiring", "jobs", "career", "layoffs", "salary", "startup", "talent"]),
            ),
        ]
        .into_iter()
        .collect();

        Self {
            source_weights,
            default_source_weight: 5.0,
            recency_24h_bonus: 5.0,
            recency_48h_bonus: 3.0,
            recency_week_bonus: 1.0,
            keyword_bonus: 2.0,
            type_keyword_bonus: 1.5,
            tag_bonus: 1.0,
            ai_keywords: strings(&[
                "artificial intelligence",
                "machine learning",
                "deep learning",
                "neural network",
                "llm",
                "gpt",
                "openai",
                "anthropic",
                "claude",
                "gemini",
                "chatgpt",
                "generative",
                "transformer",
                "agent",
            ]),
            type_keywords,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub max_articles: usize,
    pub snippet_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_articles: 20,
            snippet_chars: 200,
        }
    }
}

/// Sponsor and company lists attached to an edition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extras {
    pub sponsor: Option<SponsorInfo>,
    pub companies_raising: Vec<CompanyRaising>,
    pub companies_hiring: Vec<CompanyHiring>,
}

#[derive(Debug, Deserialize)]
struct ExtrasFile {
    #[serde(default)]
    sponsor: Option<SponsorInfo>,
    #[serde(default)]
    companies_raising: Vec<RaisingEntry>,
    #[serde(default)]
    companies_hiring: Vec<CompanyHiring>,
}

#[derive(Debug, Deserialize)]
struct RaisingEntry {
    name: String,
    #[serde(default)]
    url: Option<String>,
    funding: String,
}

impl Extras {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let extras = Self::from_yaml(&text)?;
        info!(
            sponsor = extras.sponsor.is_some(),
            raising = extras.companies_raising.len(),
            hiring = extras.companies_hiring.len(),
            "Loaded extras"
        );
        Ok(extras)
    }

    /// Parse the extras YAML; free-text funding is structured here, once.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: ExtrasFile = serde_yaml::from_str(text)?;
        Ok(Self {
            sponsor: file.sponsor,
            companies_raising: file
                .companies_raising
                .into_iter()
                .map(|entry| CompanyRaising {
                    name: entry.name,
                    url: entry.url,
                    funding: FundingInfo::parse(&entry.funding),
                })
                .collect(),
            companies_hiring: file.companies_hiring,
        })
    }
}
