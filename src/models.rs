//! Data models for scraped articles and generated newsletters.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ScrapedArticle`]: A candidate article pulled from a news source
//! - [`Newsletter`]: One generated edition, as written to `metadata.json`
//! - [`NewsletterType`] / [`NewsletterStatus`]: Editorial track and lifecycle
//! - Extras: [`SponsorInfo`], [`CompanyRaising`], [`CompanyHiring`], [`FundingInfo`]
//!
//! Serialized field names are camelCase because the website's loader reads
//! `metadata.json` directly.

use chrono::{DateTime, NaiveDate, Utc};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A candidate article as scraped from a news source.
///
/// Fetchers create it with `relevance_score == 0.0` and no tags; the scorer
/// fills both in. `used` flips once a publish run has consumed the article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Uniqueness key for deduplication.
    pub url: String,
    /// Human-readable source name ("Hacker News", "TechCrunch", ...).
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub relevance_score: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub used: bool,
}

impl ScrapedArticle {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            url: url.into(),
            source: source.into(),
            published_at,
            relevance_score: 0.0,
            tags: Vec::new(),
            used: false,
        }
    }
}

/// One of the three editorial tracks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum NewsletterType {
    WeeklyDigest,
    InnovationReport,
    BusinessCareers,
}

impl NewsletterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsletterType::WeeklyDigest => "weekly-digest",
            NewsletterType::InnovationReport => "innovation-report",
            NewsletterType::BusinessCareers => "business-careers",
        }
    }
}

impl fmt::Display for NewsletterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a newsletter: `draft -> published -> sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterStatus {
    Draft,
    Published,
    Sent,
}

impl NewsletterStatus {
    /// The only status reachable from `self`, if any.
    pub fn next(&self) -> Option<NewsletterStatus> {
        match self {
            NewsletterStatus::Draft => Some(NewsletterStatus::Published),
            NewsletterStatus::Published => Some(NewsletterStatus::Sent),
            NewsletterStatus::Sent => None,
        }
    }
}

impl fmt::Display for NewsletterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NewsletterStatus::Draft => "draft",
            NewsletterStatus::Published => "published",
            NewsletterStatus::Sent => "sent",
        };
        f.write_str(s)
    }
}

/// A generated newsletter edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Newsletter {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    /// Markdown body. Not serialized into `metadata.json`; it lives in `page.mdx`.
    #[serde(skip)]
    pub content: String,
    pub image_url: Option<String>,
    pub publish_date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: NewsletterType,
    pub status: NewsletterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_info: Option<SponsorInfo>,
    #[serde(default)]
    pub companies_raising: Vec<CompanyRaising>,
    #[serde(default)]
    pub companies_hiring: Vec<CompanyHiring>,
    pub metadata: NewsletterMetadata,
}

impl Newsletter {
    /// Move to `to`, allowing only the single forward step of the lifecycle.
    pub fn transition_to(&mut self, to: NewsletterStatus) -> Result<()> {
        if self.status.next() != Some(to) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Typed provenance recorded alongside each newsletter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterMetadata {
    pub generator: String,
    pub model: String,
    pub article_count: usize,
    #[serde(default)]
    pub source_urls: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorInfo {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyHiring {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRaising {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    pub funding: FundingInfo,
}

/// Funding details parsed out of free text.
///
/// When nothing recognisable is found the raw text is kept as `Unparsed`
/// rather than filled with made-up round or investor data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FundingInfo {
    #[serde(rename_all = "camelCase")]
    Parsed {
        amount_usd: Option<u64>,
        round: Option<String>,
        lead_investor: Option<String>,
        raw: String,
    },
    Unparsed { raw: String },
}

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\$\s*(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*(bn|mm|k|m|b|thousand|million|billion)?\b",
    )
    .unwrap()
});
static ROUND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(pre-seed|seed|series\s+[a-h]|growth|ipo)\b").unwrap()
});
static LEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bled\s+by\s+([^,.;]+)").unwrap());

impl FundingInfo {
    pub fn parse(raw: &str) -> Self {
        let amount_usd = AMOUNT_RE.captures(raw).and_then(|caps| {
            let whole = caps.get(0)?;
            // "$1,50" or "$2.5.1": a number the pattern only partly covered
            if trailing_digit_group(&raw[whole.end()..]) {
                return None;
            }
            let value: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
            let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
                Some("k") | Some("thousand") => 1e3,
                Some("m") | Some("mm") | Some("million") => 1e6,
                Some("b") | Some("bn") | Some("billion") => 1e9,
                _ => 1.0,
            };
            Some((value * multiplier).round() as u64)
        });
        let round = ROUND_RE.captures(raw).map(|caps| {
            let text = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
            title_case_round(&text)
        });
        let lead_investor = LEAD_RE
            .captures(raw)
            .map(|caps| caps[1].trim().to_string())
            .filter(|s| !s.is_empty());

        if amount_usd.is_none() && round.is_none() && lead_investor.is_none() {
            return FundingInfo::Unparsed {
                raw: raw.to_string(),
            };
        }
        FundingInfo::Parsed {
            amount_usd,
            round,
            lead_investor,
            raw: raw.to_string(),
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            FundingInfo::Parsed { raw, .. } | FundingInfo::Unparsed { raw } => raw,
        }
    }
}

fn trailing_digit_group(rest: &str) -> bool {
    let mut chars = rest.chars();
    matches!(chars.next(), Some(',' | '.')) && chars.next().is_some_and(|c| c.is_ascii_digit())
}

fn title_case_round(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower == "ipo" {
        return "IPO".to_string();
    }
    if let Some(letter) = lower.strip_prefix("series ") {
        return format!("Series {}", letter.to_uppercase());
    }
    crate::utils::upcase(&lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_newsletter(status: NewsletterStatus) -> Newsletter {
        Newsletter {
            id: "n-1".to_string(),
            title: "The Week in AI".to_string(),
            slug: "the-week-in-ai".to_string(),
            description: "Funding, models, and more.".to_string(),
            content: "Body".to_string(),
            image_url: None,
            publish_date: NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            kind: NewsletterType::WeeklyDigest,
            status,
            sponsor_info: None,
            companies_raising: vec![],
            companies_hiring: vec![],
            metadata: NewsletterMetadata {
                generator: "runway_press".to_string(),
                model: "gpt-4o".to_string(),
                article_count: 0,
                source_urls: vec![],
                generated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_newsletter_type_serializes_kebab_case() {
        let json = serde_json::to_string(&NewsletterType::InnovationReport).unwrap();
        assert_eq!(json, "\"innovation-report\"");
        let parsed: NewsletterType = serde_json::from_str("\"business-careers\"").unwrap();
        assert_eq!(parsed, NewsletterType::BusinessCareers);
    }

    #[test]
    fn test_status_forward_transitions() {
        let mut n = sample_newsletter(NewsletterStatus::Draft);
        n.transition_to(NewsletterStatus::Published).unwrap();
        n.transition_to(NewsletterStatus::Sent).unwrap();
        assert_eq!(n.status, NewsletterStatus::Sent);
    }

    #[test]
    fn test_status_rejects_skips_and_reversals() {
        let mut n = sample_newsletter(NewsletterStatus::Draft);
        assert!(matches!(
            n.transition_to(NewsletterStatus::Sent),
            Err(Error::InvalidTransition { .. })
        ));
        let mut n = sample_newsletter(NewsletterStatus::Sent);
        assert!(n.transition_to(NewsletterStatus::Draft).is_err());
        assert_eq!(n.status, NewsletterStatus::Sent);
    }

    #[test]
    fn test_metadata_json_uses_camel_case_and_skips_content() {
        let n = sample_newsletter(NewsletterStatus::Published);
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"publishDate\":\"2025-05-06\""));
        assert!(json.contains("\"type\":\"weekly-digest\""));
        assert!(json.contains("\"status\":\"published\""));
        assert!(!json.contains("\"content\""));
    }

    #[test]
    fn test_funding_parse_full() {
        let info = FundingInfo::parse("$20M Series a led by Sequoia Capital, with others");
        assert_eq!(
            info,
            FundingInfo::Parsed {
                amount_usd: Some(20_000_000),
                round: Some("Series A".to_string()),
                lead_investor: Some("Sequoia Capital".to_string()),
                raw: "$20M Series a led by Sequoia Capital, with others".to_string(),
            }
        );
    }

    #[test]
    fn test_funding_parse_partial() {
        match FundingInfo::parse("raised a $1.5 billion round") {
            FundingInfo::Parsed {
                amount_usd,
                round,
                lead_investor,
                ..
            } => {
                assert_eq!(amount_usd, Some(1_500_000_000));
                assert_eq!(round, None);
                assert_eq!(lead_investor, None);
            }
            other => panic!("expected parsed funding, got {other:?}"),
        }
    }

    #[test]
    fn test_funding_comma_grouped_and_short_units() {
        let amount = |raw: &str| match FundingInfo::parse(raw) {
            FundingInfo::Parsed { amount_usd, .. } => amount_usd,
            FundingInfo::Unparsed { .. } => None,
        };
        assert_eq!(amount("$1,500,000 seed"), Some(1_500_000));
        assert_eq!(amount("$2.5bn Series B"), Some(2_500_000_000));
        assert_eq!(amount("$40mm growth round"), Some(40_000_000));
        assert_eq!(amount("$750k pre-seed"), Some(750_000));
    }

    #[test]
    fn test_funding_ambiguous_amount_is_not_guessed() {
        match FundingInfo::parse("$1,50 Series A") {
            FundingInfo::Parsed {
                amount_usd, round, ..
            } => {
                assert_eq!(amount_usd, None);
                assert_eq!(round.as_deref(), Some("Series A"));
            }
            other => panic!("expected parsed funding, got {other:?}"),
        }
        assert_eq!(
            FundingInfo::parse("$1,50"),
            FundingInfo::Unparsed {
                raw: "$1,50".to_string()
            }
        );
    }

    #[test]
    fn test_funding_unparsed_keeps_raw_text() {
        let info = FundingInfo::parse("undisclosed");
        assert_eq!(
            info,
            FundingInfo::Unparsed {
                raw: "undisclosed".to_string()
            }
        );
        assert_eq!(info.raw(), "undisclosed");
    }

    #[test]
    fn test_scraped_article_defaults() {
        let a = ScrapedArticle::new("t", "c", "https://example.com", "Hacker News", None);
        assert_eq!(a.relevance_score, 0.0);
        assert!(a.tags.is_empty());
        assert!(!a.used);
        assert!(!a.id.is_empty());
    }
}
