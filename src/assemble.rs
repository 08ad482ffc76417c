//! Turn generated Markdown into a [`Newsletter`] record.
//!
//! The model is asked to open with an H1 headline. The headline becomes the
//! title; the first paragraph after it becomes the description; the rest is
//! the page body.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::config::Extras;
use crate::models::{
    Newsletter, NewsletterMetadata, NewsletterStatus, NewsletterType, ScrapedArticle,
};
use crate::utils::{slugify, snippet};

const MAX_TITLE_CHARS: usize = 120;
const MAX_DESCRIPTION_CHARS: usize = 160;

static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static EMPHASIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_`]+").unwrap());

/// Reduce inline Markdown to plain text.
pub fn strip_markdown(line: &str) -> String {
    let text = LINK_RE.replace_all(line, "$1");
    let text = EMPHASIS_RE.replace_all(&text, "");
    text.trim_start_matches(|c: char| c == '#' || c == '>' || c.is_whitespace())
        .trim()
        .to_string()
}

/// Split generated text into `(title, body)`.
///
/// The title comes from the first `# ` heading, else the first non-empty line.
/// Only a heading is removed from the body; a plain first line stays.
pub fn split_title(generated: &str) -> (Option<String>, String) {
    let lines: Vec<&str> = generated.lines().collect();
    if let Some(idx) = lines.iter().position(|l| l.trim_start().starts_with("# ")) {
        let title = strip_markdown(lines[idx]);
        let body = lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, l)| *l)
            .collect::<Vec<_>>()
            .join("\n");
        return ((!title.is_empty()).then_some(title), body.trim().to_string());
    }
    let title = lines
        .iter()
        .map(|l| strip_markdown(l))
        .find(|l| !l.is_empty())
        .map(|l| snippet(&l, MAX_TITLE_CHARS));
    (title, generated.trim().to_string())
}

/// First prose paragraph of `body`, as plain text, at most 160 characters.
pub fn derive_description(body: &str) -> String {
    body.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.starts_with('#') && !p.starts_with("---"))
        .map(|p| {
            p.lines()
                .map(strip_markdown)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|p| !p.is_empty())
        .map(|p| snippet(&p, MAX_DESCRIPTION_CHARS))
        .unwrap_or_default()
}

/// Assemble a draft newsletter from the model's output.
pub fn assemble_newsletter(
    generated: &str,
    kind: NewsletterType,
    articles: &[ScrapedArticle],
    extras: &Extras,
    model: &str,
    now: DateTime<Utc>,
) -> Newsletter {
    let publish_date = now.date_naive();
    let (title, content) = split_title(generated);
    let title = title.unwrap_or_else(|| format!("Infinite Runway — {publish_date}"));
    let description = derive_description(&content);

    Newsletter {
        id: Uuid::new_v4().to_string(),
        slug: slugify(&title),
        title,
        description,
        content,
        image_url: None,
        publish_date,
        kind,
        status: NewsletterStatus::Draft,
        sponsor_info: extras.sponsor.clone(),
        companies_raising: extras.companies_raising.clone(),
        companies_hiring: extras.companies_hiring.clone(),
        metadata: NewsletterMetadata {
            generator: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            model: model.to_string(),
            article_count: articles.len(),
            source_urls: articles.iter().map(|a| a.url.clone()).collect(),
            generated_at: now,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERATED: &str = "# The **Agents** Are Coming\n\nThis week, [OpenAI](https://openai.com) shipped agents\nand everyone noticed.\n\n## Funding\n\nMoney moved.";

    #[test]
    fn test_split_title_from_heading() {
        let (title, body) = split_title(GENERATED);
        assert_eq!(title.as_deref(), Some("The Agents Are Coming"));
        assert!(body.starts_with("This week"));
        assert!(!body.contains("# The"));
        assert!(body.contains("## Funding"));
    }

    #[test]
    fn test_split_title_without_heading() {
        let (title, body) = split_title("\n\n**Big week** for models.\n\nMore text.");
        assert_eq!(title.as_deref(), Some("Big week for models."));
        assert!(body.starts_with("**Big week**"));
    }

    #[test]
    fn test_split_title_empty() {
        let (title, body) = split_title("   \n");
        assert_eq!(title, None);
        assert_eq!(body, "");
    }

    #[test]
    fn test_description_is_first_paragraph_plain_text() {
        let (_, body) = split_title(GENERATED);
        assert_eq!(
            derive_description(&body),
            "This week, OpenAI shipped agents and everyone noticed."
        );
        let long = format!("{}\n\nNext", "x".repeat(400));
        assert_eq!(derive_description(&long).chars().count(), 161);
    }

    #[test]
    fn test_assemble_newsletter_fields() {
        let now = Utc::now();
        let articles = vec![ScrapedArticle::new("a", "b", "https://x.example", "TechCrunch", None)];
        let n = assemble_newsletter(
            GENERATED,
            NewsletterType::WeeklyDigest,
            &articles,
            &Extras::default(),
            "gpt-4o",
            now,
        );
        assert_eq!(n.title, "The Agents Are Coming");
        assert_eq!(n.slug, "the-agents-are-coming");
        assert_eq!(n.status, NewsletterStatus::Draft);
        assert_eq!(n.publish_date, now.date_naive());
        assert_eq!(n.metadata.article_count, 1);
        assert_eq!(n.metadata.source_urls, vec!["https://x.example".to_string()]);
    }

    #[test]
    fn test_assemble_falls_back_to_dated_title() {
        let now = Utc::now();
        let n = assemble_newsletter("", NewsletterType::InnovationReport, &[], &Extras::default(), "m", now);
        assert!(n.title.starts_with("Infinite Runway"));
        assert!(n.slug.starts_with("infinite-runway-"));
    }
}
