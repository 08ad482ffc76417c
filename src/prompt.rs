//! Prompt construction for newsletter text and cover images.
//!
//! [`build_prompt`] is deterministic: the same articles, type and extras
//! always produce the same string. It never fails, even with no articles.

use std::fmt::Write;

use crate::config::{Extras, PromptConfig};
use crate::models::{FundingInfo, NewsletterType, ScrapedArticle};
use crate::utils::snippet;

/// Editorial voice for each newsletter type.
pub fn role_description(kind: NewsletterType) -> &'static str {
    match kind {
        NewsletterType::WeeklyDigest => {
            "You are the editor of Infinite Runway, a weekly newsletter for founders, \
             operators and investors who follow artificial intelligence. Write a crisp, \
             skimmable digest of the week's most important AI news: launches, funding, \
             acquisitions and policy. Be confident and concrete; avoid hype."
        }
        NewsletterType::InnovationReport => {
            "You are the technical editor of Infinite Runway's Innovation Report. Your \
             readers are engineers and researchers. Explain new models, papers, open-source \
             releases and benchmarks accurately, call out what is genuinely novel, and \
             keep the tone precise and technical."
        }
        NewsletterType::BusinessCareers => {
            "You are the careers editor of Infinite Runway. Your readers are professionals \
             navigating the AI job market. Cover hiring trends, notable roles, layoffs, \
             compensation and the companies worth watching, in a practical and encouraging tone."
        }
    }
}

const FORMAT_INSTRUCTIONS: &str = "\
Instructions:
- Start with a single Markdown H1 headline for this edition (no date in the headline).
- Follow with a two-sentence introduction.
- Write 4 to 6 sections with H2 headings, grouping related stories.
- Reference sources inline as Markdown links using the URLs above.
- Keep the whole newsletter between 800 and 1200 words.
- Close with a one-paragraph outlook titled \"## On the Runway\".
- Output Markdown only. Do not wrap the answer in code fences.";

/// Build the full text-generation prompt.
///
/// Only the first `config.max_articles` articles are used; callers pass them
/// already ranked.
///
/// # Arguments
///
/// * `config` - Article cap and snippet length
/// * `kind` - Selects the editorial role at the top of the prompt
/// * `articles` - Ranked articles to list as sources
/// * `extras` - Sponsor and company sections, each omitted when empty
///
/// # Returns
///
/// The prompt text, ending with the formatting instructions.
pub fn build_prompt(
    config: &PromptConfig,
    kind: NewsletterType,
    articles: &[ScrapedArticle],
    extras: &Extras,
) -> String {
    let mut out = String::new();
    out.push_str(role_description(kind));
    out.push_str("\n\n");

    out.push_str("Articles:\n");
    for article in articles.iter().take(config.max_articles) {
        let _ = writeln!(
            out,
            "- {} ({}) <{}>: {}",
            article.title.trim(),
            article.source,
            article.url,
            snippet(&article.content, config.snippet_chars)
        );
    }
    out.push('\n');

    if let Some(sponsor) = &extras.sponsor {
        let _ = write!(out, "Sponsor: {} <{}>", sponsor.name, sponsor.url);
        if let Some(tagline) = &sponsor.tagline {
            let _ = write!(out, " - {tagline}");
        }
        out.push_str("\nInclude one short, clearly labelled sponsor mention.\n\n");
    }

    if !extras.companies_raising.is_empty() {
        out.push_str("Companies raising:\n");
        for company in &extras.companies_raising {
            let _ = writeln!(out, "- {}: {}", company.name, describe_funding(&company.funding));
        }
        out.push('\n');
    }

    if !extras.companies_hiring.is_empty() {
        out.push_str("Companies hiring:\n");
        for company in &extras.companies_hiring {
            if company.roles.is_empty() {
                let _ = writeln!(out, "- {}", company.name);
            } else {
                let _ = writeln!(out, "- {}: {}", company.name, company.roles.join(", "));
            }
        }
        out.push('\n');
    }

    out.push_str(FORMAT_INSTRUCTIONS);
    out
}

fn describe_funding(funding: &FundingInfo) -> String {
    let FundingInfo::Parsed {
        amount_usd,
        round,
        lead_investor,
        ..
    } = funding
    else {
        // pass through verbatim; the model is told nothing we don't know
        return funding.raw().to_string();
    };
    let mut parts = Vec::new();
    if let Some(amount) = amount_usd {
        parts.push(format_usd(*amount));
    }
    if let Some(round) = round {
        parts.push(round.clone());
    }
    if let Some(lead) = lead_investor {
        parts.push(format!("led by {lead}"));
    }
    if parts.is_empty() {
        funding.raw().to_string()
    } else {
        parts.join(" ")
    }
}

fn format_usd(amount: u64) -> String {
    let scaled = |div: f64, unit: &str| {
        let v = amount as f64 / div;
        if v.fract() == 0.0 {
            format!("${v:.0}{unit}")
        } else {
            format!("${v:.1}{unit}")
        }
    };
    match amount {
        a if a >= 1_000_000_000 => scaled(1e9, "B"),
        a if a >= 1_000_000 => scaled(1e6, "M"),
        a if a >= 1_000 => scaled(1e3, "K"),
        a => format!("${a}"),
    }
}

/// Topic keyword to icon description. First match wins.
const ICON_TABLE: &[(&str, &str)] = &[
    ("robot", "a friendly geometric robot head"),
    ("agent", "a constellation of connected nodes forming an assistant silhouette"),
    ("funding", "a rocket lifting off from a runway of coins"),
    ("raise", "a rocket lifting off from a runway of coins"),
    ("chip", "a glowing silicon chip with circuit traces"),
    ("gpu", "a glowing silicon chip with circuit traces"),
    ("research", "an open book with a neural network blooming out of it"),
    ("open source", "interlocking puzzle pieces forming a cube"),
    ("hiring", "a briefcase with an upward arrow"),
    ("career", "a briefcase with an upward arrow"),
    ("policy", "a balanced scale over a circuit board"),
    ("regulation", "a balanced scale over a circuit board"),
    ("model", "layered translucent planes forming a brain"),
];

const DEFAULT_ICON: &str = "an endless runway stretching toward a glowing horizon";

pub fn icon_for_topic(topic: &str) -> &'static str {
    let topic = topic.to_lowercase();
    ICON_TABLE
        .iter()
        .find(|(keyword, _)| topic.contains(keyword))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// Cover-image prompt for an edition about `topic`.
pub fn image_prompt(topic: &str) -> String {
    format!(
        "Minimalist editorial cover illustration for an AI newsletter called Infinite Runway. \
         Central motif: {}. Flat vector style, deep navy background with electric teal accents, \
         generous negative space, no text, no letters, no logos.",
        icon_for_topic(topic)
    )
}
