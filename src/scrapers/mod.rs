//! News source fetchers.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Hacker News | [`hackernews`] | Firebase REST API | Top stories, item details fetched concurrently |
//! | RSS / Atom feeds | [`rss`] | `feed-rs` | TechCrunch, VentureBeat, MIT Technology Review, ... |
//! | GitHub Trending | [`github_trending`] | HTML scraping | Daily trending repositories |
//!
//! Every source is best-effort: a failure is logged and that source
//! contributes nothing, so one broken feed never aborts a run. All requests
//! share one [`reqwest::Client`] with a per-request timeout, and fan-out is
//! bounded by `fetch.concurrency`.

use reqwest::Client;
use scraper::{ElementRef, Html, Node};
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::config::{FetchConfig, SourcesConfig};
use crate::error::Result;
use crate::models::ScrapedArticle;

pub mod github_trending;
pub mod hackernews;
pub mod rss;

/// Build the shared HTTP client used by every fetcher.
pub fn http_client(config: &FetchConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .user_agent(config.user_agent.clone())
        .build()?)
}

/// GET `url` and return the body, failing on non-2xx.
pub(crate) async fn get_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Fetch candidates from every configured source, in source order.
#[instrument(level = "info", skip_all)]
pub async fn fetch_all(
    client: &Client,
    sources: &SourcesConfig,
    fetch: &FetchConfig,
) -> Vec<ScrapedArticle> {
    let mut articles = Vec::new();

    match hackernews::fetch_top_stories(
        client,
        &sources.hacker_news_base_url,
        sources.hacker_news_limit,
        fetch.concurrency,
    )
    .await
    {
        Ok(found) => articles.extend(found),
        Err(e) => error!(error = %e, "Hacker News fetch failed; skipping source"),
    }

    articles.extend(rss::fetch_feeds(client, &sources.rss_feeds, fetch.concurrency).await);

    if sources.github_trending {
        match github_trending::fetch_trending(client, &sources.github_trending_url).await {
            Ok(found) => articles.extend(found),
            Err(e) => error!(error = %e, "GitHub Trending fetch failed; skipping source"),
        }
    }

    info!(count = articles.len(), "Fetched candidate articles from all sources");
    articles
}

/// Elements that break the text flow; inline markup like `<b>` or `<code>` does not.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td",
    "th", "blockquote", "pre", "section", "article", "header", "footer",
];

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = BLOCK_TAGS.contains(&el.name());
                if block {
                    out.push(' ');
                }
                push_text(child_el, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Collapse HTML into plain text.
///
/// Adjacent inline nodes are joined as written, so `use <b>X</b>?` reads
/// "use X?"; block elements are separated by a single space.
///
/// # Arguments
///
/// * `html` - An HTML fragment, or plain text with entities
///
/// # Returns
///
/// The visible text with whitespace runs collapsed and ends trimmed.
pub(crate) fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::with_capacity(html.len());
    push_text(fragment.root_element(), &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
