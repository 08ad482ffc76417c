//! RSS 2.0 and Atom feed fetching.
//!
//! Parsing is left to `feed-rs`, which handles both formats, namespaced
//! extensions such as Media RSS, and RFC 2822/3339 dates. Entries are mapped
//! to articles here; descriptions usually carry HTML, which is reduced to
//! plain text.

use feed_rs::model::{Entry, Link};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, error, info, instrument};

use crate::config::FeedSource;
use crate::error::Result;
use crate::models::ScrapedArticle;

/// The entry's page: an `alternate` (or rel-less) link, else a URL-shaped id.
fn entry_url(entry: &Entry) -> Option<String> {
    let is_page = |l: &&Link| l.rel.as_deref().is_none_or(|rel| rel == "alternate");
    entry
        .links
        .iter()
        .find(is_page)
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
}

fn entry_into_article(entry: Entry, source: &str) -> Option<ScrapedArticle> {
    let url = entry_url(&entry)?;
    let title = entry
        .title
        .as_ref()
        .map(|t| super::html_to_text(&t.content))
        .unwrap_or_default();
    if title.is_empty() {
        return None;
    }
    // full content when the feed ships it, otherwise the summary
    let body = entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .filter(|b| !b.trim().is_empty())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.as_str()))
        .unwrap_or_default();

    Some(ScrapedArticle::new(
        title,
        super::html_to_text(body),
        url,
        source,
        entry.published.or(entry.updated),
    ))
}

/// Parse a feed document into articles attributed to `source`.
///
/// Entries without a title or a link are dropped.
pub fn parse_feed(xml: &[u8], source: &str) -> Result<Vec<ScrapedArticle>> {
    let feed = feed_rs::parser::parse(xml)?;
    Ok(feed
        .entries
        .into_iter()
        .filter_map(|entry| entry_into_article(entry, source))
        .collect())
}

#[instrument(level = "info", skip_all, fields(source = %feed.name, url = %feed.url))]
async fn fetch_feed(client: &Client, feed: &FeedSource) -> Result<Vec<ScrapedArticle>> {
    let bytes = client
        .get(&feed.url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    let articles = parse_feed(&bytes[..], &feed.name)?;
    debug!(count = articles.len(), "Parsed feed");
    Ok(articles)
}

/// Fetch every feed, at most `concurrency` at a time.
///
/// # Arguments
///
/// * `client` - Shared HTTP client (timeout and user agent already set)
/// * `feeds` - Feeds to fetch; results keep this order
/// * `concurrency` - Maximum feeds in flight
///
/// # Returns
///
/// All articles from the feeds that worked. A feed that fails to download
/// or parse is logged and contributes nothing.
#[instrument(level = "info", skip_all, fields(feeds = feeds.len()))]
pub async fn fetch_feeds(
    client: &Client,
    feeds: &[FeedSource],
    concurrency: usize,
) -> Vec<ScrapedArticle> {
    let per_feed: Vec<Vec<ScrapedArticle>> = stream::iter(feeds)
        .map(|feed| async move {
            match fetch_feed(client, feed).await {
                Ok(articles) => articles,
                Err(e) => {
                    error!(source = %feed.name, error = %e, "Feed fetch failed");
                    Vec::new()
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let articles: Vec<ScrapedArticle> = per_feed.into_iter().flatten().collect();
    info!(count = articles.len(), "Fetched feed articles");
    articles
}
