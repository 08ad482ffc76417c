//! Hacker News top stories via the public Firebase API.
//!
//! Two phases, like the other scrapers: index the top story ids, then fetch
//! each item. Item fetches run concurrently but bounded, and results keep the
//! ranking order of the index.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::models::ScrapedArticle;

pub const SOURCE_NAME: &str = "Hacker News";

#[derive(Debug, Deserialize)]
pub(crate) struct HnItem {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    time: Option<i64>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    dead: bool,
    #[serde(default)]
    deleted: bool,
}

impl HnItem {
    /// Stories only; jobs, polls and removed items yield `None`.
    pub(crate) fn into_article(self) -> Option<ScrapedArticle> {
        if self.dead || self.deleted || self.kind.as_deref().is_some_and(|k| k != "story") {
            return None;
        }
        let title = self.title?.trim().to_string();
        if title.is_empty() {
            return None;
        }
        let url = self
            .url
            .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", self.id));
        let content = self
            .text
            .map(|t| super::html_to_text(&t))
            .unwrap_or_default();
        let published_at = self.time.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0));
        Some(ScrapedArticle::new(title, content, url, SOURCE_NAME, published_at))
    }
}

#[instrument(level = "info", skip_all, fields(%base_url))]
async fn index_story_ids(client: &Client, base_url: &str) -> Result<Vec<u64>> {
    let url = format!("{}/topstories.json", base_url.trim_end_matches('/'));
    let ids: Vec<u64> = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    info!(count = ids.len(), "Indexed Hacker News top stories");
    Ok(ids)
}

async fn fetch_item(client: &Client, base_url: &str, id: u64) -> Result<HnItem> {
    let url = format!("{}/item/{}.json", base_url.trim_end_matches('/'), id);
    Ok(client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?)
}

/// Fetch the first `limit` top stories, at most `concurrency` at a time.
///
/// A failed item is logged and skipped; only a failed index aborts the source.
#[instrument(level = "info", skip_all, fields(limit = limit, concurrency = concurrency))]
pub async fn fetch_top_stories(
    client: &Client,
    base_url: &str,
    limit: usize,
    concurrency: usize,
) -> Result<Vec<ScrapedArticle>> {
    let ids = index_story_ids(client, base_url).await?;

    let articles: Vec<ScrapedArticle> = stream::iter(ids.into_iter().take(limit))
        .map(|id| async move {
            match fetch_item(client, base_url, id).await {
                Ok(item) => {
                    debug!(id, "Fetched Hacker News item");
                    item.into_article()
                }
                Err(e) => {
                    warn!(id, error = %e, "Hacker News item fetch failed");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .filter_map(|opt| async move { opt })
        .collect()
        .await;

    info!(count = articles.len(), "Fetched Hacker News stories");
    Ok(articles)
}
