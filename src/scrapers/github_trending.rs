//! GitHub Trending repositories scraper.
//!
//! There is no API for the trending page, so the HTML is scraped: each
//! repository is an `article.Box-row` card with an `h2 a` link to the repo
//! and an optional `p` description. Trending has no publish time, so the
//! fetch time is used.

use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, instrument};
use url::Url;

use crate::error::{Error, Result};
use crate::models::ScrapedArticle;

pub const SOURCE_NAME: &str = "GitHub Trending";

/// Extract repositories from a trending page.
pub fn parse_trending(html: &str, page_url: &str, now: DateTime<Utc>) -> Result<Vec<ScrapedArticle>> {
    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("article.Box-row").unwrap();
    let link_selector = Selector::parse("h2 a[href]").unwrap();
    let description_selector = Selector::parse("p").unwrap();

    let mut articles = Vec::new();
    for row in document.select(&row_selector) {
        let Some(href) = row
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        let repo = href.trim().trim_matches('/').to_string();
        if repo.is_empty() {
            continue;
        }
        let url = base
            .join(href.trim())
            .map_err(|e| Error::Scrape(format!("bad repo link {href:?}: {e}")))?;
        let description = row
            .select(&description_selector)
            .next()
            .map(|p| super::html_to_text(&p.inner_html()))
            .unwrap_or_default();

        articles.push(ScrapedArticle::new(
            repo,
            description,
            url.to_string(),
            SOURCE_NAME,
            Some(now),
        ));
    }
    Ok(articles)
}

#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_trending(client: &Client, url: &str) -> Result<Vec<ScrapedArticle>> {
    let html = super::get_text(client, url).await?;
    let articles = parse_trending(&html, url, Utc::now())?;
    info!(count = articles.len(), "Scraped GitHub Trending repositories");
    Ok(articles)
}
