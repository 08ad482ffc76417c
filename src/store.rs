//! Scraped-article persistence and deduplication.
//!
//! Articles are keyed by URL. The store is a single JSON file that is read at
//! open and rewritten in full by [`ArticleStore::save`]; there is no locking,
//! so two concurrent runs against the same data directory can race.
//!
//! Only articles flagged `used` are spent. A stored article that was never
//! selected stays available to later runs through [`ArticleStore::unused`].

use itertools::Itertools;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::models::ScrapedArticle;

#[derive(Debug, Default)]
pub struct ArticleStore {
    path: Option<PathBuf>,
    articles: BTreeMap<String, ScrapedArticle>,
}

impl ArticleStore {
    /// A store that lives only in memory; `save` is a no-op.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or start) the store at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let articles = match fs::read_to_string(&path).await {
            Ok(text) => {
                let list: Vec<ScrapedArticle> = serde_json::from_str(&text)?;
                list.into_iter().map(|a| (a.url.clone(), a)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(count = articles.len(), "Opened article store");
        Ok(Self {
            path: Some(path),
            articles,
        })
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&ScrapedArticle> {
        self.articles.get(url)
    }

    /// Whether `url` is stored and already consumed by a publish.
    pub fn is_used(&self, url: &str) -> bool {
        self.get(url).is_some_and(|a| a.used)
    }

    /// Stored articles no publish has consumed yet.
    pub fn unused(&self) -> impl Iterator<Item = &ScrapedArticle> {
        self.articles.values().filter(|a| !a.used)
    }

    /// Drop articles already used or repeated in `candidates`, keeping order.
    ///
    /// Stored but unused URLs pass through, so a story that lost out once
    /// can still be selected later. The first of any repeated URL wins.
    pub fn filter_new(&self, candidates: Vec<ScrapedArticle>) -> Vec<ScrapedArticle> {
        let before = candidates.len();
        let fresh: Vec<ScrapedArticle> = candidates
            .into_iter()
            .filter(|a| !self.is_used(&a.url))
            .unique_by(|a| a.url.clone())
            .collect();
        debug!(before, after = fresh.len(), "Filtered out known articles");
        fresh
    }

    /// Insert articles whose URL is not stored yet. Returns how many were added.
    pub fn insert_all(&mut self, articles: &[ScrapedArticle]) -> usize {
        let mut added = 0;
        for article in articles {
            if !self.articles.contains_key(&article.url) {
                self.articles.insert(article.url.clone(), article.clone());
                added += 1;
            }
        }
        added
    }

    /// Flag the given URLs as consumed. Returns how many rows changed.
    pub fn mark_used<'a>(&mut self, urls: impl IntoIterator<Item = &'a str>) -> usize {
        let mut changed = 0;
        for url in urls {
            if let Some(article) = self.articles.get_mut(url) {
                if !article.used {
                    article.used = true;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Rewrite the backing file through a temp file and rename.
    #[instrument(level = "info", skip_all)]
    pub async fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let list: Vec<&ScrapedArticle> = self.articles.values().collect();
        let json = serde_json::to_string_pretty(&list)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, path).await?;
        info!(path = %path.display(), count = list.len(), "Saved article store");
        Ok(())
    }
}
