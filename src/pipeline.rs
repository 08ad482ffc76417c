//! The generation run: fetch, score, dedupe, prompt, generate, publish.
//!
//! Every collaborator is handed in through [`Pipeline::new`], so tests can
//! swap in a fake [`LanguageModel`] and an in-memory [`ArticleStore`].
//! Nothing is persisted until the newsletter has been written; a failed run
//! leaves the store untouched and can simply be restarted.

use chrono::{DateTime, Utc};
use reqwest::Client;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

use crate::api::LanguageModel;
use crate::assemble::assemble_newsletter;
use crate::config::{AppConfig, Extras};
use crate::error::Result;
use crate::models::{NewsletterType, ScrapedArticle};
use crate::outputs::image;
use crate::prompt::{build_prompt, image_prompt};
use crate::publish::{PublishedNewsletter, Publisher};
use crate::scoring::score_articles;
use crate::scrapers;
use crate::store::ArticleStore;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub kind: NewsletterType,
    pub extras: Extras,
    /// Stop after building the prompt; nothing is generated or saved.
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub fetched: usize,
    pub fresh: usize,
    pub selected: usize,
    pub prompt: String,
    pub published: Option<PublishedNewsletter>,
}

pub struct Pipeline<M> {
    config: AppConfig,
    http: Client,
    model: M,
    store: ArticleStore,
    publisher: Publisher,
    staging_dir: PathBuf,
}

impl<M: LanguageModel> Pipeline<M> {
    pub fn new(
        config: AppConfig,
        http: Client,
        model: M,
        store: ArticleStore,
        publisher: Publisher,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            http,
            model,
            store,
            publisher,
            staging_dir,
        }
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    /// Fetch from every configured source, then [`Pipeline::process`].
    pub async fn run(&mut self, options: &RunOptions) -> Result<RunReport> {
        let candidates =
            scrapers::fetch_all(&self.http, &self.config.sources, &self.config.fetch).await;
        self.process(candidates, options, Utc::now()).await
    }

    /// Everything after fetching, for a given set of candidates and clock.
    #[instrument(level = "info", skip_all, fields(kind = %options.kind, dry_run = options.dry_run))]
    pub async fn process(
        &mut self,
        candidates: Vec<ScrapedArticle>,
        options: &RunOptions,
        now: DateTime<Utc>,
    ) -> Result<RunReport> {
        let fetched = candidates.len();

        // stored articles that were never selected compete again
        let mut candidates = candidates;
        candidates.extend(self.store.unused().cloned());
        let backlog = candidates.len() - fetched;

        let scored = score_articles(&self.config.scoring, candidates, options.kind, now);
        let fresh = self.store.filter_new(scored);
        let added = self.store.insert_all(&fresh);
        info!(fetched, backlog, fresh = fresh.len(), added, "Deduplicated candidates");

        let selected: Vec<ScrapedArticle> = fresh
            .iter()
            .take(self.config.prompt.max_articles)
            .cloned()
            .collect();
        let prompt = build_prompt(&self.config.prompt, options.kind, &selected, &options.extras);
        info!(selected = selected.len(), prompt_chars = prompt.len(), "Built prompt");

        let mut report = RunReport {
            fetched,
            fresh: fresh.len(),
            selected: selected.len(),
            prompt,
            published: None,
        };
        if options.dry_run {
            info!("Dry run; skipping generation");
            return Ok(report);
        }

        let text = self.model.generate_text(&report.prompt).await?;
        let newsletter = assemble_newsletter(
            &text,
            options.kind,
            &selected,
            &options.extras,
            self.model.model_name(),
            now,
        );
        info!(title = %newsletter.title, "Assembled newsletter");

        let staged = self.stage_cover(&newsletter.title, now).await;
        let published = self.publisher.publish(newsletter, staged.as_deref()).await?;

        let used = self
            .store
            .mark_used(selected.iter().map(|a| a.url.as_str()));
        self.store.save().await?;
        info!(used, dir = %published.dir.display(), "Run complete");

        report.published = Some(published);
        Ok(report)
    }

    /// Generate and stage the cover. Failures are logged, never propagated.
    async fn stage_cover(&self, title: &str, now: DateTime<Utc>) -> Option<PathBuf> {
        let generated = match self.model.generate_image(&image_prompt(title)).await {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "Cover generation failed; placeholder will be used");
                return None;
            }
        };
        let stem = now.format("%Y-%m-%d-%H%M%S").to_string();
        match image::stage_image(&self.http, &generated, &self.staging_dir, &stem).await {
            Ok(path) => Some(path),
            Err(e) => {
                error!(error = %e, "Staging cover failed; placeholder will be used");
                None
            }
        }
    }
}
