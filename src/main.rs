//! # Runway Press
//!
//! Content pipeline for the Infinite Runway AI newsletter. It pulls candidate
//! stories from Hacker News, a set of RSS/Atom feeds and GitHub Trending,
//! ranks them for the requested newsletter type, asks an OpenAI-compatible
//! model to write the issue and a cover image, and publishes the result into
//! the site's `essays/` tree.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=sk-... runway_press generate --type weekly-digest --content-root ../site
//! runway_press list --content-root ../site
//! runway_press set-status ../site/essays/2025/05/week-2/some-slug sent
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: every source, best effort, bounded fan-out
//! 2. **Ranking**: relevance scoring and URL deduplication against the store
//! 3. **Generation**: one prompt, one completion, one cover image
//! 4. **Publishing**: `metadata.json`, `page.mdx` and a cover per newsletter

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod assemble;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod publish;
mod scoring;
mod scrapers;
mod store;
mod utils;

use api::{OpenAiClient, RetryModel};
use cli::{Cli, Command};
use config::{AppConfig, Extras};
use pipeline::{Pipeline, RunOptions};
use publish::Publisher;
use store::ArticleStore;
use utils::ensure_writable_dir;

const STORE_FILE: &str = "articles.json";
const STAGING_DIR: &str = "images";

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("runway_press starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, command = ?args.command, "Parsed CLI arguments");

    let config = AppConfig::load(args.config.as_deref())?;

    let outcome = match args.command {
        Command::Generate {
            kind,
            content_root,
            data_dir,
            extras,
            dry_run,
        } => {
            let extras = match extras {
                Some(path) => Extras::load(&path)?,
                None => Extras::default(),
            };
            let options = RunOptions {
                kind,
                extras,
                dry_run,
            };
            generate(config, args.api_key, &content_root, &data_dir, options).await
        }
        Command::List { content_root } => list(&content_root).await,
        Command::SetStatus { dir, status } => publish::set_status(&dir, status)
            .await
            .map(|n| println!("{} -> {}", n.slug, n.status)),
    };

    if let Err(e) = outcome {
        error!(error = %e, "Run failed");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

async fn generate(
    config: AppConfig,
    api_key: Option<String>,
    content_root: &Path,
    data_dir: &Path,
    options: RunOptions,
) -> error::Result<()> {
    // A dry run never reaches the model, so it needs no key.
    let api_key = match api_key {
        Some(key) => key,
        None if options.dry_run => String::new(),
        None => {
            return Err(error::Error::Config(
                "no API key; pass --api-key or set OPENAI_API_KEY".into(),
            ));
        }
    };

    if !options.dry_run {
        ensure_writable_dir(content_root).await?;
    }
    ensure_writable_dir(data_dir).await?;

    let http = scrapers::http_client(&config.fetch)?;
    let store = ArticleStore::open(data_dir.join(STORE_FILE)).await?;
    if store.is_empty() {
        info!("Article store is empty; every fetched article counts as new");
    }
    let publisher = Publisher::new(content_root);
    info!(content_root = %publisher.content_root().display(), kind = %options.kind, "Generating newsletter");

    let model = RetryModel::new(
        OpenAiClient::new(api_key, config.llm.clone())?,
        config.llm.max_retries,
        Duration::from_secs(1),
    );
    let mut pipeline = Pipeline::new(
        config,
        http,
        model,
        store,
        publisher,
        data_dir.join(STAGING_DIR),
    );

    let report = pipeline.run(&options).await?;
    info!(
        fetched = report.fetched,
        fresh = report.fresh,
        selected = report.selected,
        stored = pipeline.store().len(),
        "Pipeline finished"
    );

    match report.published {
        Some(published) => {
            info!(
                title = %published.newsletter.title,
                slug = %published.newsletter.slug,
                status = %published.newsletter.status,
                "Newsletter ready"
            );
            println!("{}", published.dir.display());
        }
        None => println!("{}", report.prompt),
    }
    Ok(())
}

async fn list(content_root: &Path) -> error::Result<()> {
    let newsletters = outputs::loader::list_newsletters(content_root).await?;
    info!(count = newsletters.len(), "Listed newsletters");
    for (dir, n) in newsletters {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            n.publish_date,
            n.status,
            n.kind,
            n.title,
            dir.display()
        );
    }
    Ok(())
}
