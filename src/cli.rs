//! Command-line interface definitions.
//!
//! Global options can also come from the environment; the API key is read
//! from `OPENAI_API_KEY` when `--api-key` is not given.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{NewsletterStatus, NewsletterType};

/// Generate and manage Infinite Runway newsletters.
///
/// ```sh
/// # Draft and publish this week's digest into the site checkout
/// runway_press generate --type weekly-digest --content-root ../site
///
/// # Only print the prompt that would be sent
/// runway_press generate --type business-careers --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml
    #[arg(short, long, global = true, env = "RUNWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// API key for the OpenAI-compatible endpoint
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch sources, generate a newsletter and publish it
    Generate {
        /// Newsletter type to generate
        #[arg(short = 't', long = "type", value_enum, default_value_t = NewsletterType::WeeklyDigest)]
        kind: NewsletterType,

        /// Root of the site checkout; essays are written below it
        #[arg(long, default_value = ".")]
        content_root: PathBuf,

        /// Directory for the article store and staged images
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// YAML file with sponsor and company listings
        #[arg(long)]
        extras: Option<PathBuf>,

        /// Build and print the prompt without calling the model
        #[arg(long)]
        dry_run: bool,
    },

    /// List published newsletters, newest first
    List {
        #[arg(long, default_value = ".")]
        content_root: PathBuf,
    },

    /// Move a newsletter to the next status
    SetStatus {
        /// Newsletter directory containing metadata.json
        dir: PathBuf,

        #[arg(value_enum)]
        status: NewsletterStatus,
    },
}
