//! Crate-wide error type.
//!
//! Failures are flat: the pipeline either logs and falls back (image
//! generation, a single news source) or propagates one of these variants up to
//! `main`, which exits non-zero.

use thiserror::Error;

use crate::models::NewsletterStatus;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Feed parse error: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Non-2xx answer from the LLM provider; `body` is the raw response text.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scraping error: {0}")]
    Scrape(String),

    #[error("Cannot move newsletter from {from} to {to}")]
    InvalidTransition {
        from: NewsletterStatus,
        to: NewsletterStatus,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
