//! Hosted LLM access: chat completions for the newsletter text and image
//! generation for the cover.
//!
//! # Architecture
//!
//! - [`LanguageModel`]: Core trait the pipeline is generic over
//! - [`OpenAiClient`]: Talks to any OpenAI-compatible endpoint over `reqwest`
//! - [`RetryModel`]: Decorator that adds backoff retries to any `LanguageModel`
//!
//! Calls are single-attempt unless `llm.max_retries` is raised. A non-2xx
//! response becomes [`Error::Api`] carrying the response body.

use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::utils::truncate_for_log;

/// A generated cover image as returned by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedImage {
    Base64(String),
    Url(String),
}

/// Text and image generation.
///
/// Implementors must be usable from a single task; the pipeline never calls
/// them concurrently.
pub trait LanguageModel {
    /// Identifier recorded in newsletter metadata.
    fn model_name(&self) -> &str;

    async fn generate_text(&self, prompt: &str) -> Result<String>;

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

/// Client for an OpenAI-compatible API.
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    config: LlmConfig,
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            config,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|e| Error::Config(format!("invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp> {
        let response = self
            .http
            .post(self.endpoint(path))
            .headers(self.headers()?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body_preview = %truncate_for_log(&body, 300),
                "LLM endpoint returned an error"
            );
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

impl LanguageModel for OpenAiClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    #[instrument(level = "info", skip_all, fields(model = %self.config.model))]
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        let t0 = Instant::now();
        let response: ChatResponse = self.post("chat/completions", &request).await?;
        debug!(elapsed_ms = t0.elapsed().as_millis(), "Chat completion returned");

        parse_chat(response)
    }

    #[instrument(level = "info", skip_all, fields(model = %self.config.image_model))]
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = ImageRequest {
            model: &self.config.image_model,
            prompt,
            n: 1,
            size: &self.config.image_size,
        };
        let response: ImageResponse = self.post("images/generations", &request).await?;
        parse_image(response)
    }
}

fn parse_chat(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(Error::EmptyResponse("chat completion"))
}

fn parse_image(response: ImageResponse) -> Result<GeneratedImage> {
    let datum = response
        .data
        .into_iter()
        .next()
        .ok_or(Error::EmptyResponse("image generation"))?;
    match (datum.b64_json, datum.url) {
        (Some(b64), _) => Ok(GeneratedImage::Base64(b64)),
        (None, Some(url)) => Ok(GeneratedImage::Url(url)),
        (None, None) => Err(Error::EmptyResponse("image generation")),
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`LanguageModel`].
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
/// With `max_retries == 0` it makes exactly one attempt.
pub struct RetryModel<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T: LanguageModel> RetryModel<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = (attempt - 1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }

    async fn with_retries<R, F, Fut>(&self, what: &'static str, mut call: F) -> Result<R>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;
        loop {
            match call().await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            what,
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis(),
                            error = %e,
                            "Generation failed"
                        );
                        return Err(e);
                    }
                    let delay = self.backoff(attempt);
                    warn!(what, attempt, max = self.max_retries, ?delay, error = %e, "Attempt failed; backing off");
                    sleep(delay).await;
                }
            }
        }
    }
}

impl<T> fmt::Debug for RetryModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryModel")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: LanguageModel> LanguageModel for RetryModel<T> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let t0 = Instant::now();
        let res = self
            .with_retries("text", || self.inner.generate_text(prompt))
            .await;
        if let Ok(text) = &res {
            info!(elapsed_ms = t0.elapsed().as_millis(), chars = text.len(), "Generated newsletter text");
        }
        res
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage> {
        self.with_retries("image", || self.inner.generate_image(prompt))
            .await
    }
}
