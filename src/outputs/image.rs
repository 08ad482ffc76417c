//! Cover images.
//!
//! The generated image is first staged to disk (decoded from base64 or
//! downloaded), then copied into the newsletter directory by the publisher.
//! When there is nothing to copy, or the copy fails, a placeholder SVG is
//! written instead so every newsletter has a cover.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

use crate::api::GeneratedImage;
use crate::error::Result;

pub const COVER_STEM: &str = "cover";
pub const PLACEHOLDER_FILE: &str = "cover.svg";

/// Guess a file extension from magic bytes.
pub fn image_extension(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [0xFF, 0xD8, 0xFF, ..] => "jpg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "webp",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        _ => "png",
    }
}

/// Write the generated image under `staging_dir` as `{stem}.{ext}`.
#[instrument(level = "info", skip_all, fields(staging_dir = %staging_dir.display(), %stem))]
pub async fn stage_image(
    client: &Client,
    image: &GeneratedImage,
    staging_dir: &Path,
    stem: &str,
) -> Result<PathBuf> {
    let bytes = match image {
        GeneratedImage::Base64(data) => STANDARD.decode(data.trim())?,
        GeneratedImage::Url(url) => client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?
            .to_vec(),
    };
    fs::create_dir_all(staging_dir).await?;
    let path = staging_dir.join(format!("{stem}.{}", image_extension(&bytes)));
    fs::write(&path, &bytes).await?;
    info!(path = %path.display(), bytes = bytes.len(), "Staged cover image");
    Ok(path)
}

/// Copy a staged image into `dir` as `cover.{ext}`. Returns the file name.
pub async fn copy_cover(staged: &Path, dir: &Path) -> Result<String> {
    let ext = staged
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    let file = format!("{COVER_STEM}.{ext}");
    fs::copy(staged, dir.join(&file)).await?;
    Ok(file)
}

/// A simple branded cover showing the title.
pub fn placeholder_svg(title: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1792" height="1024" viewBox="0 0 1792 1024">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="#0b1533"/>
      <stop offset="100%" stop-color="#123b5c"/>
    </linearGradient>
  </defs>
  <rect width="1792" height="1024" fill="url(#bg)"/>
  <path d="M896 1024 L836 560 L956 560 Z" fill="#19e3c4" opacity="0.25"/>
  <text x="896" y="420" font-family="Helvetica, Arial, sans-serif" font-size="64" fill="#ffffff" text-anchor="middle">{}</text>
  <text x="896" y="500" font-family="Helvetica, Arial, sans-serif" font-size="32" fill="#19e3c4" text-anchor="middle">Infinite Runway</text>
</svg>
"##,
        escape(title)
    )
}

/// Write the placeholder cover into `dir`. Returns the file name.
pub async fn write_placeholder(dir: &Path, title: &str) -> Result<String> {
    fs::write(dir.join(PLACEHOLDER_FILE), placeholder_svg(title)).await?;
    Ok(PLACEHOLDER_FILE.to_string())
}
