//! `metadata.json` reading and writing.

use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::Newsletter;

use super::METADATA_FILE;

/// Write the newsletter record as pretty JSON into `dir`.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), slug = %newsletter.slug))]
pub async fn write_metadata(dir: &Path, newsletter: &Newsletter) -> Result<()> {
    let json = serde_json::to_string_pretty(newsletter)?;
    let path = dir.join(METADATA_FILE);
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote metadata");
    Ok(())
}

/// Read the record from `dir`. `content` is left empty; it lives in the page.
pub async fn read_metadata(dir: &Path) -> Result<Newsletter> {
    let text = fs::read_to_string(dir.join(METADATA_FILE)).await?;
    Ok(serde_json::from_str(&text)?)
}
