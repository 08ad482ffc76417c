//! Reads published newsletters back from the essay tree.
//!
//! This mirrors what the website's static loader does, and is used by the
//! `list` and `set-status` commands.

use std::path::Path;
use tokio::fs;
use tracing::{instrument, warn};

use crate::error::{Error, Result};
use crate::models::Newsletter;

use super::{ESSAYS_DIR, METADATA_FILE, PAGE_FILE, mdx, metadata};

/// Load one newsletter directory: metadata plus page body.
pub async fn load_newsletter(dir: &Path) -> Result<Newsletter> {
    let mut newsletter = metadata::read_metadata(dir).await?;
    newsletter.content = match fs::read_to_string(dir.join(PAGE_FILE)).await {
        Ok(page) => mdx::parse_page(&page),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    Ok(newsletter)
}

/// Every newsletter under `content_root`, newest first.
///
/// Unreadable entries are logged and skipped, as the site does.
#[instrument(level = "info", skip_all, fields(content_root = %content_root.display()))]
pub async fn list_newsletters(content_root: &Path) -> Result<Vec<(std::path::PathBuf, Newsletter)>> {
    let pattern = content_root
        .join(ESSAYS_DIR)
        .join("*")
        .join("*")
        .join("week-*")
        .join("*")
        .join(METADATA_FILE);
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::Config(format!("non UTF-8 content root {}", content_root.display())))?;

    let paths = glob::glob(pattern).map_err(|e| Error::Config(format!("bad glob pattern: {e}")))?;

    let mut found = Vec::new();
    for entry in paths {
        let metadata_path = match entry {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Unreadable path while listing newsletters");
                continue;
            }
        };
        let Some(dir) = metadata_path.parent() else {
            continue;
        };
        match load_newsletter(dir).await {
            Ok(newsletter) => found.push((dir.to_path_buf(), newsletter)),
            Err(e) => warn!(dir = %dir.display(), error = %e, "Skipping unreadable newsletter"),
        }
    }

    found.sort_by(|(_, a), (_, b)| {
        b.publish_date
            .cmp(&a.publish_date)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    Ok(found)
}
