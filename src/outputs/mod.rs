//! Static-site output: the essay directory layout and the files inside it.
//!
//! # Submodules
//!
//! - [`metadata`]: `metadata.json`, the newsletter record read by the site
//! - [`mdx`]: `page.mdx`, the rendered body
//! - [`image`]: cover image staging, copying and the placeholder SVG
//! - [`loader`]: reads published newsletters back, as the website does
//!
//! # Output Structure
//!
//! The layout is a contract with the website's file-system loader and must
//! not change:
//!
//! ```text
//! content_root/
//! └── essays/
//!     └── 2025/
//!         └── 05/
//!             └── week-1/
//!                 └── the-agents-are-coming/
//!                     ├── metadata.json
//!                     ├── page.mdx
//!                     └── cover.png        # or cover.svg placeholder
//! ```

use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

pub mod image;
pub mod loader;
pub mod mdx;
pub mod metadata;

pub const ESSAYS_DIR: &str = "essays";
pub const METADATA_FILE: &str = "metadata.json";
pub const PAGE_FILE: &str = "page.mdx";

/// Week of the month, 1-based: days 1-7 are week 1, 29-31 are week 5.
pub fn week_of_month(date: NaiveDate) -> u32 {
    date.day().div_ceil(7)
}

/// `essays/{year}/{month}/week-{n}` relative to the content root.
pub fn bucket_path(date: NaiveDate) -> PathBuf {
    PathBuf::from(ESSAYS_DIR)
        .join(date.year().to_string())
        .join(format!("{:02}", date.month()))
        .join(format!("week-{}", week_of_month(date)))
}

/// Full directory for one newsletter.
pub fn essay_dir(content_root: &Path, date: NaiveDate, slug: &str) -> PathBuf {
    content_root.join(bucket_path(date)).join(slug)
}

/// Site-absolute URL of a file inside a newsletter's directory.
pub fn site_path(date: NaiveDate, slug: &str, file: &str) -> String {
    format!(
        "/{}/{}/{:02}/week-{}/{}/{}",
        ESSAYS_DIR,
        date.year(),
        date.month(),
        week_of_month(date),
        slug,
        file
    )
}
