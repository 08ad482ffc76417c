//! Writes a generated newsletter into the site's essay tree.
//!
//! Publishing is not atomic: files are written one after another, and a crash
//! part-way leaves a partially filled directory behind. Directory names are
//! reserved with `create_dir`, so two publishes of the same title on the same
//! week get `slug` and `slug-2` instead of clobbering each other.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::models::{Newsletter, NewsletterStatus};
use crate::outputs::{self, image, loader, mdx, metadata};
use crate::utils::slugify;

/// Where a newsletter ended up.
#[derive(Debug, Clone)]
pub struct PublishedNewsletter {
    pub dir: PathBuf,
    pub newsletter: Newsletter,
}

#[derive(Debug, Clone)]
pub struct Publisher {
    content_root: PathBuf,
}

impl Publisher {
    pub fn new(content_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// Create the newsletter directory, appending `-2`, `-3`, ... when taken.
    async fn reserve_dir(&self, newsletter: &Newsletter, base_slug: &str) -> Result<(String, PathBuf)> {
        let bucket = self.content_root.join(outputs::bucket_path(newsletter.publish_date));
        fs::create_dir_all(&bucket).await?;

        let mut n = 1;
        loop {
            let slug = if n == 1 {
                base_slug.to_string()
            } else {
                format!("{base_slug}-{n}")
            };
            let dir = outputs::essay_dir(&self.content_root, newsletter.publish_date, &slug);
            match fs::create_dir(&dir).await {
                Ok(()) => return Ok((slug, dir)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Write `metadata.json`, `page.mdx` and a cover for `newsletter`.
    ///
    /// # Arguments
    ///
    /// * `newsletter` - The assembled newsletter; its slug and image URL are
    ///   filled in here
    /// * `staged_image` - A downloaded cover to copy in. When absent, or if
    ///   the copy fails, the placeholder SVG is written instead
    ///
    /// # Returns
    ///
    /// The directory written and the newsletter as stored. A draft comes
    /// back as published.
    #[instrument(level = "info", skip_all, fields(title = %newsletter.title))]
    pub async fn publish(
        &self,
        mut newsletter: Newsletter,
        staged_image: Option<&Path>,
    ) -> Result<PublishedNewsletter> {
        let mut base_slug = slugify(&newsletter.title);
        if base_slug.is_empty() {
            base_slug = format!("newsletter-{}", newsletter.publish_date);
        }
        let (slug, dir) = self.reserve_dir(&newsletter, &base_slug).await?;
        newsletter.slug = slug;

        let cover_file = match staged_image {
            Some(staged) => match image::copy_cover(staged, &dir).await {
                Ok(file) => file,
                Err(e) => {
                    warn!(staged = %staged.display(), error = %e, "Cover copy failed; writing placeholder");
                    image::write_placeholder(&dir, &newsletter.title).await?
                }
            },
            None => image::write_placeholder(&dir, &newsletter.title).await?,
        };
        newsletter.image_url = Some(outputs::site_path(
            newsletter.publish_date,
            &newsletter.slug,
            &cover_file,
        ));

        if newsletter.status == NewsletterStatus::Draft {
            newsletter.transition_to(NewsletterStatus::Published)?;
        }

        metadata::write_metadata(&dir, &newsletter).await?;
        let page = mdx::render_page(&newsletter.title, Some(&cover_file), &newsletter.content);
        fs::write(dir.join(outputs::PAGE_FILE), page).await?;

        info!(dir = %dir.display(), slug = %newsletter.slug, cover = %cover_file, "Published newsletter");
        Ok(PublishedNewsletter { dir, newsletter })
    }
}

/// Advance a written newsletter's status and rewrite its metadata.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), %to))]
pub async fn set_status(dir: &Path, to: NewsletterStatus) -> Result<Newsletter> {
    let mut newsletter = loader::load_newsletter(dir).await?;
    let from = newsletter.status;
    newsletter.transition_to(to)?;
    metadata::write_metadata(dir, &newsletter).await?;
    info!(%from, %to, slug = %newsletter.slug, "Updated newsletter status");
    Ok(newsletter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsletterMetadata, NewsletterType};
    use chrono::{NaiveDate, Utc};

    fn draft(title: &str) -> Newsletter {
        Newsletter {
            id: "id-1".into(),
            title: title.into(),
            slug: String::new(),
            description: "desc".into(),
            content: "## Section\n\nBody with {braces}.".into(),
            image_url: None,
            publish_date: NaiveDate::from_ymd_opt(2025, 5, 13).unwrap(),
            kind: NewsletterType::WeeklyDigest,
            status: NewsletterStatus::Draft,
            sponsor_info: None,
            companies_raising: vec![],
            companies_hiring: vec![],
            metadata: NewsletterMetadata {
                generator: "test".into(),
                model: "fake".into(),
                article_count: 0,
                source_urls: vec![],
                generated_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_publish_layout_and_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(tmp.path());

        let published = publisher.publish(draft("The Agents Are Coming!"), None).await.unwrap();
        let expected = tmp.path().join("essays/2025/05/week-2/the-agents-are-coming");
        assert_eq!(published.dir, expected);
        assert!(expected.join("metadata.json").is_file());
        assert!(expected.join("page.mdx").is_file());
        assert!(expected.join("cover.svg").is_file());
        assert_eq!(
            published.newsletter.image_url.as_deref(),
            Some("/essays/2025/05/week-2/the-agents-are-coming/cover.svg")
        );
        assert_eq!(published.newsletter.status, NewsletterStatus::Published);

        let loaded = loader::load_newsletter(&expected).await.unwrap();
        assert_eq!(loaded.title, published.newsletter.title);
        assert_eq!(loaded.slug, published.newsletter.slug);
        assert_eq!(loaded.publish_date, published.newsletter.publish_date);
        assert_eq!(loaded.content, published.newsletter.content);
        assert_eq!(loaded, published.newsletter);
    }

    #[tokio::test]
    async fn test_same_title_gets_suffix() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(tmp.path());
        let first = publisher.publish(draft("Same"), None).await.unwrap();
        let second = publisher.publish(draft("Same"), None).await.unwrap();
        assert_eq!(first.newsletter.slug, "same");
        assert_eq!(second.newsletter.slug, "same-2");
        assert_ne!(first.dir, second.dir);
    }

    #[tokio::test]
    async fn test_very_long_title_still_publishes() {
        let tmp = tempfile::tempdir().unwrap();
        let title = "Everything that happened in artificial intelligence this week ".repeat(8);
        let published = Publisher::new(tmp.path()).publish(draft(&title), None).await.unwrap();
        assert!(published.newsletter.slug.len() <= crate::utils::MAX_SLUG_LEN);
        assert!(published.dir.join("metadata.json").is_file());
    }

    #[tokio::test]
    async fn test_empty_slug_falls_back_to_date() {
        let tmp = tempfile::tempdir().unwrap();
        let published = Publisher::new(tmp.path()).publish(draft("???"), None).await.unwrap();
        assert_eq!(published.newsletter.slug, "newsletter-2025-05-13");
    }

    #[tokio::test]
    async fn test_staged_cover_copied_or_placeholder() {
        let tmp = tempfile::tempdir().unwrap();
        let staged = tmp.path().join("staged.png");
        fs::write(&staged, [0x89, b'P', b'N', b'G']).await.unwrap();
        let publisher = Publisher::new(tmp.path().join("site"));

        let with_cover = publisher.publish(draft("With Cover"), Some(&staged)).await.unwrap();
        assert!(with_cover.dir.join("cover.png").is_file());
        assert!(with_cover.newsletter.image_url.unwrap().ends_with("/cover.png"));

        let missing = tmp.path().join("missing.png");
        let fallback = publisher.publish(draft("Fallback"), Some(&missing)).await.unwrap();
        assert!(fallback.dir.join("cover.svg").is_file());
        assert!(!fallback.dir.join("cover.png").exists());
    }

    #[tokio::test]
    async fn test_set_status_and_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(tmp.path());
        let mut older = draft("Older");
        older.publish_date = NaiveDate::from_ymd_opt(2025, 4, 2).unwrap();
        let older = publisher.publish(older, None).await.unwrap();
        publisher.publish(draft("Newer"), None).await.unwrap();

        let sent = set_status(&older.dir, NewsletterStatus::Sent).await.unwrap();
        assert_eq!(sent.status, NewsletterStatus::Sent);
        assert!(set_status(&older.dir, NewsletterStatus::Published).await.is_err());

        let listed = loader::list_newsletters(tmp.path()).await.unwrap();
        let slugs: Vec<_> = listed.iter().map(|(_, n)| n.slug.as_str()).collect();
        assert_eq!(slugs, vec!["newer", "older"]);
        assert_eq!(listed[1].1.status, NewsletterStatus::Sent);
    }
}
