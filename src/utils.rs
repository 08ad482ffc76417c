//! Utility functions for string manipulation and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Slug generation for newsletter folders and URLs
//! - Character-safe truncation for snippets and log previews
//! - File system validation for output directories

use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use crate::error::Result;

/// Longest slug [`slugify`] produces, leaving room for a `-N` suffix.
pub const MAX_SLUG_LEN: usize = 80;

/// Convert a title to a filesystem- and URL-safe slug.
///
/// Lowercases ASCII letters, turns every run of other characters into a
/// single hyphen and trims hyphens from both ends. Slugs longer than
/// [`MAX_SLUG_LEN`] are cut back to the last whole word that fits. The output
/// only ever contains `[a-z0-9-]` and `slugify(slugify(x)) == slugify(x)`.
///
/// # Arguments
///
/// * `title` - Any human-readable title, Unicode included
///
/// # Returns
///
/// The slug, which is empty when the title has no ASCII letters or digits.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("  OpenAI raises $500M!  "), "openai-raises-500m");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    cap_slug(slug)
}

fn cap_slug(mut slug: String) -> String {
    if slug.len() <= MAX_SLUG_LEN {
        return slug;
    }
    // slug is pure ASCII, so byte offsets are char offsets
    let cut = if slug.as_bytes()[MAX_SLUG_LEN] == b'-' {
        MAX_SLUG_LEN
    } else {
        match slug[..MAX_SLUG_LEN].rfind('-') {
            Some(i) if i > 0 => i,
            _ => MAX_SLUG_LEN,
        }
    };
    slug.truncate(cut);
    let trimmed = slug.trim_end_matches('-').len();
    slug.truncate(trimmed);
    slug
}

/// Truncate `s` to at most `max` characters, appending `…` when cut.
///
/// Whitespace runs are collapsed first so multi-line article bodies make
/// compact one-line snippets.
pub fn snippet(s: &str, max: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(max).collect();
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push('…');
    out
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary at or before `max` bytes and
/// get a `"…(+N bytes)"` suffix.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Capitalize the first character of a string.
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).await?;
    let scratch = path.join(".write-check");
    fs::write(&scratch, b"").await?;
    let _ = fs::remove_file(&scratch).await;
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Test-Article!"), "test-article");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("Special@#$Characters"), "special-characters");
        assert_eq!(slugify("--Already-slugged--"), "already-slugged");
        assert_eq!(slugify("Café déjà vu"), "caf-d-j-vu");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_slugify_idempotent_and_charset() {
        let titles = [
            "OpenAI raises $500M Series C",
            "  The   Week in AI:  GPT-5, Agents & You ",
            "Ünïcödé — titles / with | pipes",
            "a--b__c  d",
            "-leading and trailing-",
            "123 Numbers 456",
        ];
        for title in titles {
            let once = slugify(title);
            assert_eq!(slugify(&once), once, "not idempotent for {title:?}");
            assert!(
                once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "bad charset in {once:?}"
            );
            assert!(!once.starts_with('-') && !once.ends_with('-'), "{once:?}");
            assert!(!once.contains("--"), "{once:?}");
        }
    }

    #[test]
    fn test_slugify_caps_long_titles_at_a_word() {
        let title = "The agents are coming and they brought benchmarks ".repeat(9);
        let slug = slugify(&title);
        assert!(slug.len() <= MAX_SLUG_LEN, "{} chars", slug.len());
        assert!(slug.starts_with("the-agents-are-coming"));
        assert!(!slug.ends_with('-'));
        assert!(title.to_lowercase().replace(' ', "-").starts_with(&format!("{slug}-")));
        assert_eq!(slugify(&slug), slug);

        let unbroken = "x".repeat(300);
        assert_eq!(slugify(&unbroken).len(), MAX_SLUG_LEN);
        // "abcd-" repeats; position 80 starts a word, so the cut falls on 79
        assert_eq!(slugify(&"abcd ".repeat(40)).len(), MAX_SLUG_LEN - 1);
    }

    #[test]
    fn test_snippet_truncates_on_chars() {
        assert_eq!(snippet("short\n\n text", 200), "short text");
        let long = "é".repeat(300);
        let s = snippet(&long, 200);
        assert_eq!(s.chars().count(), 201);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let s = "ü".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with('ü'));
        assert!(result.contains("(+18 bytes)"));
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("hello"), "Hello");
        assert_eq!(upcase(""), "");
        assert_eq!(upcase("a"), "A");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join(".write-check").exists());
    }
}
