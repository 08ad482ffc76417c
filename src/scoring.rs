//! Relevance scoring for scraped articles.
//!
//! Each article earns points for its source's reputation, its recency, the
//! generic AI keywords it mentions, the keywords of the target newsletter
//! type, and the tags derived from those matches. The total is clamped to
//! `[0, 100]`. Scoring is pure: it takes `now` as an argument and never fails.
//!
//! # Ordering
//!
//! Ties are broken by publish date (newest first, undated last) and then by
//! URL, so the same input always yields the same order.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::{debug, instrument};

use crate::config::ScoringConfig;
use crate::models::{NewsletterType, ScrapedArticle};

pub const MAX_SCORE: f64 = 100.0;

/// Reputation weight for `source`, matched case-insensitively.
pub fn source_weight(config: &ScoringConfig, source: &str) -> f64 {
    config
        .source_weights
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(source.trim()))
        .map(|(_, weight)| *weight)
        .unwrap_or(config.default_source_weight)
}

/// Step bonus by article age. Undated articles get nothing; future dates count as fresh.
pub fn recency_bonus(
    config: &ScoringConfig,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let Some(published_at) = published_at else {
        return 0.0;
    };
    let age_hours = (now - published_at).num_minutes().max(0) as f64 / 60.0;
    if age_hours < 24.0 {
        config.recency_24h_bonus
    } else if age_hours < 48.0 {
        config.recency_48h_bonus
    } else if age_hours < 168.0 {
        config.recency_week_bonus
    } else {
        0.0
    }
}

/// Keywords from `keywords` that occur in `haystack` (already lowercased).
fn matching<'a>(keywords: &'a [String], haystack: &str) -> Vec<&'a String> {
    keywords
        .iter()
        .filter(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
        .collect()
}

/// Generic AI keywords found in the article's title and content.
pub fn extract_tags(config: &ScoringConfig, article: &ScrapedArticle) -> Vec<String> {
    let haystack = format!("{} {}", article.title, article.content).to_lowercase();
    matching(&config.ai_keywords, &haystack)
        .into_iter()
        .cloned()
        .collect()
}

/// Score a single article without touching it.
pub fn score_article(
    config: &ScoringConfig,
    article: &ScrapedArticle,
    kind: NewsletterType,
    now: DateTime<Utc>,
) -> f64 {
    let haystack = format!("{} {}", article.title, article.content).to_lowercase();

    let keyword_hits = matching(&config.ai_keywords, &haystack).len() as f64;
    let type_hits = config
        .type_keywords
        .get(&kind)
        .map(|keywords| matching(keywords, &haystack).len())
        .unwrap_or(0) as f64;

    let score = source_weight(config, &article.source)
        + recency_bonus(config, article.published_at, now)
        + keyword_hits * config.keyword_bonus
        + type_hits * config.type_keyword_bonus
        // tags are exactly the generic keyword matches
        + keyword_hits * config.tag_bonus;

    score.clamp(0.0, MAX_SCORE)
}

/// Descending by score, then newest first, then URL.
fn ranking(a: &ScrapedArticle, b: &ScrapedArticle) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| match (a.published_at, b.published_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.url.cmp(&b.url))
}

/// Populate score and tags on every article and sort them best first.
///
/// # Arguments
///
/// * `config` - Source weights, recency bonuses and keyword lists
/// * `articles` - Candidates in any order; consumed
/// * `kind` - Newsletter type whose topic keywords add to the score
/// * `now` - Reference time for the recency boost
///
/// # Returns
///
/// The same articles with `relevance_score` and `tags` set, ordered by score
/// descending, then newest first, then URL.
#[instrument(level = "info", skip_all, fields(count = articles.len(), %kind))]
pub fn score_articles(
    config: &ScoringConfig,
    mut articles: Vec<ScrapedArticle>,
    kind: NewsletterType,
    now: DateTime<Utc>,
) -> Vec<ScrapedArticle> {
    for article in &mut articles {
        article.relevance_score = score_article(config, article, kind, now);
        article.tags = extract_tags(config, article);
    }
    articles.sort_by(ranking);

    if let Some(top) = articles.first() {
        debug!(top_score = top.relevance_score, top_title = %top.title, "Scored articles");
    }
    articles
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn article(title: &str, content: &str, source: &str, age: Option<Duration>) -> ScrapedArticle {
        let now = fixed_now();
        ScrapedArticle::new(
            title,
            content,
            format!("https://example.com/{}", crate::utils::slugify(title)),
            source,
            age.map(|a| now - a),
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_source_weight_lookup() {
        let config = ScoringConfig::default();
        assert_eq!(source_weight(&config, "TechCrunch"), 9.0);
        assert_eq!(source_weight(&config, "hacker news"), 8.0);
        assert_eq!(source_weight(&config, "Some Blog"), 5.0);
    }

    #[test]
    fn test_recency_steps() {
        let config = ScoringConfig::default();
        let now = fixed_now();
        let at = |h: i64| Some(now - Duration::hours(h));
        assert_eq!(recency_bonus(&config, at(2), now), 5.0);
        assert_eq!(recency_bonus(&config, at(30), now), 3.0);
        assert_eq!(recency_bonus(&config, at(100), now), 1.0);
        assert_eq!(recency_bonus(&config, at(200), now), 0.0);
        assert_eq!(recency_bonus(&config, None, now), 0.0);
        assert_eq!(recency_bonus(&config, Some(now + Duration::hours(3)), now), 5.0);
    }

    #[test]
    fn test_score_components_add_up() {
        let config = ScoringConfig::default();
        let a = article(
            "OpenAI raises $500M Series C",
            "The funding round values the LLM maker highly.",
            "TechCrunch",
            Some(Duration::hours(2)),
        );
        // 9 source + 5 recency + 2 keywords (openai, llm) * (2 + 1 tag) + 2 type hits (funding, raises) * 1.5
        let score = score_article(&config, &a, NewsletterType::WeeklyDigest, fixed_now());
        assert_eq!(score, 9.0 + 5.0 + 2.0 * 3.0 + 2.0 * 1.5);
    }

    #[test]
    fn test_identical_inputs_score_identically() {
        let config = ScoringConfig::default();
        let mut a = article("GPT agents", "claude", "VentureBeat", Some(Duration::hours(5)));
        let mut b = a.clone();
        a.id = "a".into();
        b.id = "b".into();
        b.url = "https://other.example/x".into();
        let now = fixed_now();
        assert_eq!(
            score_article(&config, &a, NewsletterType::InnovationReport, now),
            score_article(&config, &b, NewsletterType::InnovationReport, now)
        );
    }

    #[test]
    fn test_score_monotonic_in_keyword_matches() {
        let config = ScoringConfig::default();
        let now = fixed_now();
        let mut content = String::new();
        let mut previous = score_article(
            &config,
            &article("News", &content, "Hacker News", Some(Duration::hours(1))),
            NewsletterType::WeeklyDigest,
            now,
        );
        for keyword in &config.ai_keywords {
            content.push_str(keyword);
            content.push(' ');
            let next = score_article(
                &config,
                &article("News", &content, "Hacker News", Some(Duration::hours(1))),
                NewsletterType::WeeklyDigest,
                now,
            );
            assert!(next >= previous, "score dropped after adding {keyword}");
            previous = next;
        }
    }

    #[test]
    fn test_score_is_clamped() {
        let config = ScoringConfig::default();
        let everything = config.ai_keywords.join(" ").repeat(3)
            + " "
            + &config.type_keywords.values().flatten().cloned().collect::<Vec<_>>().join(" ");
        let a = article(&everything, &everything, "TechCrunch", Some(Duration::hours(1)));
        for kind in [
            NewsletterType::WeeklyDigest,
            NewsletterType::InnovationReport,
            NewsletterType::BusinessCareers,
        ] {
            let s = score_article(&config, &a, kind, fixed_now());
            assert!(s <= MAX_SCORE && s >= 0.0);
        }

        let mut heavy = ScoringConfig::default();
        heavy.default_source_weight = 500.0;
        let b = article("x", "y", "Unknown", None);
        assert_eq!(score_article(&heavy, &b, NewsletterType::WeeklyDigest, fixed_now()), 100.0);
        heavy.default_source_weight = -50.0;
        assert_eq!(score_article(&heavy, &b, NewsletterType::WeeklyDigest, fixed_now()), 0.0);
    }

    #[test]
    fn test_recent_reputable_beats_stale_unknown() {
        let config = ScoringConfig::default();
        let fresh = article(
            "OpenAI raises $500M Series C",
            "",
            "TechCrunch",
            Some(Duration::hours(2)),
        );
        let mut stale = fresh.clone();
        stale.source = "Random Substack".into();
        stale.published_at = Some(fixed_now() - Duration::days(6));
        stale.url = "https://substack.example/post".into();

        let ranked = score_articles(
            &config,
            vec![stale.clone(), fresh.clone()],
            NewsletterType::WeeklyDigest,
            fixed_now(),
        );
        assert_eq!(ranked[0].url, fresh.url);
        assert!(ranked[0].relevance_score > ranked[1].relevance_score);
        assert_eq!(ranked[0].tags, vec!["openai".to_string()]);
    }

    #[test]
    fn test_ties_break_by_date_then_url() {
        let config = ScoringConfig::default();
        let base = |url: &str, age: Option<Duration>| {
            let mut a = article("plain", "", "Unknown", age);
            a.url = url.to_string();
            a
        };
        // same recency bucket, so equal scores
        let older = base("https://a.example", Some(Duration::hours(10)));
        let newer = base("https://b.example", Some(Duration::hours(1)));
        let undated_z = base("https://z.example", None);
        let undated_y = base("https://y.example", None);

        let ranked = score_articles(
            &config,
            vec![undated_z, older, undated_y, newer],
            NewsletterType::BusinessCareers,
            fixed_now(),
        );
        let urls: Vec<_> = ranked.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://b.example",
                "https://a.example",
                "https://y.example",
                "https://z.example"
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        let config = ScoringConfig::default();
        assert!(score_articles(&config, vec![], NewsletterType::WeeklyDigest, fixed_now()).is_empty());
    }
}
