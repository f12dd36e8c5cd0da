//! Page title and thumbnail collection.
//!
//! A small script is evaluated inside the live page on every poll tick; the
//! structured result is folded into [`PageMetadata`], which keeps the best
//! title and thumbnail seen so far. Transient evaluation failures (page
//! navigating, DOM detached) are the caller's problem to skip; this module
//! only defines the extraction and replacement policy.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::classify::FilterConfig;
use crate::page::Page;

/// Placeholder title used until a real one is found. The orchestrator's
/// stop condition checks against this sentinel.
pub const TITLE_SENTINEL: &str = "Stream";

/// Title candidates shorter than this are page-transition noise.
const MIN_TITLE_LEN: usize = 5;

/// Script evaluated in the page context. Walks known video-title selectors
/// first (most specific to least), then meta tags, then `document.title`;
/// also reads `og:image`, `twitter:image` and the first `<video>` poster.
pub const METADATA_SCRIPT: &str = r#"() => {
    const getMeta = (name) => {
        const el = document.querySelector(
            `meta[property="${name}"], meta[name="${name}"],
             meta[property="og:${name}"], meta[name="twitter:${name}"]`
        );
        return el ? el.getAttribute('content') : null;
    };
    const titleSelectors = [
        'h1.video-title', 'h1.LiveVideo__Title', 'h1.video-info__title',
        '.VideoInfo__Title', '.video-title-container h1', '.headline', 'h1'
    ];
    let foundTitle = null;
    for (const sel of titleSelectors) {
        const el = document.querySelector(sel);
        if (el && el.innerText.trim().length > 5) {
            foundTitle = el.innerText.trim();
            break;
        }
    }
    const metaTitle = getMeta('title') || getMeta('og:title') || getMeta('twitter:title');
    return {
        title: foundTitle || metaTitle || document.title,
        og_image: getMeta('og:image'),
        twitter_image: getMeta('twitter:image'),
        poster: document.querySelector('video')
            ? document.querySelector('video').getAttribute('poster')
            : null
    };
}"#;

// Trailing " | SiteName" boilerplate.
static PIPE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*.*$").unwrap());
// Trailing " - Known Outlet" boilerplate.
static OUTLET_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*-\s*(Fox News|ABC News|Globoplay|NBC News).*$").unwrap());

/// One evaluation result from [`METADATA_SCRIPT`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataSnapshot {
    pub title: Option<String>,
    pub og_image: Option<String>,
    pub twitter_image: Option<String>,
    pub poster: Option<String>,
}

/// Best title and thumbnail accumulated over the polling window.
#[derive(Debug, Clone)]
pub struct PageMetadata {
    title: String,
    thumbnail: Option<String>,
}

impl PageMetadata {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: TITLE_SENTINEL.to_string(),
            thumbnail: None,
        }
    }

    /// Current title (the sentinel until a real one is found).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// `true` once a non-placeholder title has been accepted.
    #[must_use]
    pub fn has_title(&self) -> bool {
        self.title != TITLE_SENTINEL
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    /// Seed a thumbnail before polling starts (e.g. one synthesized from a
    /// video id by a site plugin). Applied unconditionally.
    pub fn set_thumbnail(&mut self, url: String) {
        self.thumbnail = Some(url);
    }

    /// Fold one snapshot into the accumulated state.
    ///
    /// Titles shorter than the length guard are rejected (placeholder
    /// headings during page transitions). A new thumbnail only replaces the
    /// stored one if nothing is stored yet or the stored one is not from a
    /// trusted host. A generic `og:image` on a later poll must not clobber
    /// a high-confidence thumbnail set earlier.
    pub fn apply(&mut self, snapshot: &MetadataSnapshot, filters: &FilterConfig) {
        if let Some(title) = snapshot.title.as_deref() {
            if title.trim().len() > MIN_TITLE_LEN {
                self.title = clean_title(title);
            }
        }

        let keep_current = self
            .thumbnail
            .as_deref()
            .is_some_and(|t| filters.is_trusted_thumbnail(t));
        if !keep_current {
            if let Some(thumb) = snapshot
                .og_image
                .as_deref()
                .or(snapshot.twitter_image.as_deref())
                .or(snapshot.poster.as_deref())
            {
                self.thumbnail = Some(thumb.to_string());
            }
        }
    }
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip known site-suffix boilerplate from a title.
#[must_use]
pub fn clean_title(title: &str) -> String {
    let title = PIPE_SUFFIX.replace(title, "");
    let title = OUTLET_SUFFIX.replace(&title, "");
    title.trim().to_string()
}

/// Evaluate the metadata script against a live page.
pub async fn collect(page: &dyn Page) -> Result<MetadataSnapshot> {
    let value = page.evaluate(METADATA_SCRIPT).await?;
    let snapshot = serde_json::from_value(value)?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(title: Option<&str>) -> MetadataSnapshot {
        MetadataSnapshot {
            title: title.map(String::from),
            ..MetadataSnapshot::default()
        }
    }

    #[test]
    fn clean_title_strips_pipe_suffix() {
        assert_eq!(clean_title("Jornal Nacional | Globoplay"), "Jornal Nacional");
    }

    #[test]
    fn clean_title_strips_outlet_suffix() {
        assert_eq!(clean_title("Breaking Story - Fox News Live"), "Breaking Story");
        assert_eq!(clean_title("Evening Report - abc news"), "Evening Report");
    }

    #[test]
    fn clean_title_leaves_plain_titles_alone() {
        assert_eq!(clean_title("Evening News Live"), "Evening News Live");
    }

    #[test]
    fn short_titles_are_rejected() {
        let mut meta = PageMetadata::new();
        meta.apply(&snapshot(Some("abc")), &FilterConfig::default());
        assert_eq!(meta.title(), TITLE_SENTINEL);
        assert!(!meta.has_title());
    }

    #[test]
    fn long_title_accepted_and_cleaned() {
        let mut meta = PageMetadata::new();
        meta.apply(
            &snapshot(Some("Jornal Nacional | Globoplay")),
            &FilterConfig::default(),
        );
        assert_eq!(meta.title(), "Jornal Nacional");
        assert!(meta.has_title());
    }

    #[test]
    fn thumbnail_priority_og_then_twitter_then_poster() {
        let filters = FilterConfig::default();
        let mut meta = PageMetadata::new();
        meta.apply(
            &MetadataSnapshot {
                twitter_image: Some("https://img.example.com/tw.jpg".into()),
                poster: Some("https://img.example.com/poster.jpg".into()),
                ..MetadataSnapshot::default()
            },
            &filters,
        );
        assert_eq!(meta.thumbnail(), Some("https://img.example.com/tw.jpg"));

        let mut meta = PageMetadata::new();
        meta.apply(
            &MetadataSnapshot {
                og_image: Some("https://img.example.com/og.jpg".into()),
                twitter_image: Some("https://img.example.com/tw.jpg".into()),
                ..MetadataSnapshot::default()
            },
            &filters,
        );
        assert_eq!(meta.thumbnail(), Some("https://img.example.com/og.jpg"));
    }

    #[test]
    fn trusted_thumbnail_is_never_clobbered() {
        let filters = FilterConfig::default();
        let mut meta = PageMetadata::new();
        meta.set_thumbnail("https://s04.video.glbimg.com/x720/7832875.jpg".into());
        meta.apply(
            &MetadataSnapshot {
                og_image: Some("https://img.example.com/generic-og.jpg".into()),
                ..MetadataSnapshot::default()
            },
            &filters,
        );
        assert_eq!(
            meta.thumbnail(),
            Some("https://s04.video.glbimg.com/x720/7832875.jpg")
        );
    }

    #[test]
    fn untrusted_thumbnail_is_replaced_by_later_candidate() {
        let filters = FilterConfig::default();
        let mut meta = PageMetadata::new();
        meta.apply(
            &MetadataSnapshot {
                poster: Some("https://img.example.com/poster.jpg".into()),
                ..MetadataSnapshot::default()
            },
            &filters,
        );
        meta.apply(
            &MetadataSnapshot {
                og_image: Some("https://img.example.com/better-og.jpg".into()),
                ..MetadataSnapshot::default()
            },
            &filters,
        );
        assert_eq!(meta.thumbnail(), Some("https://img.example.com/better-og.jpg"));
    }

    #[test]
    fn snapshot_deserializes_from_evaluate_value() {
        let value = serde_json::json!({
            "title": "Live Coverage of the Launch",
            "og_image": "https://img.example.com/og.jpg",
            "twitter_image": null,
            "poster": null
        });
        let snap: MetadataSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(snap.title.as_deref(), Some("Live Coverage of the Launch"));
        assert_eq!(snap.og_image.as_deref(), Some("https://img.example.com/og.jpg"));
    }
}
