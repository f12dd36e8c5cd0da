//! URL classification for captured network traffic.
//!
//! Pure functions that decide whether a request URL is a media manifest,
//! whether it is tracking/ad noise, and how to canonicalize it for
//! deduplication. Keyword lists live in [`FilterConfig`] rather than in
//! module-level statics so tests and deployments can swap them out; the
//! built-in lists can be extended from `~/.config/streamsift/filters.toml`
//! without touching engine logic.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

/// Substrings that mark a URL as a media manifest.
const MEDIA_MARKERS: &[&str] = &[".m3u8", ".mpd"];

/// Keywords associated with tracking, analytics and advertising.
/// A single match anywhere in the URL rejects it.
const BLACKLIST_KEYWORDS: &[&str] = &[
    // Analytics and tracking
    "youbora",
    "youboranqs",
    "chartbeat",
    "analytics",
    "telemetry",
    "metrics",
    "heartbeat",
    "omtrdc",
    "hotjar",
    "scorecardresearch",
    "segment.io",
    "mixpanel",
    "amplitude",
    "newrelic",
    "datadog",
    "sentry.io",
    "bugsnag",
    "loggly",
    "splunk",
    // Advertising
    "doubleclick",
    "googleads",
    "amazon-adsystem",
    "casalemedia",
    "adnxs",
    "advertising",
    "moatads",
    "krxd",
    "fwmrm.net",
    "ads.yahoo",
    "adform",
    "pubmatic",
    "openx",
    "rubiconproject",
    "spotxchange",
    "springserve",
    "yieldmo",
    "sharethrough",
    // Social tracking pixels
    "facebook.com/tr",
    "connect.facebook",
    "twitter.com/i/adsct",
    // Globo endpoints that are not streams
    "horizon.globo.com",
    // Logging and diagnostics
    "log.",
    "/log/",
    "logging",
    "beacon",
    "ping",
];

/// Keywords that suggest a URL is the main playlist rather than an ad
/// manifest or a sub-segment.
const PRIORITY_KEYWORDS: &[&str] = &[
    "master",
    "index",
    "playlist",
    "chunklist",
    "manifest",
    "live",
    "stream",
    "hls",
    "dash",
];

/// Query parameters that trackers use to carry the real resource URL.
const REDIRECT_PARAMS: &[&str] = &["ep.URL", "url", "link", "target", "redir", "redirect", "src"];

/// Image hosts whose thumbnails are never overwritten by later,
/// lower-confidence candidates.
const TRUSTED_THUMBNAIL_HOSTS: &[&str] = &["glbimg.com"];

/// Detected manifest format of a captured URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// HTTP Live Streaming (`.m3u8`).
    Hls,
    /// MPEG-DASH (`.mpd`).
    Dash,
    /// Matched a media marker but format could not be determined.
    Unknown,
}

impl StreamFormat {
    /// Short lowercase name, matching the keyword it was detected from.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamFormat::Hls => "hls",
            StreamFormat::Dash => "dash",
            StreamFormat::Unknown => "unknown",
        }
    }
}

/// Keyword tables driving classification.
///
/// [`FilterConfig::default`] carries the built-in lists; any of them can be
/// replaced from a TOML file via [`FilterConfig::load`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Substrings marking a URL as a media manifest.
    pub media_markers: Vec<String>,
    /// Tracking/analytics/ad keywords; one match rejects the URL.
    pub blacklist: Vec<String>,
    /// Keywords marking a likely main playlist.
    pub priority_keywords: Vec<String>,
    /// Query parameter names that may embed the real stream URL.
    pub redirect_params: Vec<String>,
    /// Thumbnail hosts that later candidates may not overwrite.
    pub trusted_thumbnail_hosts: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        Self {
            media_markers: owned(MEDIA_MARKERS),
            blacklist: owned(BLACKLIST_KEYWORDS),
            priority_keywords: owned(PRIORITY_KEYWORDS),
            redirect_params: owned(REDIRECT_PARAMS),
            trusted_thumbnail_hosts: owned(TRUSTED_THUMBNAIL_HOSTS),
        }
    }
}

impl FilterConfig {
    /// Load filter overrides from a TOML file. Keys not present in the file
    /// keep their built-in values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    /// Load from `~/.config/streamsift/filters.toml` if it exists, otherwise
    /// return the built-in lists. A missing file is not an error.
    pub fn load_default() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns `true` if the URL contains a known media file marker.
    #[must_use]
    pub fn is_media_url(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.media_markers.iter().any(|m| url.contains(m.as_str()))
    }

    /// Returns `true` if the URL matches any blacklist keyword.
    #[must_use]
    pub fn is_blacklisted(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.blacklist.iter().any(|kw| url.contains(kw.as_str()))
    }

    /// Returns `true` if the URL looks like a main playlist.
    #[must_use]
    pub fn is_priority(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.priority_keywords.iter().any(|kw| url.contains(kw.as_str()))
    }

    /// Returns `true` if `host_or_url` belongs to a trusted thumbnail host.
    #[must_use]
    pub fn is_trusted_thumbnail(&self, host_or_url: &str) -> bool {
        self.trusted_thumbnail_hosts
            .iter()
            .any(|h| host_or_url.contains(h.as_str()))
    }

    /// If one of the redirect-carrying query parameters holds a value that
    /// is itself a media URL, return that inner URL.
    ///
    /// Trackers routinely proxy the real manifest through an analytics
    /// beacon; the outer URL is blacklisted, so the inner one must be
    /// recovered here or the stream is lost.
    #[must_use]
    pub fn extract_embedded(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        for param in &self.redirect_params {
            if let Some((_, value)) = parsed.query_pairs().find(|(k, _)| k == param.as_str()) {
                if self.is_media_url(&value) {
                    return Some(value.into_owned());
                }
            }
        }
        None
    }
}

/// Detect the manifest format from the URL pattern.
///
/// `.m3u8` takes precedence when both could match (a DASH-named path serving
/// an HLS playlist is still HLS).
#[must_use]
pub fn detect_format(url: &str) -> StreamFormat {
    let url = url.to_lowercase();
    if url.contains(".m3u8") {
        StreamFormat::Hls
    } else if url.contains(".mpd") || url.contains("dash") {
        StreamFormat::Dash
    } else {
        StreamFormat::Unknown
    }
}

/// Canonicalize a stream URL for deduplication: scheme + host + path only.
///
/// CDNs rotate tokens and timestamps in the query string, so the same
/// logical stream would otherwise be captured over and over as "new".
/// Unparsable input is returned unchanged. Idempotent.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// Path to the user filter config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("streamsift")
        .join("filters.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_matches_manifest_extensions() {
        let filters = FilterConfig::default();
        assert!(filters.is_media_url("https://cdn.example.com/stream.m3u8"));
        assert!(filters.is_media_url("https://cdn.example.com/manifest.mpd"));
        assert!(filters.is_media_url("https://cdn.example.com/STREAM.M3U8"));
        assert!(!filters.is_media_url("https://cdn.example.com/image.jpg"));
        assert!(!filters.is_media_url("https://cdn.example.com/page.html"));
    }

    #[test]
    fn media_marker_matches_query_string_too() {
        // Substring match is on the full URL, not just the path
        let filters = FilterConfig::default();
        assert!(filters.is_media_url("https://t.example.com/r?url=x.m3u8"));
    }

    #[test]
    fn blacklist_rejects_analytics_and_ads() {
        let filters = FilterConfig::default();
        assert!(filters.is_blacklisted("https://youbora.nicepeopleatwork.com/track.m3u8"));
        assert!(filters.is_blacklisted("https://analytics.example.com/stream.m3u8"));
        assert!(filters.is_blacklisted("https://doubleclick.net/ad.m3u8"));
        assert!(!filters.is_blacklisted("https://video.globo.com/stream/playlist.m3u8"));
        assert!(!filters.is_blacklisted("https://cdn.example.com/live-a/master.m3u8"));
    }

    #[test]
    fn priority_keywords_match_case_insensitively() {
        let filters = FilterConfig::default();
        assert!(filters.is_priority("https://cdn.example.com/master.m3u8"));
        assert!(filters.is_priority("https://cdn.example.com/INDEX.m3u8"));
        assert!(filters.is_priority("https://cdn.example.com/chunklist_b500000.m3u8"));
        assert!(!filters.is_priority("https://cdn.example.com/seg001.ts"));
    }

    #[test]
    fn detect_format_variants() {
        assert_eq!(detect_format("https://c.example.com/a.m3u8"), StreamFormat::Hls);
        assert_eq!(detect_format("https://c.example.com/a.mpd"), StreamFormat::Dash);
        assert_eq!(detect_format("https://c.example.com/dash/init"), StreamFormat::Dash);
        assert_eq!(detect_format("https://c.example.com/video.mp4"), StreamFormat::Unknown);
    }

    #[test]
    fn detect_format_m3u8_wins_over_dash_token() {
        assert_eq!(
            detect_format("https://c.example.com/dash/stream.m3u8"),
            StreamFormat::Hls
        );
    }

    #[test]
    fn normalize_strips_query_and_fragment() {
        let url = "https://video.globo.com/stream/playlist.m3u8?token=abc123&ts=1234#t=5";
        assert_eq!(
            normalize_url(url),
            "https://video.globo.com/stream/playlist.m3u8"
        );
    }

    #[test]
    fn normalize_keeps_plain_path() {
        let url = "https://cdn.example.com/live/master.m3u8";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn normalize_is_idempotent() {
        let urls = [
            "https://cdn.example.com/live/master.m3u8?token=1",
            "https://cdn.example.com/a/b.mpd#frag",
            "not a url at all",
        ];
        for url in urls {
            let once = normalize_url(url);
            assert_eq!(normalize_url(&once), once);
        }
    }

    #[test]
    fn normalize_passes_through_garbage() {
        assert_eq!(normalize_url("::not-a-url::"), "::not-a-url::");
    }

    #[test]
    fn extract_embedded_recovers_proxied_stream() {
        let filters = FilterConfig::default();
        let url =
            "https://analytics.example.com/track?ep.URL=https%3A%2F%2Fcdn.example.com%2Fstream.m3u8";
        assert_eq!(
            filters.extract_embedded(url).as_deref(),
            Some("https://cdn.example.com/stream.m3u8")
        );
    }

    #[test]
    fn extract_embedded_ignores_non_media_values() {
        let filters = FilterConfig::default();
        let url = "https://analytics.example.com/track?url=https%3A%2F%2Fexample.com%2Fpage";
        assert!(filters.extract_embedded(url).is_none());
    }

    #[test]
    fn extract_embedded_none_for_direct_stream() {
        let filters = FilterConfig::default();
        assert!(filters
            .extract_embedded("https://cdn.example.com/stream.m3u8")
            .is_none());
    }

    #[test]
    fn config_overrides_only_given_keys() {
        let toml_str = r#"blacklist = ["mytracker"]"#;
        let filters: FilterConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(filters.blacklist, vec!["mytracker"]);
        // Untouched keys keep their defaults
        assert!(filters.priority_keywords.iter().any(|k| k == "master"));
        assert!(filters.media_markers.iter().any(|m| m == ".m3u8"));
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let filters: FilterConfig = toml::from_str("").unwrap();
        assert!(filters.is_media_url("https://x.example.com/a.m3u8"));
        assert!(filters.is_blacklisted("https://doubleclick.net/x.m3u8"));
    }

    #[test]
    fn trusted_thumbnail_hosts() {
        let filters = FilterConfig::default();
        assert!(filters.is_trusted_thumbnail("https://s04.video.glbimg.com/x720/123.jpg"));
        assert!(!filters.is_trusted_thumbnail("https://images.example.com/poster.jpg"));
    }
}
