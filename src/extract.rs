//! Extraction orchestrator.
//!
//! Drives one page visit end to end: validate the target URL, navigate,
//! run the selected site plugin once, then poll the capture engine and the
//! metadata collector until a priority stream plus a real title have
//! settled, or the iteration ceiling is hit. Errors after the first
//! captured stream are demoted to warnings; stream availability beats
//! exception propagation.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::capture::NetworkCapture;
use crate::classify::FilterConfig;
use crate::metadata::{self, PageMetadata};
use crate::page::{Page, RequestFeed};
use crate::plugins::PluginRegistry;
use crate::youtube::{self, YtDlpResolver};

/// Errors surfaced by a single extraction. Per-URL: a failure here must not
/// abort a batch of extractions.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The target URL was malformed or pointed at a local/private host.
    /// Rejected before any browser interaction.
    #[error("invalid or unsafe target URL: {0}")]
    InvalidUrl(String),

    /// The page failed (navigation error, driver gone) before any stream
    /// was captured. With partial results the error is suppressed instead.
    #[error("page failed with no streams captured")]
    PageFailed(#[source] anyhow::Error),
}

/// Timing knobs for one extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Budget for the initial page load.
    pub navigation_timeout: Duration,
    /// Pause between poll iterations.
    pub poll_interval: Duration,
    /// Hard ceiling on poll iterations. Reaching it is not a failure.
    pub max_polls: u32,
    /// Iterations that must elapse before the stop condition may fire.
    /// Many sites fire an early ad manifest that matches a priority
    /// keyword; the floor stops us declaring success on the first tick.
    pub settle_polls: u32,
    /// Try resolving YouTube URLs with yt-dlp before opening a page.
    pub use_ytdlp: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            max_polls: 45,
            settle_polls: 5,
            use_ytdlp: true,
        }
    }
}

/// Result of one extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The page URL the extraction ran against.
    pub source_url: String,
    /// Cleaned page title, or the `"Stream"` placeholder.
    pub title: String,
    /// All captured manifest URLs, priority-ranked.
    pub stream_urls: Vec<String>,
    /// Single best URL by the capture engine's selection policy.
    pub best_url: Option<String>,
    /// Representative thumbnail, if one was found.
    pub thumbnail: Option<String>,
}

/// Orchestrates capture, interaction and metadata collection for one page
/// visit at a time. The instance itself is reusable across visits; each
/// call to [`Extractor::extract`] starts from fresh session state.
pub struct Extractor {
    filters: FilterConfig,
    plugins: PluginRegistry,
    ytdlp: YtDlpResolver,
    options: ExtractOptions,
}

impl Extractor {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(FilterConfig::default(), ExtractOptions::default())
    }

    #[must_use]
    pub fn with_options(filters: FilterConfig, options: ExtractOptions) -> Self {
        Self {
            filters,
            plugins: PluginRegistry::new(),
            ytdlp: YtDlpResolver::new(),
            options,
        }
    }

    /// Replace the plugin registry (e.g. to add site plugins at startup).
    #[must_use]
    pub fn with_plugins(mut self, plugins: PluginRegistry) -> Self {
        self.plugins = plugins;
        self
    }

    /// Replace the yt-dlp resolver (e.g. to point at a custom binary).
    #[must_use]
    pub fn with_ytdlp(mut self, ytdlp: YtDlpResolver) -> Self {
        self.ytdlp = ytdlp;
        self
    }

    /// Extract stream URLs and metadata from one streaming page.
    ///
    /// `requests` is the driver's feed of outbound request URLs for this
    /// page; it is drained in arrival order on every poll tick.
    pub async fn extract(
        &self,
        page: &dyn Page,
        mut requests: RequestFeed,
        url: &str,
    ) -> Result<Extraction, ExtractError> {
        validate_url(url)?;

        if self.options.use_ytdlp && youtube::is_youtube_url(url) {
            if let Some(result) = self.try_ytdlp(url).await {
                return Ok(result);
            }
            tracing::debug!(url, "yt-dlp unavailable or failed, using a page session");
        }

        let mut capture = NetworkCapture::new(self.filters.clone());
        let mut meta = PageMetadata::new();

        let plugin = self.plugins.select(url);
        if let Some(thumb) = plugin.initial_thumbnail(url) {
            meta.set_thumbnail(thumb);
        }

        let outcome = self
            .run_session(page, &mut requests, url, plugin, &mut capture, &mut meta)
            .await;

        // Drain anything that raced the end of the loop.
        while let Ok(raw) = requests.try_recv() {
            capture.process_url(&raw);
        }

        if let Err(e) = outcome {
            if capture.has_streams() {
                tracing::warn!(url, "page error after capture, keeping partial results: {e:#}");
            } else {
                return Err(ExtractError::PageFailed(e));
            }
        }

        Ok(Extraction {
            source_url: url.to_string(),
            title: meta.title().to_string(),
            best_url: capture.best_url().map(String::from),
            stream_urls: capture.urls(),
            thumbnail: meta.thumbnail().map(String::from),
        })
    }

    /// Resolve a YouTube URL without a page session. The title falls back
    /// to a fixed label when yt-dlp cannot provide one; the thumbnail comes
    /// from the video id.
    async fn try_ytdlp(&self, url: &str) -> Option<Extraction> {
        let manifest = self.ytdlp.resolve(url).await?;
        let title = self
            .ytdlp
            .fetch_title(url)
            .await
            .unwrap_or_else(|| "YouTube Live".to_string());
        tracing::info!(url, "resolved via yt-dlp, skipping the page session");
        Some(Extraction {
            source_url: url.to_string(),
            title,
            best_url: Some(manifest.clone()),
            stream_urls: vec![manifest],
            thumbnail: Some(youtube::thumbnail_url(url)),
        })
    }

    async fn run_session(
        &self,
        page: &dyn Page,
        requests: &mut RequestFeed,
        url: &str,
        plugin: &dyn crate::plugins::SitePlugin,
        capture: &mut NetworkCapture,
        meta: &mut PageMetadata,
    ) -> anyhow::Result<()> {
        page.goto(url, self.options.navigation_timeout).await?;

        // Plugin failures never abort the extraction.
        if let Err(e) = plugin.interact(page).await {
            tracing::warn!(plugin = plugin.name(), "interaction failed: {e:#}");
        }

        for i in 0..self.options.max_polls {
            while let Ok(raw) = requests.try_recv() {
                capture.process_url(&raw);
            }

            // Transient evaluate failures (page navigating, DOM detached)
            // just skip this tick.
            match metadata::collect(page).await {
                Ok(snapshot) => meta.apply(&snapshot, &self.filters),
                Err(e) => tracing::debug!(poll = i, "metadata collection skipped: {e}"),
            }

            if capture.has_priority_stream() && meta.has_title() && i > self.options.settle_polls {
                tracing::debug!(poll = i, streams = capture.len(), "stop condition met");
                break;
            }

            tokio::time::sleep(self.options.poll_interval).await;
        }

        Ok(())
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject malformed targets and local/private hosts before any browser
/// interaction.
pub fn validate_url(url: &str) -> Result<(), ExtractError> {
    let parsed = Url::parse(url).map_err(|_| ExtractError::InvalidUrl(url.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidUrl(url.to_string()));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ExtractError::InvalidUrl(url.to_string()))?
        .to_lowercase();

    const PRIVATE_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "192.168.", "10.", "172.16."];
    if PRIVATE_HOSTS.iter().any(|p| host.starts_with(p)) {
        return Err(ExtractError::InvalidUrl(url.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_public_http_urls() {
        assert!(validate_url("https://globoplay.globo.com/v/7832875/").is_ok());
        assert!(validate_url("http://example.com/live").is_ok());
    }

    #[test]
    fn validate_rejects_bad_schemes() {
        assert!(validate_url("ftp://example.com/stream").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn validate_rejects_private_hosts() {
        assert!(validate_url("http://localhost:8080/stream").is_err());
        assert!(validate_url("http://127.0.0.1/x").is_err());
        assert!(validate_url("http://192.168.1.10/x").is_err());
        assert!(validate_url("http://10.0.0.1/x").is_err());
    }

    #[test]
    fn default_options_match_operational_constants() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.max_polls, 45);
        assert_eq!(opts.settle_polls, 5);
        assert_eq!(opts.poll_interval, Duration::from_secs(1));
        assert!(opts.use_ytdlp);
    }
}
