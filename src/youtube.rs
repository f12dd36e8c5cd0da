//! yt-dlp fast path for YouTube URLs.
//!
//! YouTube pages are hostile to generic network capture (consent walls,
//! player obfuscation), while yt-dlp resolves their manifests reliably
//! without a browser. The orchestrator asks this resolver first for any
//! YouTube URL and only falls back to a full page session when the tool
//! is missing or fails.

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;

/// Video id in a watch or short-link URL, e.g. `watch?v=dQw4w9WgXcQ`.
static VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|youtu\.be/)([A-Za-z0-9_-]{6,})").unwrap());

/// `true` if the URL belongs to YouTube.
#[must_use]
pub fn is_youtube_url(url: &str) -> bool {
    let url = url.to_lowercase();
    url.contains("youtube.com") || url.contains("youtu.be")
}

/// Deterministic thumbnail for a YouTube URL. Live URLs without a video id
/// get the `live` placeholder frame.
#[must_use]
pub fn thumbnail_url(url: &str) -> String {
    let id = VIDEO_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map_or("live", |m| m.as_str());
    format!("https://img.youtube.com/vi/{id}/maxresdefault.jpg")
}

/// Manifest resolver backed by the yt-dlp binary.
pub struct YtDlpResolver {
    /// Path to the yt-dlp binary.
    ytdlp_path: String,
}

impl YtDlpResolver {
    /// Create a resolver, searching for the binary in PATH.
    #[must_use]
    pub fn new() -> Self {
        let ytdlp_path = which::which("yt-dlp")
            .map_or_else(|_| "yt-dlp".to_string(), |p| p.to_string_lossy().to_string());
        Self { ytdlp_path }
    }

    /// Specify a custom yt-dlp binary path.
    #[must_use]
    pub fn with_ytdlp_path(mut self, path: &str) -> Self {
        self.ytdlp_path = path.to_string();
        self
    }

    /// Resolve the stream manifest URL via `yt-dlp -g -f best`.
    ///
    /// `None` when the tool is missing, exits non-zero, or prints something
    /// that does not look like a manifest URL.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        let output = Command::new(&self.ytdlp_path)
            .args(["-g", "-f", "best", url])
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            tracing::debug!(url, "yt-dlp exited non-zero");
            return None;
        }
        let resolved = String::from_utf8_lossy(&output.stdout)
            .trim()
            .lines()
            .next()?
            .to_string();
        looks_like_manifest(&resolved).then_some(resolved)
    }

    /// Page title via `yt-dlp --get-title`, if available.
    pub async fn fetch_title(&self, url: &str) -> Option<String> {
        let output = Command::new(&self.ytdlp_path)
            .args(["--get-title", url])
            .output()
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!title.is_empty()).then_some(title)
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// yt-dlp may resolve to a progressive download; only manifest-looking
/// URLs are worth returning to a capture pipeline.
fn looks_like_manifest(url: &str) -> bool {
    let url = url.to_lowercase();
    url.contains(".m3u8") || url.contains("manifest")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_youtube_hosts() {
        assert!(is_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_youtube_url("HTTPS://WWW.YOUTUBE.COM/live"));
        assert!(!is_youtube_url("https://globoplay.globo.com/v/7832875/"));
    }

    #[test]
    fn thumbnail_from_watch_and_short_urls() {
        assert_eq!(
            thumbnail_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
        assert_eq!(
            thumbnail_url("https://youtu.be/dQw4w9WgXcQ"),
            "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"
        );
    }

    #[test]
    fn thumbnail_falls_back_for_channel_live_urls() {
        assert_eq!(
            thumbnail_url("https://www.youtube.com/@somechannel/live"),
            "https://img.youtube.com/vi/live/maxresdefault.jpg"
        );
    }

    #[test]
    fn manifest_detection() {
        assert!(looks_like_manifest("https://m.googlevideo.com/api/manifest/hls_variant/x"));
        assert!(looks_like_manifest("https://cdn.example.com/live/index.M3U8"));
        assert!(!looks_like_manifest("https://r4.googlevideo.com/videoplayback?itag=22"));
    }

    #[tokio::test]
    async fn resolve_returns_none_without_the_tool() {
        let resolver = YtDlpResolver::new().with_ytdlp_path("/nonexistent/yt-dlp");
        assert!(resolver.resolve("https://www.youtube.com/watch?v=abc123xyz").await.is_none());
        assert!(resolver.fetch_title("https://www.youtube.com/watch?v=abc123xyz").await.is_none());
    }

    #[tokio::test]
    async fn resolve_keeps_only_manifest_looking_output() {
        // `echo` stands in for the tool and parrots its arguments, so the
        // URL itself controls what "yt-dlp" prints.
        let resolver = YtDlpResolver::new().with_ytdlp_path("/bin/echo");
        let resolved = resolver.resolve("https://cdn.example.com/live/manifest.m3u8").await;
        assert!(resolved.is_some_and(|u| u.contains("manifest.m3u8")));

        let resolver = YtDlpResolver::new().with_ytdlp_path("/bin/echo");
        assert!(resolver.resolve("https://example.com/page").await.is_none());
    }
}
