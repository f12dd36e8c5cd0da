//! Network capture engine.
//!
//! Ingests raw request URLs one at a time as the page issues them, applies
//! the classifier, and maintains an ordered, deduplicated, priority-ranked
//! list of accepted streams. One engine instance serves exactly one page
//! visit at a time; call [`NetworkCapture::reset`] before reusing it or
//! streams from the previous visit leak into the next result.

use std::collections::HashSet;

use crate::classify::{detect_format, normalize_url, FilterConfig, StreamFormat};

/// A single accepted stream URL. Immutable once created.
#[derive(Debug, Clone)]
pub struct CapturedStream {
    /// Normalized URL (query and fragment stripped). Used for dedup and display.
    pub url: String,
    /// The URL exactly as first observed on the wire.
    pub raw_url: String,
    /// Manifest format derived from the URL pattern.
    pub format: StreamFormat,
    /// Whether the URL matched a main-playlist keyword.
    pub is_priority: bool,
}

/// Accumulator for media URLs observed during one page visit.
///
/// Priority streams are inserted at the head of the list, non-priority
/// streams appended at the tail. Because every priority insertion goes to
/// index 0, the most recently seen priority stream ends up first: a
/// recency bias, not a stable sort. Consumers that want a single URL
/// should use [`NetworkCapture::best_url`].
#[derive(Debug)]
pub struct NetworkCapture {
    filters: FilterConfig,
    streams: Vec<CapturedStream>,
    seen: HashSet<String>,
}

impl NetworkCapture {
    /// Create an engine with the given filter tables.
    #[must_use]
    pub fn new(filters: FilterConfig) -> Self {
        Self {
            filters,
            streams: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Drop all captured streams and the seen-set. Must be called between
    /// independent page visits on the same engine instance.
    pub fn reset(&mut self) {
        self.streams.clear();
        self.seen.clear();
    }

    /// Process one intercepted request URL, in arrival order.
    ///
    /// Short and synchronous: no I/O, no suspension. Safe to call from a
    /// request-event callback.
    pub fn process_url(&mut self, raw_url: &str) {
        // A tracker may carry the real stream in a query parameter; the
        // outer URL would be blacklisted, so check the inner one instead.
        let candidate = self
            .filters
            .extract_embedded(raw_url)
            .unwrap_or_else(|| raw_url.to_string());

        if !self.filters.is_media_url(&candidate) {
            return;
        }
        if self.filters.is_blacklisted(&candidate) {
            tracing::debug!(url = %candidate, "rejected by blacklist");
            return;
        }

        let final_url = normalize_url(&candidate);
        if self.seen.contains(&final_url) {
            return;
        }
        self.seen.insert(final_url.clone());

        let stream = CapturedStream {
            format: detect_format(&final_url),
            is_priority: self.filters.is_priority(&final_url),
            url: final_url,
            raw_url: raw_url.to_string(),
        };
        tracing::debug!(url = %stream.url, format = stream.format.as_str(), priority = stream.is_priority, "captured stream");

        if stream.is_priority {
            self.streams.insert(0, stream);
        } else {
            self.streams.push(stream);
        }
    }

    /// Snapshot of the captured streams in current list order.
    #[must_use]
    pub fn streams(&self) -> &[CapturedStream] {
        &self.streams
    }

    /// Normalized URLs in current list order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.streams.iter().map(|s| s.url.clone()).collect()
    }

    /// Best single URL by the selection policy:
    /// 1. first stream containing `playlist.m3u8`, the strongest signal
    ///    regardless of position;
    /// 2. else first priority stream;
    /// 3. else first stream in list order;
    /// 4. `None` if nothing was captured.
    #[must_use]
    pub fn best_url(&self) -> Option<&str> {
        if let Some(s) = self
            .streams
            .iter()
            .find(|s| s.url.to_lowercase().contains("playlist.m3u8"))
        {
            return Some(&s.url);
        }
        if let Some(s) = self.streams.iter().find(|s| s.is_priority) {
            return Some(&s.url);
        }
        self.streams.first().map(|s| s.url.as_str())
    }

    /// `true` if at least one stream was captured.
    #[must_use]
    pub fn has_streams(&self) -> bool {
        !self.streams.is_empty()
    }

    /// `true` if at least one priority stream was captured. Used by the
    /// orchestrator as an early-stop signal.
    #[must_use]
    pub fn has_priority_stream(&self) -> bool {
        self.streams.iter().any(|s| s.is_priority)
    }

    /// Number of captured streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// `true` if no stream was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl Default for NetworkCapture {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
