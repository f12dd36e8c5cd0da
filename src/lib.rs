//! `streamsift` - Find HLS/DASH manifest URLs on streaming pages
//!
//! Watches the network traffic of a browser-driven page visit, classifies
//! every outbound request URL in real time, and keeps an ordered,
//! deduplicated, priority-ranked list of genuine media manifests while
//! discarding tracking and ad noise. Page title and thumbnail are collected
//! alongside via in-page script evaluation.
//!
//! The browser driver itself is an external collaborator: it implements the
//! [`Page`] trait and pushes request URLs into the channel from
//! [`page::request_channel`]. Everything else lives here:
//! classification, capture, metadata policy, the polling/stop state
//! machine, and site plugins.
//!
//! # Example
//!
//! ```rust,no_run
//! use streamsift::{Extractor, page::request_channel};
//!
//! # async fn example(page: impl streamsift::Page) -> anyhow::Result<()> {
//! let (sink, feed) = request_channel();
//! // ... hand `sink` to the driver's request-event hook ...
//! let extractor = Extractor::new();
//! let result = extractor.extract(&page, feed, "https://globoplay.globo.com/v/7832875/").await?;
//! println!("{}: {:?}", result.title, result.best_url);
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod classify;
pub mod extract;
pub mod metadata;
pub mod page;
pub mod playlist;
pub mod plugins;
pub mod youtube;

pub use capture::{CapturedStream, NetworkCapture};
pub use classify::{detect_format, normalize_url, FilterConfig, StreamFormat};
pub use extract::{ExtractError, ExtractOptions, Extraction, Extractor};
pub use metadata::{MetadataSnapshot, PageMetadata, TITLE_SENTINEL};
pub use page::{request_channel, Page, RequestFeed, RequestSink};
pub use playlist::{write_m3u, M3uEntry};
pub use plugins::{GenericPlugin, GloboplayPlugin, PluginRegistry, SitePlugin};
pub use youtube::YtDlpResolver;

/// Version of streamsift
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
