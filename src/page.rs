//! Contract with the browser-automation driver.
//!
//! The core never launches or navigates a browser itself. It needs two
//! things from the driver: a [`Page`] capability for in-page evaluation and
//! interaction, and a feed of outbound request URLs in issuance order,
//! delivered through the channel created by [`request_channel`].

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Driver-side sender: push one full request URL per outbound request, in
/// the order the page issues them.
pub type RequestSink = mpsc::UnboundedSender<String>;

/// Core-side receiver of the request URL feed.
pub type RequestFeed = mpsc::UnboundedReceiver<String>;

/// Create the request feed channel shared between driver and extractor.
#[must_use]
pub fn request_channel() -> (RequestSink, RequestFeed) {
    mpsc::unbounded_channel()
}

/// A live browser page, as seen by the core.
///
/// Implementations wrap whatever automation backend is in use. All
/// interaction methods are best-effort from the core's point of view:
/// the extractor and plugins swallow their failures.
#[async_trait]
pub trait Page: Send + Sync {
    /// URL the page is currently on (or navigating to).
    fn url(&self) -> &str;

    /// Navigate to `url`, waiting at most `timeout` for the initial load.
    async fn goto(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Run a script in the page context and return its JSON result.
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Click the first element matching the selector.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Wait until an element matching the selector is visible.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Wait until the page has gone quiet on the network.
    ///
    /// May fail on ad-heavy pages that never settle; callers treat that as
    /// non-fatal.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()>;
}
