//! Generic interaction strategy for unknown sites.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::page::Page;
use crate::plugins::SitePlugin;

/// Play-control selectors tried in order of specificity.
const PLAY_SELECTORS: &[&str] = &[
    "button.poster__play-wrapper",
    "button[aria-label='Play']",
    ".vjs-big-play-button",
    ".play-button",
    "video",
    "#player",
    ".jw-display-icon-container",
    ".play-icon",
];

const SELECTOR_WAIT: Duration = Duration::from_secs(5);
const IDLE_WAIT: Duration = Duration::from_secs(10);

/// Fallback plugin: find something that looks like a play control, click
/// it, then give the network a bounded chance to settle.
pub struct GenericPlugin;

#[async_trait]
impl SitePlugin for GenericPlugin {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn matches(&self, _url: &str) -> bool {
        true
    }

    async fn interact(&self, page: &dyn Page) -> Result<()> {
        for selector in PLAY_SELECTORS {
            if page.wait_for_selector(selector, SELECTOR_WAIT).await.is_err() {
                continue;
            }
            if page.click(selector).await.is_ok() {
                let _ = page.wait_for_network_idle(SELECTOR_WAIT).await;
                break;
            }
        }

        // Ad-heavy pages often never go idle; that is fine, the polling
        // loop picks up whatever the player requests.
        if let Err(e) = page.wait_for_network_idle(IDLE_WAIT).await {
            tracing::debug!("network did not settle after interaction: {e}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_everything() {
        let plugin = GenericPlugin;
        assert!(plugin.matches("https://example.com/live"));
        assert!(plugin.matches("https://globoplay.globo.com/v/1/"));
    }

    #[test]
    fn no_initial_thumbnail() {
        let plugin = GenericPlugin;
        assert!(plugin.initial_thumbnail("https://example.com/live").is_none());
    }
}
