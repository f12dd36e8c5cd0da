//! Globoplay (globoplay.globo.com) interaction plugin.
//!
//! Globoplay gates its player behind subscriber warnings and lazy-loads the
//! "Agora na TV" channel grid, so the generic click-play strategy is not
//! enough: modals have to be dismissed first and live channels are only
//! discoverable after scrolling the page to the bottom.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::page::Page;
use crate::plugins::SitePlugin;

/// Video id in a Globo watch URL, e.g. `/v/7832875/`.
static VIDEO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/v/(\d+)").unwrap());

static GLOBOPLAY_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Globoplay\.\s*").unwrap());
static BBB_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Canal BBB \d+\s*-\s*").unwrap());
static LIVE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i),?\s*Ao vivo.*$").unwrap());

const PLAY_SELECTORS: &[&str] = &[
    "button.poster__play-wrapper",
    "[data-testid='play-button']",
    "button[aria-label='Play']",
    "button[aria-label='Reproduzir']",
    ".vjs-big-play-button",
    ".play-button",
    ".jw-display-icon-container",
    ".play-icon",
    "video",
];

const SELECTOR_WAIT: Duration = Duration::from_secs(5);
const IDLE_WAIT: Duration = Duration::from_secs(10);

/// Clicks visible warning/paywall buttons whose label suggests they advance
/// the flow (fechar/close/entrar/assinante/continuar). Returns the number
/// of elements clicked.
const DISMISS_SCRIPT: &str = r#"() => {
    const selectors = [
        "button.warning-block__button",
        "button.paywall-button",
        "[data-testid='paywall-cta']",
        ".modal-close",
        "[aria-label='Fechar']",
        "button[class*='close']"
    ];
    const keywords = ["fechar", "close", "entrar", "assinante", "continuar"];
    let clicked = 0;
    for (const sel of selectors) {
        for (const el of document.querySelectorAll(sel)) {
            if (el.offsetParent === null) continue;
            const text = (el.innerText || "").trim().toLowerCase();
            if (keywords.some(kw => text.includes(kw))) {
                el.click();
                clicked += 1;
                break;
            }
        }
    }
    return clicked;
}"#;

/// Extracts name/url/thumbnail for each live channel card on the
/// "Agora na TV" page.
const CHANNELS_SCRIPT: &str = r#"() => {
    const idRegex = /(?:^|\/|v\/)([0-9]{6,8})(?:\/|$)/;
    const links = Array.from(
        document.querySelectorAll("a[href*='/ao-vivo/'], a[href*='/v/']")
    );
    const seenIds = new Set();
    const result = [];
    for (const link of links) {
        const href = link.href;
        if (href.includes('/assine/') || href.includes('/subscribe')) continue;
        const match = href.match(idRegex);
        if (!match) continue;
        const channelId = match[1];
        if (seenIds.has(channelId)) continue;
        seenIds.add(channelId);
        const nameEl = link.querySelector(
            '.video-card-title, .program-card__title, .headline__title, [class*="title"]'
        );
        let name = nameEl ? nameEl.textContent.trim() : link.getAttribute('aria-label');
        if (!name) name = channelId;
        const img = link.querySelector('img');
        result.push({
            name,
            url: `https://globoplay.globo.com/ao-vivo/${channelId}/`,
            thumbnail: img ? (img.src || img.dataset.src || null) : null,
            id: channelId
        });
    }
    return result;
}"#;

/// A live channel discovered on the "Agora na TV" grid.
#[derive(Debug, Clone, Deserialize)]
pub struct LiveChannel {
    pub name: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub id: String,
}

pub struct GloboplayPlugin;

impl GloboplayPlugin {
    async fn dismiss_warning_modals(&self, page: &dyn Page) -> Result<()> {
        let clicked = page.evaluate(DISMISS_SCRIPT).await?;
        if clicked.as_u64().unwrap_or(0) > 0 {
            tracing::debug!(clicked = %clicked, "dismissed warning modals");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        Ok(())
    }

    async fn click_play_button(&self, page: &dyn Page) {
        for selector in PLAY_SELECTORS {
            if page.wait_for_selector(selector, SELECTOR_WAIT).await.is_err() {
                continue;
            }
            if page.click(selector).await.is_ok() {
                tokio::time::sleep(Duration::from_secs(1)).await;
                return;
            }
        }
    }

    /// Scroll until the page height stops growing, so lazy-loaded channel
    /// cards are present before [`Self::discover_live_channels`] runs.
    pub async fn scroll_to_load_all(&self, page: &dyn Page, max_scrolls: u32) -> Result<()> {
        let mut last_height = page
            .evaluate("() => document.body.scrollHeight")
            .await?
            .as_u64()
            .unwrap_or(0);
        for _ in 0..max_scrolls {
            page.evaluate("() => window.scrollTo(0, document.body.scrollHeight)")
                .await?;
            tokio::time::sleep(Duration::from_secs(2)).await;
            let new_height = page
                .evaluate("() => document.body.scrollHeight")
                .await?
                .as_u64()
                .unwrap_or(0);
            if new_height == last_height {
                break;
            }
            last_height = new_height;
        }
        Ok(())
    }

    /// Discover live channels on the "Agora na TV" page.
    pub async fn discover_live_channels(&self, page: &dyn Page) -> Result<Vec<LiveChannel>> {
        self.scroll_to_load_all(page, 5).await?;
        let value = page.evaluate(CHANNELS_SCRIPT).await?;
        let mut channels: Vec<LiveChannel> = serde_json::from_value(value)?;
        for ch in &mut channels {
            ch.name = clean_channel_name(&ch.name);
        }
        Ok(channels)
    }
}

#[async_trait]
impl SitePlugin for GloboplayPlugin {
    fn name(&self) -> &'static str {
        "globoplay"
    }

    fn matches(&self, url: &str) -> bool {
        url.contains("globoplay.globo.com")
    }

    async fn interact(&self, page: &dyn Page) -> Result<()> {
        if let Err(e) = self.dismiss_warning_modals(page).await {
            tracing::debug!("modal dismissal failed: {e}");
        }

        self.click_play_button(page).await;

        if let Err(e) = page.wait_for_network_idle(IDLE_WAIT).await {
            tracing::debug!("network did not settle: {e}");
            tokio::time::sleep(Duration::from_secs(3)).await;
        }

        Ok(())
    }

    fn initial_thumbnail(&self, url: &str) -> Option<String> {
        // Globo hosts a deterministic snapshot per video id; it is a better
        // thumbnail than anything the page meta tags offer.
        let id = VIDEO_ID.captures(url)?.get(1)?.as_str();
        Some(format!("https://s04.video.glbimg.com/x720/{id}.jpg"))
    }
}

/// Normalize a Globoplay channel card name.
#[must_use]
pub fn clean_channel_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    if name.contains("Globo Internacional") {
        return "Globo Internacional".to_string();
    }
    let name = GLOBOPLAY_PREFIX.replace(name, "");
    let name = BBB_PREFIX.replace(&name, "");
    let name = LIVE_SUFFIX.replace(&name, "");
    name.split(',')
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or_else(|| name.trim())
        .to_string()
}
