//! Site-specific interaction plugins.
//!
//! Some streaming sites only start requesting manifests after a play button
//! is clicked or a paywall modal is dismissed. A [`SitePlugin`] encapsulates
//! that knowledge for one site family; the [`PluginRegistry`] picks the
//! first registered plugin whose domain predicate matches the target URL
//! and falls back to [`GenericPlugin`].
//!
//! Plugin interaction is strictly best-effort: failures are logged by the
//! orchestrator and never abort an extraction.

pub mod generic;
pub mod globoplay;

use anyhow::Result;
use async_trait::async_trait;

use crate::page::Page;

pub use generic::GenericPlugin;
pub use globoplay::GloboplayPlugin;

/// Interaction strategy for one site family.
#[async_trait]
pub trait SitePlugin: Send + Sync {
    /// Plugin name (e.g. "globoplay", "generic").
    fn name(&self) -> &'static str;

    /// Check if this plugin handles the given page URL.
    fn matches(&self, url: &str) -> bool;

    /// Drive the page until the player starts requesting media. Bounded
    /// waits only; internal failures should be swallowed where possible.
    async fn interact(&self, page: &dyn Page) -> Result<()>;

    /// A deterministic, high-trust thumbnail derived from the target URL
    /// alone (e.g. from a video id pattern), applied before the first poll.
    fn initial_thumbnail(&self, url: &str) -> Option<String> {
        let _ = url;
        None
    }
}

/// Registration-order plugin selection with a generic fallback.
///
/// Registration happens once at startup; afterwards the registry is only
/// read, so it can be shared freely across extractions.
pub struct PluginRegistry {
    plugins: Vec<Box<dyn SitePlugin>>,
    generic: GenericPlugin,
}

impl PluginRegistry {
    /// Registry with all bundled site plugins.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(GloboplayPlugin));
        registry
    }

    /// Registry with no site plugins; everything falls back to generic.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            plugins: Vec::new(),
            generic: GenericPlugin,
        }
    }

    /// Register a plugin. Checked after previously registered ones.
    pub fn register(&mut self, plugin: Box<dyn SitePlugin>) {
        self.plugins.push(plugin);
    }

    /// First plugin whose predicate matches, else the generic fallback.
    #[must_use]
    pub fn select(&self, url: &str) -> &dyn SitePlugin {
        for plugin in &self.plugins {
            if plugin.matches(url) {
                tracing::debug!(plugin = plugin.name(), "matched site plugin");
                return plugin.as_ref();
            }
        }
        &self.generic
    }

    /// Names of registered site plugins, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
