//! M3U playlist output.
//!
//! One `#EXTINF` entry per extraction result: the best URL, the thumbnail
//! as `tvg-logo` when known, and a display title derived from the source
//! URL when only the placeholder title was found.

use std::io::Write;

use anyhow::Result;

use crate::extract::Extraction;
use crate::metadata::TITLE_SENTINEL;

/// One playlist entry.
#[derive(Debug, Clone)]
pub struct M3uEntry {
    pub title: String,
    pub url: String,
    pub logo: Option<String>,
}

impl M3uEntry {
    /// Build an entry from an extraction result, or `None` when the result
    /// carries no stream.
    #[must_use]
    pub fn from_extraction(result: &Extraction) -> Option<Self> {
        let url = result.best_url.clone()?;
        let title = if result.title == TITLE_SENTINEL {
            format!("Stream de {}", result.source_url)
        } else {
            result.title.clone()
        };
        Some(Self {
            title,
            url,
            logo: result.thumbnail.clone(),
        })
    }
}

/// Write entries as an `#EXTM3U` playlist.
pub fn write_m3u<W: Write>(mut out: W, entries: &[M3uEntry]) -> Result<()> {
    writeln!(out, "#EXTM3U")?;
    for entry in entries {
        match entry.logo.as_deref() {
            Some(logo) => writeln!(
                out,
                "#EXTINF:-1 tvg-logo=\"{logo}\" group-title=\"STREAMSIFT\", {}",
                entry.title
            )?,
            None => writeln!(out, "#EXTINF:-1 group-title=\"STREAMSIFT\", {}", entry.title)?,
        }
        writeln!(out, "{}", entry.url)?;
    }
    Ok(())
}
