//! `streamsift` CLI - classify request logs and inspect the filter engine
//!
//! The browser driver is an external component, so the CLI works on request
//! logs: feed it the URLs a page issued (one per line, e.g. exported from
//! devtools or a HAR dump) and it runs them through the capture engine.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use streamsift::playlist::{write_m3u, M3uEntry};
use streamsift::{detect_format, normalize_url, FilterConfig, NetworkCapture, PluginRegistry};

#[derive(Parser)]
#[command(name = "streamsift")]
#[command(about = "Finds HLS/DASH manifest URLs in streaming-page network traffic")]
#[command(version)]
struct Cli {
    /// Path to a filters.toml overriding the built-in keyword lists
    #[arg(long, global = true)]
    filters: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sift request logs through the capture engine
    Sift {
        /// Files with one request URL per line, or "-" for stdin
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Write an #EXTM3U playlist, one entry per input's best URL
        #[arg(long, value_name = "FILE")]
        m3u: Option<PathBuf>,
    },

    /// Show the classification verdict for a single URL
    Check {
        /// URL to classify
        url: String,
    },

    /// List site plugins and which one a URL would select
    Plugins {
        /// Optional URL to run through the selector
        url: Option<String>,
    },
}

fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let filters = match &cli.filters {
        Some(path) => FilterConfig::load(path)?,
        None => FilterConfig::load_default()?,
    };

    match cli.command {
        Commands::Sift { inputs, json, m3u } => cmd_sift(&inputs, json, m3u.as_deref(), &filters),
        Commands::Check { url } => {
            cmd_check(&url, &filters);
            Ok(())
        }
        Commands::Plugins { url } => {
            cmd_plugins(url.as_deref());
            Ok(())
        }
    }
}

fn cmd_sift(inputs: &[String], json: bool, m3u: Option<&Path>, filters: &FilterConfig) -> Result<()> {
    let mut results: Vec<(&str, NetworkCapture)> = Vec::new();
    for input in inputs {
        let mut capture = NetworkCapture::new(filters.clone());
        sift_log(input, &mut capture)?;
        results.push((input.as_str(), capture));
    }

    if json {
        let out = results
            .iter()
            .map(|(input, capture)| {
                serde_json::json!({
                    "input": input,
                    "streams": capture.streams().iter().map(|s| serde_json::json!({
                        "url": s.url,
                        "raw_url": s.raw_url,
                        "format": s.format.as_str(),
                        "priority": s.is_priority,
                    })).collect::<Vec<_>>(),
                    "best_url": capture.best_url(),
                })
            })
            .collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (input, capture) in &results {
            if results.len() > 1 {
                println!("📂 {input}");
            }
            if capture.has_streams() {
                println!("📺 {} stream(s) found:\n", capture.len());
                for stream in capture.streams() {
                    let marker = if stream.is_priority { "★" } else { " " };
                    println!("  {marker} [{}] {}", stream.format.as_str(), stream.url);
                }
                if let Some(best) = capture.best_url() {
                    println!("\n✅ Best: {best}");
                }
            } else {
                println!("❌ No media streams found in the request log.");
            }
            if results.len() > 1 {
                println!();
            }
        }
    }

    if let Some(path) = m3u {
        // A request log carries no page title or thumbnail, so every entry
        // gets the source-derived display title and no logo. Extraction
        // results go through M3uEntry::from_extraction instead.
        let entries: Vec<M3uEntry> = results
            .iter()
            .filter_map(|(input, capture)| {
                capture.best_url().map(|url| M3uEntry {
                    title: format!("Stream de {input}"),
                    url: url.to_string(),
                    logo: None,
                })
            })
            .collect();
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        write_m3u(file, &entries)?;
        println!("\n✓ Playlist written to {}", path.display());
    }

    Ok(())
}

/// Feed one request log (file path or "-" for stdin) into a capture engine.
fn sift_log(input: &str, capture: &mut NetworkCapture) -> Result<()> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(std::io::stdin().lock())
    } else {
        let file = std::fs::File::open(input).with_context(|| format!("failed to open {input}"))?;
        Box::new(std::io::BufReader::new(file))
    };

    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() || url.starts_with('#') {
            continue;
        }
        capture.process_url(url);
    }
    Ok(())
}

fn cmd_check(url: &str, filters: &FilterConfig) {
    println!("🔍 {url}\n");

    let embedded = filters.extract_embedded(url);
    let candidate = embedded.as_deref().unwrap_or(url);
    if let Some(inner) = &embedded {
        println!("   Embedded URL: {inner}");
    }

    let media = filters.is_media_url(candidate);
    let blacklisted = filters.is_blacklisted(candidate);
    let normalized = normalize_url(candidate);

    println!("   Media URL:   {}", if media { "yes" } else { "no" });
    println!("   Blacklisted: {}", if blacklisted { "yes" } else { "no" });
    println!("   Format:      {}", detect_format(candidate).as_str());
    println!("   Priority:    {}", if filters.is_priority(&normalized) { "yes" } else { "no" });
    println!("   Normalized:  {normalized}");

    let verdict = if media && !blacklisted { "ACCEPT" } else { "REJECT" };
    println!("\n   Verdict:     {verdict}");
}

fn cmd_plugins(url: Option<&str>) {
    let registry = PluginRegistry::new();

    println!("🔌 Registered site plugins:");
    for name in registry.names() {
        println!("   - {name}");
    }
    println!("   - generic (fallback)");

    if let Some(url) = url {
        let plugin = registry.select(url);
        println!("\n   {url} → {}", plugin.name());
    }
}
