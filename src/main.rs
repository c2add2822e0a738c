use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use watchstats::{
    config::Config,
    error::AppError,
    models::{ChannelId, ChannelMetadata, HistoryEntry, VideoId, VideoMetadata, WatchStats},
    report,
    services::{aggregate, ids, metadata::MetadataService, normalize, takeout::TakeoutClient},
};

/// Analyze a YouTube watch-history export into viewing statistics
#[derive(Parser, Debug)]
#[command(name = "watchstats", version)]
struct Cli {
    /// Path to the watch-history.json file from Google Takeout
    history_file: Option<PathBuf>,

    /// Download the watch history via the Data Portability API instead of
    /// reading a file (requires GOOGLE_ACCESS_TOKEN)
    #[arg(long)]
    takeout: bool,

    /// Emit the raw statistics bundle as JSON instead of a text report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let entries = load_entries(&cli, &config).await?;
    tracing::info!(entries = entries.len(), "History loaded");

    let service = MetadataService::from_config(&config);
    let video_meta = enrich_videos(&service, &entries).await;

    let stats = aggregate::aggregate(&entries, &video_meta);

    let channel_meta = enrich_channels(&service, &stats).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", report::render(&stats, &channel_meta));
    }

    Ok(())
}

/// Funnels both import paths into the same normalizer
async fn load_entries(cli: &Cli, config: &Config) -> anyhow::Result<Vec<HistoryEntry>> {
    if cli.takeout {
        let token = config.google_access_token.clone().ok_or_else(|| {
            anyhow::anyhow!("--takeout requires GOOGLE_ACCESS_TOKEN to be set")
        })?;
        let client = TakeoutClient::new(token, config.portability_api_url.clone());
        let raw = client.download_watch_history().await?;
        Ok(normalize::normalize(serde_json::Value::Array(raw))?)
    } else {
        let path = cli.history_file.as_ref().ok_or_else(|| {
            anyhow::anyhow!("provide a history file path, or --takeout to download one")
        })?;
        let text = std::fs::read_to_string(path)?;
        Ok(normalize::parse_history(&text)?)
    }
}

/// Video enrichment with graceful degradation: a credential-phase failure
/// becomes a single advisory and the pipeline continues with count-only
/// statistics.
async fn enrich_videos(
    service: &MetadataService,
    entries: &[HistoryEntry],
) -> HashMap<VideoId, VideoMetadata> {
    let video_ids: Vec<VideoId> = entries
        .iter()
        .filter_map(|e| e.title_url.as_deref())
        .filter_map(ids::extract_video_id)
        .collect();

    if video_ids.is_empty() {
        tracing::warn!("No video IDs found in the history, skipping enrichment");
        return HashMap::new();
    }

    tracing::info!(ids = video_ids.len(), "Extracted video IDs");

    match service
        .fetch_video_metadata(&video_ids, |fraction| {
            tracing::info!(percent = (fraction * 100.0).round() as u64, "Enriching videos");
        })
        .await
    {
        Ok(outcome) => {
            if !outcome.failures.is_empty() {
                tracing::warn!(
                    failed_batches = outcome.failures.len(),
                    "Some enrichment batches failed; statistics are partial"
                );
            }
            outcome.metadata
        }
        Err(e) => {
            advise_degraded(&e);
            HashMap::new()
        }
    }
}

/// Channel enrichment for the top-ranked channels only; failures degrade
/// silently to export-provided names.
async fn enrich_channels(
    service: &MetadataService,
    stats: &WatchStats,
) -> HashMap<ChannelId, ChannelMetadata> {
    let top_urls: Vec<&str> = stats
        .top_regular_channels
        .iter()
        .filter_map(|c| c.url.as_deref())
        .chain(
            stats
                .top_shorts_channels
                .iter()
                .filter_map(|c| c.url.as_deref()),
        )
        .collect();

    if top_urls.is_empty() {
        return HashMap::new();
    }

    match service.fetch_channel_metadata(top_urls).await {
        Ok(details) => details,
        Err(e) => {
            tracing::debug!(error = %e, "Channel enrichment unavailable");
            HashMap::new()
        }
    }
}

fn advise_degraded(error: &AppError) {
    if error.is_credential_error() {
        tracing::warn!(
            "{} Statistics will show video counts instead of watch time.",
            error
        );
    } else {
        tracing::warn!(
            error = %error,
            "Video enrichment failed; continuing with count-only statistics"
        );
    }
}
