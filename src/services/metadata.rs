/// Metadata fetcher: batched, paced enrichment of video and channel IDs
/// against the YouTube Data API v3.
///
/// Enrichment is best-effort. The credential is validated once up front and
/// a bad credential aborts the whole call, but after that point a failed
/// batch is recorded and skipped, never fatal: partial results are expected
/// (quota exhaustion mid-run, transient network errors, deleted videos).
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        ApiChannelListResponse, ApiVideoItem, ApiVideoListResponse, BatchFailure, ChannelId,
        ChannelMetadata, VideoFetchOutcome, VideoId, VideoMetadata,
    },
    services::{duration, ids},
};
use reqwest::Client as HttpClient;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// Maximum items per call enforced by the remote API
const BATCH_SIZE: usize = 50;
/// Fixed pacing delay between batch calls
const BATCH_PACING: Duration = Duration::from_millis(200);
/// Placeholder value shipped in setup instructions; never a real key
const PLACEHOLDER_API_KEY: &str = "your_youtube_api_key_here";

pub struct MetadataService {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
}

impl MetadataService {
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.youtube_api_key.clone(), config.youtube_api_url.clone())
    }

    /// Validates the enrichment credential, classifying the failure mode.
    ///
    /// Missing and placeholder keys are caught locally; a present key is
    /// probed with a minimal search call so rejection by the remote service
    /// surfaces before any batch is attempted.
    async fn validate_key(&self) -> AppResult<&str> {
        let key = self.api_key.as_deref().ok_or(AppError::CredentialMissing)?;

        if key.trim().is_empty() || key == PLACEHOLDER_API_KEY {
            return Err(AppError::CredentialInvalid);
        }

        let url = format!("{}/search", self.api_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("maxResults", "1"),
                ("q", "test"),
                ("type", "video"),
                ("key", key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CredentialRejected(format!(
                "status {}: {}",
                status, body
            )));
        }

        tracing::debug!("API key validated");
        Ok(key)
    }

    /// Fetches video metadata for the given IDs, in batches, in input order.
    ///
    /// Returns best-effort results: IDs whose lookups fail (batch error,
    /// deleted video) are simply absent from the map. `on_progress` receives
    /// the processed fraction after each batch, monotonically non-decreasing
    /// and reaching 1.0 after the last batch regardless of failures.
    pub async fn fetch_video_metadata(
        &self,
        video_ids: &[VideoId],
        mut on_progress: impl FnMut(f64),
    ) -> AppResult<VideoFetchOutcome> {
        let key = self.validate_key().await?;

        let mut outcome = VideoFetchOutcome::default();
        if video_ids.is_empty() {
            return Ok(outcome);
        }

        let total = video_ids.len();
        let spans = batch_spans(total);
        let last = spans.len() - 1;

        tracing::info!(ids = total, batches = spans.len(), "Fetching video metadata");

        for (index, (start, end)) in spans.iter().copied().enumerate() {
            match self.fetch_video_batch(key, &video_ids[start..end]).await {
                Ok(items) => {
                    for meta in items {
                        outcome.metadata.insert(meta.id.clone(), meta);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        batch_start = start,
                        batch_end = end,
                        error = %e,
                        "Video batch failed, continuing with next batch"
                    );
                    outcome.failures.push(BatchFailure {
                        batch: (start, end),
                        detail: e.to_string(),
                    });
                }
            }

            on_progress(end as f64 / total as f64);

            if index < last {
                tokio::time::sleep(BATCH_PACING).await;
            }
        }

        tracing::info!(
            resolved = outcome.metadata.len(),
            failed_batches = outcome.failures.len(),
            requested = total,
            "Video enrichment finished"
        );

        Ok(outcome)
    }

    async fn fetch_video_batch(&self, key: &str, batch: &[VideoId]) -> AppResult<Vec<VideoMetadata>> {
        let joined = batch
            .iter()
            .map(VideoId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/videos", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("id", joined.as_str()),
                ("part", "contentDetails,snippet"),
                ("key", key),
            ])
            .send()
            .await
            .map_err(|e| AppError::QuotaOrNetwork(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::QuotaOrNetwork(format!(
                "status {}: {}",
                status, body
            )));
        }

        let list: ApiVideoListResponse = response
            .json()
            .await
            .map_err(|e| AppError::QuotaOrNetwork(format!("invalid response body: {}", e)))?;

        if let Some(err) = list.error {
            return Err(AppError::QuotaOrNetwork(err.message));
        }

        Ok(list.items.into_iter().filter_map(into_video_metadata).collect())
    }

    /// Fetches display names and thumbnails for the top-ranked channels.
    ///
    /// Channel IDs are extracted from the given channel URLs and
    /// deduplicated before batching, which bounds call volume independent of
    /// history size. Batch failures are logged and skipped.
    pub async fn fetch_channel_metadata<'a>(
        &self,
        channel_urls: impl IntoIterator<Item = &'a str>,
    ) -> AppResult<HashMap<ChannelId, ChannelMetadata>> {
        let key = self.validate_key().await?;

        let channel_ids = dedupe_channel_ids(channel_urls);
        let mut details = HashMap::new();
        if channel_ids.is_empty() {
            return Ok(details);
        }

        let total = channel_ids.len();
        let spans = batch_spans(total);
        let last = spans.len() - 1;

        tracing::info!(channels = total, "Fetching channel metadata");

        for (index, (start, end)) in spans.iter().copied().enumerate() {
            match self
                .fetch_channel_batch(key, &channel_ids[start..end])
                .await
            {
                Ok(items) => details.extend(items),
                Err(e) => {
                    tracing::error!(
                        batch_start = start,
                        batch_end = end,
                        error = %e,
                        "Channel batch failed, continuing with next batch"
                    );
                }
            }

            if index < last {
                tokio::time::sleep(BATCH_PACING).await;
            }
        }

        tracing::info!(resolved = details.len(), "Channel enrichment finished");

        Ok(details)
    }

    async fn fetch_channel_batch(
        &self,
        key: &str,
        batch: &[ChannelId],
    ) -> AppResult<HashMap<ChannelId, ChannelMetadata>> {
        let joined = batch
            .iter()
            .map(ChannelId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/channels", self.api_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("id", joined.as_str()), ("part", "snippet"), ("key", key)])
            .send()
            .await
            .map_err(|e| AppError::QuotaOrNetwork(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::QuotaOrNetwork(format!(
                "status {}: {}",
                status, body
            )));
        }

        let list: ApiChannelListResponse = response
            .json()
            .await
            .map_err(|e| AppError::QuotaOrNetwork(format!("invalid response body: {}", e)))?;

        if let Some(err) = list.error {
            return Err(AppError::QuotaOrNetwork(err.message));
        }

        Ok(list
            .items
            .into_iter()
            .filter_map(|item| {
                let id = ChannelId::new(&item.id)?;
                let thumbnail_url = item.snippet.thumbnails.and_then(|t| t.preferred_url());
                Some((
                    id.clone(),
                    ChannelMetadata {
                        id,
                        display_name: item.snippet.title,
                        thumbnail_url,
                    },
                ))
            })
            .collect())
    }
}

/// Converts one API item into a metadata record; items whose ID is not a
/// canonical video token are dropped
fn into_video_metadata(item: ApiVideoItem) -> Option<VideoMetadata> {
    let id = VideoId::new(&item.id)?;
    let duration_seconds = duration::parse_duration(&item.content_details.duration);

    Some(VideoMetadata {
        id,
        duration_seconds,
        is_short: duration::is_short(duration_seconds),
        title: item.snippet.title,
    })
}

/// Partitions `total` items into half-open index spans of at most
/// `BATCH_SIZE`, in order
fn batch_spans(total: usize) -> Vec<(usize, usize)> {
    (0..total)
        .step_by(BATCH_SIZE)
        .map(|start| (start, usize::min(start + BATCH_SIZE, total)))
        .collect()
}

/// Extracts channel IDs from channel URLs, deduplicating while preserving
/// first-seen order
fn dedupe_channel_ids<'a>(channel_urls: impl IntoIterator<Item = &'a str>) -> Vec<ChannelId> {
    let mut seen = HashSet::new();
    channel_urls
        .into_iter()
        .filter_map(ids::extract_channel_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
