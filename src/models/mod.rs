use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::HashMap, fmt::Display};

// ============================================================================
// History Entry (Normalizer boundary)
// ============================================================================

/// Source platform of a history entry, taken from the export's `header` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Platform {
    #[serde(rename = "YouTube")]
    YouTube,
    #[serde(rename = "YouTube Music")]
    YouTubeMusic,
    /// Anything else the export may contain; counts toward totals only
    #[serde(other)]
    #[default]
    Other,
}

/// Attributed channel reference. The first subtitle of an entry names the
/// channel that published the watched video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// One record of a single watched video/track from the export.
///
/// Real exports are inconsistent: deleted videos, ads and private content
/// often lack `titleUrl` or `subtitles`, so every field is optional-ish and
/// all permissiveness lives here at the deserialization boundary. Entries
/// without `titleUrl` still count toward totals; entries without a first
/// subtitle are excluded from channel aggregation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default)]
    pub header: Platform,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub title_url: Option<String>,
    #[serde(default)]
    pub subtitles: Vec<Subtitle>,
    /// Watch timestamp. Malformed or absent timestamps become `None` rather
    /// than failing the entry; such entries are skipped in temporal views.
    #[serde(default, deserialize_with = "lenient_time")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub activity_controls: Vec<String>,
}

impl HistoryEntry {
    /// The attributed channel, when the export recorded one
    pub fn channel(&self) -> Option<&Subtitle> {
        self.subtitles.first()
    }
}

fn lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

// ============================================================================
// Identifiers
// ============================================================================

/// An 11-character YouTube video ID token.
///
/// The constructor validates the canonical shape, so every `VideoId` in the
/// system matches `[A-Za-z0-9_-]{11}`. A valid ID is still not guaranteed to
/// resolve: deleted or private videos yield no enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(raw: &str) -> Option<Self> {
        let canonical = raw.len() == 11
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        canonical.then(|| VideoId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque channel ID token extracted from a channel URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(raw: &str) -> Option<Self> {
        (!raw.is_empty()).then(|| ChannelId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Enrichment metadata
// ============================================================================

/// Video enrichment record, indexed by `VideoId` for one analysis run.
///
/// A missing map entry means "duration unknown": downstream consumers treat
/// it as 0 seconds / not-a-short, never as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: VideoId,
    pub duration_seconds: u64,
    /// Heuristic: duration strictly under 60 seconds. Not authoritative.
    pub is_short: bool,
    pub title: String,
}

/// Channel enrichment record, built only for top-ranked channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub id: ChannelId,
    pub display_name: String,
    pub thumbnail_url: Option<String>,
}

/// One failed enrichment batch, recorded and skipped
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Half-open index range of the input IDs covered by the batch
    pub batch: (usize, usize),
    pub detail: String,
}

/// Result of a video enrichment run: best-effort metadata plus the batches
/// that failed along the way
#[derive(Debug, Default, Serialize)]
pub struct VideoFetchOutcome {
    pub metadata: HashMap<VideoId, VideoMetadata>,
    pub failures: Vec<BatchFailure>,
}

// ============================================================================
// Statistics bundle
// ============================================================================

/// Per-channel count of regular (non-short) videos watched.
///
/// Keyed by channel display name: two distinct channels sharing a display
/// name collide into one aggregate. Accepted approximation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularChannelStat {
    pub name: String,
    pub video_count: u64,
    pub url: Option<String>,
}

/// Per-channel count of shorts watched; same name-keying caveat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortsChannelStat {
    pub name: String,
    pub short_count: u64,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayStat {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourStat {
    pub hour: u32,
    pub count: u64,
}

/// One of 8 fixed named hour-of-day bands used for habit summarization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    Midnight,
    LateNight,
    EarlyMorning,
    Morning,
    Midday,
    Afternoon,
    Evening,
    Night,
}

impl Timeframe {
    /// Declared band order; ties in the timeframe tally resolve to the
    /// first band in this order
    pub const ALL: [Timeframe; 8] = [
        Timeframe::Midnight,
        Timeframe::LateNight,
        Timeframe::EarlyMorning,
        Timeframe::Morning,
        Timeframe::Midday,
        Timeframe::Afternoon,
        Timeframe::Evening,
        Timeframe::Night,
    ];

    pub fn of_hour(hour: u32) -> Timeframe {
        match hour {
            0..=2 => Timeframe::Midnight,
            3..=5 => Timeframe::LateNight,
            6..=8 => Timeframe::EarlyMorning,
            9..=11 => Timeframe::Morning,
            12 => Timeframe::Midday,
            13..=16 => Timeframe::Afternoon,
            17..=19 => Timeframe::Evening,
            _ => Timeframe::Night,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Timeframe::Midnight => "Midnight",
            Timeframe::LateNight => "Late Night",
            Timeframe::EarlyMorning => "Early Morning",
            Timeframe::Morning => "Morning",
            Timeframe::Midday => "Midday",
            Timeframe::Afternoon => "Afternoon",
            Timeframe::Evening => "Evening",
            Timeframe::Night => "Night",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframeStat {
    pub timeframe: Timeframe,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The full statistics bundle, derived from scratch on every aggregation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchStats {
    pub total_videos: u64,
    pub youtube_videos: u64,
    pub youtube_music_videos: u64,

    /// Watch-time sums in seconds; zero when enrichment was unavailable
    pub total_watch_time: u64,
    pub total_regular_time: u64,
    pub total_shorts_time: u64,
    pub total_regular_videos: u64,
    pub total_shorts: u64,

    pub top_regular_channels: Vec<RegularChannelStat>,
    pub top_shorts_channels: Vec<ShortsChannelStat>,

    /// The 7 calendar dates with the most recent timestamps present in the
    /// data, descending. Not necessarily 7 consecutive days.
    pub daily_stats: Vec<DayStat>,
    /// Always fully populated, zero-filled for hours with no activity
    pub hourly_stats: [u64; 24],
    pub most_active_hour: HourStat,
    pub most_active_timeframe: TimeframeStat,

    pub date_range: Option<DateRange>,
    /// Inclusive day span of the history, floored at 1 when any timestamps
    /// exist; 0 for a history with no usable timestamps
    pub days_spanned: u64,
    /// Entries per day, rounded to one decimal; 0.0 when days_spanned is 0
    pub avg_per_day: f64,
}

// ============================================================================
// YouTube Data API v3 wire types
// ============================================================================

/// Response from GET /videos?part=contentDetails,snippet
#[derive(Debug, Clone, Deserialize)]
pub struct ApiVideoListResponse {
    #[serde(default)]
    pub items: Vec<ApiVideoItem>,
    #[serde(default)]
    pub error: Option<ApiErrorPayload>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiVideoItem {
    pub id: String,
    pub content_details: ApiContentDetails,
    pub snippet: ApiVideoSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiContentDetails {
    /// Compact ISO-8601 duration notation, e.g. "PT1H2M3S"
    pub duration: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiVideoSnippet {
    pub title: String,
}

/// Response from GET /channels?part=snippet
#[derive(Debug, Clone, Deserialize)]
pub struct ApiChannelListResponse {
    #[serde(default)]
    pub items: Vec<ApiChannelItem>,
    #[serde(default)]
    pub error: Option<ApiErrorPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChannelItem {
    pub id: String,
    pub snippet: ApiChannelSnippet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub thumbnails: Option<ApiThumbnails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThumbnails {
    #[serde(default)]
    pub medium: Option<ApiThumbnail>,
    #[serde(default)]
    pub default: Option<ApiThumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiThumbnail {
    pub url: String,
}

impl ApiThumbnails {
    /// Medium preferred, default as fallback
    pub fn preferred_url(&self) -> Option<String> {
        self.medium
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
    }
}

/// Error payload the API embeds in otherwise-parseable responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorPayload {
    #[serde(default)]
    pub message: String,
}
