/// Identifier extraction from the heterogeneous URL strings found in real
/// watch-history exports.
///
/// Absence is a valid, expected outcome: exports contain post links, deleted
/// videos and plain noise, so both extractors return `None` instead of
/// erroring when no known host pattern matches.
use crate::models::{ChannelId, VideoId};
use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"youtube\.com/watch\?v=([A-Za-z0-9_-]{11})",
        r"youtu\.be/([A-Za-z0-9_-]{11})",
        r"youtube\.com/embed/([A-Za-z0-9_-]{11})",
        r"youtube\.com/v/([A-Za-z0-9_-]{11})",
        r"music\.youtube\.com/watch\?v=([A-Za-z0-9_-]{11})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static CHANNEL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"youtube\.com/channel/([A-Za-z0-9_-]+)",
        r"youtube\.com/c/([A-Za-z0-9_-]+)",
        r"youtube\.com/user/([A-Za-z0-9_-]+)",
        r"youtube\.com/@([A-Za-z0-9_-]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Pulls the canonical 11-character video ID out of a watch URL, trying each
/// known host format in order
pub fn extract_video_id(url: &str) -> Option<VideoId> {
    VIDEO_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| VideoId::new(captures.get(1)?.as_str()))
}

/// Pulls the channel ID token out of a channel URL (`/channel/`, `/c/`,
/// `/user/` and `/@handle` forms)
pub fn extract_channel_id(url: &str) -> Option<ChannelId> {
    CHANNEL_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|captures| ChannelId::new(captures.get(1)?.as_str()))
}
