/// Duration codec for the compact ISO-8601 notation used by the metadata API
/// ("PT1H2M3S"), plus the short-form classification heuristic.
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?").unwrap());

/// Threshold for the short-form heuristic, in seconds
const SHORT_THRESHOLD: u64 = 60;

/// Parses a compact ISO-8601 duration into seconds.
///
/// Every component is optional and defaults to zero. Malformed input yields
/// 0 rather than an error: the upstream metadata format is trusted but
/// partial matches should not abort a batch.
pub fn parse_duration(text: &str) -> u64 {
    let Some(captures) = DURATION_RE.captures(text) else {
        return 0;
    };

    let component = |i: usize| {
        captures
            .get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    component(1) * 3600 + component(2) * 60 + component(3)
}

/// Renders seconds as a human-readable duration: hours+minutes when there
/// are hours, minutes+seconds when there are minutes, else seconds alone.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// A video counts as a short iff it runs strictly under 60 seconds.
///
/// This is a heuristic substitute for ground-truth classification, which the
/// metadata API does not expose. Not authoritative.
pub fn is_short(duration_seconds: u64) -> bool {
    duration_seconds < SHORT_THRESHOLD
}
