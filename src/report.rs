/// Plain-text rendering of the statistics bundle. Thin presentation glue:
/// all numbers arrive precomputed in `WatchStats`.
use crate::models::{ChannelId, ChannelMetadata, WatchStats};
use crate::services::{duration, ids};
use chrono::Local;
use std::collections::HashMap;
use std::fmt::Write;

/// Renders the full report. Channel display names come from the enrichment
/// map when the channel resolved, falling back to the export's name.
pub fn render(stats: &WatchStats, channels: &HashMap<ChannelId, ChannelMetadata>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "YouTube Watch History");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out);

    let _ = writeln!(out, "Overview");
    let _ = writeln!(out, "  Total videos:    {}", stats.total_videos);
    let _ = writeln!(
        out,
        "  YouTube:         {} ({}%)",
        stats.youtube_videos,
        pct(stats.youtube_videos, stats.total_videos)
    );
    let _ = writeln!(
        out,
        "  YouTube Music:   {} ({}%)",
        stats.youtube_music_videos,
        pct(stats.youtube_music_videos, stats.total_videos)
    );
    if stats.total_watch_time > 0 {
        let _ = writeln!(
            out,
            "  Watch time:      {} total, {} regular, {} shorts",
            duration::format_duration(stats.total_watch_time),
            duration::format_duration(stats.total_regular_time),
            duration::format_duration(stats.total_shorts_time)
        );
    }
    let _ = writeln!(
        out,
        "  Regular videos:  {} ({}%)",
        stats.total_regular_videos,
        pct(stats.total_regular_videos, stats.total_videos)
    );
    let _ = writeln!(
        out,
        "  Shorts:          {} ({}%)",
        stats.total_shorts,
        pct(stats.total_shorts, stats.total_videos)
    );
    let _ = writeln!(out);

    if !stats.top_regular_channels.is_empty() {
        let _ = writeln!(out, "Top channels (regular videos)");
        for (rank, channel) in stats.top_regular_channels.iter().enumerate() {
            let name = display_name(&channel.name, channel.url.as_deref(), channels);
            let _ = writeln!(
                out,
                "  #{:<2} {} - {} videos ({}% of regular)",
                rank + 1,
                name,
                channel.video_count,
                pct(channel.video_count, stats.total_regular_videos)
            );
        }
        let _ = writeln!(out);
    }

    if !stats.top_shorts_channels.is_empty() {
        let _ = writeln!(out, "Top channels (shorts)");
        for (rank, channel) in stats.top_shorts_channels.iter().enumerate() {
            let name = display_name(&channel.name, channel.url.as_deref(), channels);
            let _ = writeln!(
                out,
                "  #{:<2} {} - {} shorts ({}% of shorts)",
                rank + 1,
                name,
                channel.short_count,
                pct(channel.short_count, stats.total_shorts)
            );
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Activity");
    let _ = writeln!(
        out,
        "  Most active hour:      {} ({} videos)",
        format_hour(stats.most_active_hour.hour),
        stats.most_active_hour.count
    );
    let _ = writeln!(
        out,
        "  Most active timeframe: {} ({} videos)",
        stats.most_active_timeframe.timeframe.name(),
        stats.most_active_timeframe.count
    );
    let _ = writeln!(out);

    if !stats.daily_stats.is_empty() {
        let _ = writeln!(out, "Recent activity");
        for day in &stats.daily_stats {
            let _ = writeln!(out, "  {}  {} videos", day.date, day.count);
        }
        let _ = writeln!(out);
    }

    if let Some(range) = &stats.date_range {
        let _ = writeln!(out, "Date range");
        let _ = writeln!(
            out,
            "  First entry: {}",
            range.start.with_timezone(&Local).format("%Y-%m-%d")
        );
        let _ = writeln!(
            out,
            "  Last entry:  {}",
            range.end.with_timezone(&Local).format("%Y-%m-%d")
        );
        let _ = writeln!(
            out,
            "  {} days, {} videos per day on average",
            stats.days_spanned, stats.avg_per_day
        );
    }

    out
}

/// 12-hour clock label for an hour bucket
fn format_hour(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        h if h < 12 => format!("{} AM", h),
        12 => "12 PM".to_string(),
        h => format!("{} PM", h - 12),
    }
}

fn display_name<'a>(
    name: &'a str,
    url: Option<&str>,
    channels: &'a HashMap<ChannelId, ChannelMetadata>,
) -> &'a str {
    url.and_then(ids::extract_channel_id)
        .and_then(|id| channels.get(&id))
        .map(|meta| meta.display_name.as_str())
        .unwrap_or(name)
}

fn pct(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u64
}
