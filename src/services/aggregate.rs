/// Statistical reduction of normalized history entries into the full
/// statistics bundle.
///
/// Pure function of its inputs: deterministic given the same entries and
/// metadata map, recomputed from scratch on every call, no I/O. The caller
/// supplies the enrichment map, keeping this module free of network concerns
/// and independently testable.
use crate::{
    models::{
        DateRange, DayStat, HistoryEntry, HourStat, Platform, RegularChannelStat,
        ShortsChannelStat, Timeframe, TimeframeStat, VideoId, VideoMetadata, WatchStats,
    },
    services::ids,
};
use chrono::{DateTime, Local, NaiveDate, Timelike};
use std::collections::HashMap;

const TOP_CHANNELS: usize = 10;
const RECENT_DAYS: usize = 7;
const SECS_PER_DAY: f64 = 86_400.0;

/// Aggregates normalized entries and their enrichment map into statistics.
///
/// Entries without a metadata mapping contribute zero watch time and count
/// as regular videos; entries without a timestamp are excluded from the
/// temporal views but still count toward totals.
pub fn aggregate(
    entries: &[HistoryEntry],
    video_meta: &HashMap<VideoId, VideoMetadata>,
) -> WatchStats {
    let total_videos = entries.len() as u64;
    let youtube_videos = entries
        .iter()
        .filter(|e| e.header == Platform::YouTube)
        .count() as u64;
    let youtube_music_videos = entries
        .iter()
        .filter(|e| e.header == Platform::YouTubeMusic)
        .count() as u64;

    let mut total_watch_time = 0u64;
    let mut total_regular_time = 0u64;
    let mut total_shorts_time = 0u64;
    let mut total_regular_videos = 0u64;
    let mut total_shorts = 0u64;

    let mut regular_channels = ChannelCounter::default();
    let mut shorts_channels = ChannelCounter::default();

    // Single pass: watch time split by kind, channel counters keyed by the
    // first subtitle's channel name
    for entry in entries {
        let Some(url) = entry.title_url.as_deref() else {
            continue;
        };

        let detail = ids::extract_video_id(url).and_then(|id| video_meta.get(&id));
        let duration = detail.map(|d| d.duration_seconds).unwrap_or(0);
        let is_short = detail.map(|d| d.is_short).unwrap_or(false);

        total_watch_time += duration;

        let Some(channel) = entry.channel() else {
            continue;
        };

        if is_short {
            total_shorts += 1;
            total_shorts_time += duration;
            shorts_channels.bump(&channel.name, channel.url.as_deref());
        } else {
            total_regular_videos += 1;
            total_regular_time += duration;
            regular_channels.bump(&channel.name, channel.url.as_deref());
        }
    }

    // Metadata-dependent second pass is folded into the first via the map;
    // temporal views need only the timestamps
    let local_times: Vec<DateTime<Local>> = entries
        .iter()
        .filter_map(|e| e.time)
        .map(|t| t.with_timezone(&Local))
        .collect();

    let mut hourly_stats = [0u64; 24];
    let mut day_counts: HashMap<NaiveDate, u64> = HashMap::new();
    let mut timeframe_counts = [0u64; 8];

    for t in &local_times {
        hourly_stats[t.hour() as usize] += 1;
        *day_counts.entry(t.date_naive()).or_default() += 1;
        timeframe_counts[timeframe_index(Timeframe::of_hour(t.hour()))] += 1;
    }

    let date_range = date_range(entries);
    let days_spanned = days_spanned(&date_range);
    let avg_per_day = if days_spanned > 0 {
        round_one_decimal(total_videos as f64 / days_spanned as f64)
    } else {
        0.0
    };

    WatchStats {
        total_videos,
        youtube_videos,
        youtube_music_videos,
        total_watch_time,
        total_regular_time,
        total_shorts_time,
        total_regular_videos,
        total_shorts,
        top_regular_channels: regular_channels
            .into_ranked(TOP_CHANNELS)
            .into_iter()
            .map(|c| RegularChannelStat {
                name: c.name,
                video_count: c.count,
                url: c.url,
            })
            .collect(),
        top_shorts_channels: shorts_channels
            .into_ranked(TOP_CHANNELS)
            .into_iter()
            .map(|c| ShortsChannelStat {
                name: c.name,
                short_count: c.count,
                url: c.url,
            })
            .collect(),
        daily_stats: recent_daily_stats(day_counts),
        most_active_hour: most_active_hour(&hourly_stats),
        most_active_timeframe: most_active_timeframe(&timeframe_counts),
        hourly_stats,
        date_range,
        days_spanned,
        avg_per_day,
    }
}

/// Per-channel tally preserving first-encounter order, so the stable
/// descending sort breaks ties by original encounter order
#[derive(Default)]
struct ChannelCounter {
    index: HashMap<String, usize>,
    counts: Vec<ChannelCount>,
}

struct ChannelCount {
    name: String,
    count: u64,
    url: Option<String>,
}

impl ChannelCounter {
    fn bump(&mut self, name: &str, url: Option<&str>) {
        match self.index.get(name) {
            Some(&i) => self.counts[i].count += 1,
            None => {
                self.index.insert(name.to_string(), self.counts.len());
                self.counts.push(ChannelCount {
                    name: name.to_string(),
                    count: 1,
                    url: url.map(String::from),
                });
            }
        }
    }

    fn into_ranked(self, top: usize) -> Vec<ChannelCount> {
        let mut counts = self.counts;
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(top);
        counts
    }
}

/// The calendar dates with the most recent timestamps present in the data,
/// descending. Not necessarily consecutive days when the history has gaps.
fn recent_daily_stats(day_counts: HashMap<NaiveDate, u64>) -> Vec<DayStat> {
    let mut days: Vec<DayStat> = day_counts
        .into_iter()
        .map(|(date, count)| DayStat { date, count })
        .collect();
    days.sort_by(|a, b| b.date.cmp(&a.date));
    days.truncate(RECENT_DAYS);
    days
}

/// First maximum wins: ties resolve to the lowest hour number
fn most_active_hour(hourly: &[u64; 24]) -> HourStat {
    let mut best = HourStat { hour: 0, count: hourly[0] };
    for (hour, &count) in hourly.iter().enumerate().skip(1) {
        if count > best.count {
            best = HourStat {
                hour: hour as u32,
                count,
            };
        }
    }
    best
}

/// Ties resolve to the first band in declared order, independent of which
/// band was encountered first in the data
fn most_active_timeframe(counts: &[u64; 8]) -> TimeframeStat {
    let mut best = TimeframeStat {
        timeframe: Timeframe::ALL[0],
        count: counts[0],
    };
    for (i, &timeframe) in Timeframe::ALL.iter().enumerate().skip(1) {
        if counts[i] > best.count {
            best = TimeframeStat {
                timeframe,
                count: counts[i],
            };
        }
    }
    best
}

fn timeframe_index(timeframe: Timeframe) -> usize {
    match timeframe {
        Timeframe::Midnight => 0,
        Timeframe::LateNight => 1,
        Timeframe::EarlyMorning => 2,
        Timeframe::Morning => 3,
        Timeframe::Midday => 4,
        Timeframe::Afternoon => 5,
        Timeframe::Evening => 6,
        Timeframe::Night => 7,
    }
}

fn date_range(entries: &[HistoryEntry]) -> Option<DateRange> {
    let mut times = entries.iter().filter_map(|e| e.time);
    let first = times.next()?;
    let (start, end) = times.fold((first, first), |(min, max), t| (min.min(t), max.max(t)));
    Some(DateRange { start, end })
}

/// Inclusive day span, floored at 1 so a single-day history never divides
/// the per-day average by zero
fn days_spanned(range: &Option<DateRange>) -> u64 {
    let Some(range) = range else { return 0 };
    let span_secs = (range.end - range.start).num_seconds().max(0) as f64;
    ((span_secs / SECS_PER_DAY).ceil() as u64).max(1)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subtitle;
    use chrono::{TimeZone, Utc};

    fn entry_at(time: &str) -> HistoryEntry {
        HistoryEntry {
            header: Platform::YouTube,
            title: "Watched something".to_string(),
            title_url: None,
            subtitles: vec![],
            time: Some(
                DateTime::parse_from_rfc3339(time)
                    .unwrap()
                    .with_timezone(&Utc),
            ),
            products: vec![],
            activity_controls: vec![],
        }
    }

    fn entry_with_video(video_id: &str, channel: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            header: Platform::YouTube,
            title: "Watched something".to_string(),
            title_url: Some(format!("https://www.youtube.com/watch?v={}", video_id)),
            subtitles: channel
                .map(|name| {
                    vec![Subtitle {
                        name: name.to_string(),
                        url: Some(format!("https://www.youtube.com/channel/UC{}", name)),
                    }]
                })
                .unwrap_or_default(),
            time: Some(Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap()),
            products: vec![],
            activity_controls: vec![],
        }
    }

    fn meta(video_id: &str, duration: u64) -> (VideoId, VideoMetadata) {
        let id = VideoId::new(video_id).unwrap();
        (
            id.clone(),
            VideoMetadata {
                id,
                duration_seconds: duration,
                is_short: duration < 60,
                title: "t".to_string(),
            },
        )
    }

    #[test]
    fn test_empty_history_yields_zeroed_bundle() {
        let stats = aggregate(&[], &HashMap::new());

        assert_eq!(stats.total_videos, 0);
        assert_eq!(stats.total_watch_time, 0);
        assert!(stats.top_regular_channels.is_empty());
        assert!(stats.top_shorts_channels.is_empty());
        assert!(stats.daily_stats.is_empty());
        assert_eq!(stats.hourly_stats, [0u64; 24]);
        assert!(stats.date_range.is_none());
        assert_eq!(stats.days_spanned, 0);
        assert_eq!(stats.avg_per_day, 0.0);
        assert!(stats.avg_per_day.is_finite());
    }

    #[test]
    fn test_platform_totals_count_sparse_entries() {
        let mut music = entry_at("2024-03-01T10:00:00Z");
        music.header = Platform::YouTubeMusic;

        let entries = vec![
            entry_with_video("dQw4w9WgXcQ", Some("chan")),
            music,
            // entry without titleUrl: totals only
            entry_at("2024-03-02T10:00:00Z"),
        ];

        let stats = aggregate(&entries, &HashMap::new());
        assert_eq!(stats.total_videos, 3);
        assert_eq!(stats.youtube_videos, 2);
        assert_eq!(stats.youtube_music_videos, 1);
        // the bare entries contribute to no channel aggregate
        let channel_total: u64 = stats
            .top_regular_channels
            .iter()
            .map(|c| c.video_count)
            .sum();
        assert_eq!(channel_total, 1);
    }

    #[test]
    fn test_missing_metadata_means_zero_duration_regular() {
        let entries = vec![entry_with_video("dQw4w9WgXcQ", Some("chan"))];

        let stats = aggregate(&entries, &HashMap::new());
        assert_eq!(stats.total_watch_time, 0);
        assert_eq!(stats.total_shorts, 0);
        assert_eq!(stats.total_regular_videos, 1);
    }

    #[test]
    fn test_shorts_and_regular_split_for_one_channel() {
        let entries = vec![
            entry_with_video("aaaaaaaaaaa", Some("chan")),
            entry_with_video("bbbbbbbbbbb", Some("chan")),
        ];
        let video_meta: HashMap<_, _> =
            [meta("aaaaaaaaaaa", 30), meta("bbbbbbbbbbb", 300)].into();

        let stats = aggregate(&entries, &video_meta);

        assert_eq!(stats.total_watch_time, 330);
        assert_eq!(stats.total_shorts_time, 30);
        assert_eq!(stats.total_regular_time, 300);
        assert_eq!(stats.top_shorts_channels.len(), 1);
        assert_eq!(stats.top_shorts_channels[0].short_count, 1);
        assert_eq!(stats.top_regular_channels.len(), 1);
        assert_eq!(stats.top_regular_channels[0].video_count, 1);
    }

    #[test]
    fn test_watch_time_counts_entries_without_channel() {
        // titleUrl present, subtitles absent: watch time yes, channels no
        let entries = vec![entry_with_video("aaaaaaaaaaa", None)];
        let video_meta: HashMap<_, _> = [meta("aaaaaaaaaaa", 120)].into();

        let stats = aggregate(&entries, &video_meta);
        assert_eq!(stats.total_watch_time, 120);
        assert_eq!(stats.total_regular_videos, 0);
        assert!(stats.top_regular_channels.is_empty());
    }

    #[test]
    fn test_top_channels_truncated_to_ten_descending() {
        let mut entries = Vec::new();
        // 15 channels with strictly decreasing counts 15..=1
        for (i, count) in (1..=15u64).rev().enumerate() {
            for _ in 0..count {
                entries.push(entry_with_video("dQw4w9WgXcQ", Some(&format!("chan{:02}", i))));
            }
        }

        let stats = aggregate(&entries, &HashMap::new());

        assert_eq!(stats.top_regular_channels.len(), 10);
        let counts: Vec<u64> = stats
            .top_regular_channels
            .iter()
            .map(|c| c.video_count)
            .collect();
        assert_eq!(counts, vec![15, 14, 13, 12, 11, 10, 9, 8, 7, 6]);
        assert_eq!(stats.top_regular_channels[0].name, "chan00");
    }

    #[test]
    fn test_equal_counts_keep_encounter_order() {
        let entries = vec![
            entry_with_video("dQw4w9WgXcQ", Some("first-seen")),
            entry_with_video("dQw4w9WgXcQ", Some("second-seen")),
            entry_with_video("dQw4w9WgXcQ", Some("second-seen")),
            entry_with_video("dQw4w9WgXcQ", Some("first-seen")),
        ];

        let stats = aggregate(&entries, &HashMap::new());
        assert_eq!(stats.top_regular_channels[0].name, "first-seen");
        assert_eq!(stats.top_regular_channels[1].name, "second-seen");
    }

    #[test]
    fn test_hourly_histogram_fully_populated() {
        let entries = vec![entry_at("2024-03-10T14:00:00Z")];
        let stats = aggregate(&entries, &HashMap::new());

        assert_eq!(stats.hourly_stats.len(), 24);
        assert_eq!(stats.hourly_stats.iter().sum::<u64>(), 1);

        // the single entry lands in its local-time hour bucket
        let expected_hour = Utc
            .with_ymd_and_hms(2024, 3, 10, 14, 0, 0)
            .unwrap()
            .with_timezone(&Local)
            .hour();
        assert_eq!(stats.hourly_stats[expected_hour as usize], 1);
        assert_eq!(stats.most_active_hour.hour, expected_hour);
        assert_eq!(stats.most_active_hour.count, 1);
    }

    #[test]
    fn test_most_active_hour_tie_takes_lowest() {
        let mut hourly = [0u64; 24];
        hourly[9] = 5;
        hourly[21] = 5;
        hourly[3] = 2;

        let best = most_active_hour(&hourly);
        assert_eq!(best.hour, 9);
        assert_eq!(best.count, 5);
    }

    #[test]
    fn test_most_active_timeframe_tie_takes_declared_order() {
        // Morning and Night tied; Morning is declared earlier
        let mut counts = [0u64; 8];
        counts[timeframe_index(Timeframe::Night)] = 4;
        counts[timeframe_index(Timeframe::Morning)] = 4;

        let best = most_active_timeframe(&counts);
        assert_eq!(best.timeframe, Timeframe::Morning);
        assert_eq!(best.count, 4);
    }

    #[test]
    fn test_daily_stats_most_recent_seven_descending() {
        let mut entries = Vec::new();
        for day in 1..=9 {
            entries.push(entry_at(&format!("2024-03-{:02}T12:00:00Z", day)));
            entries.push(entry_at(&format!("2024-03-{:02}T12:30:00Z", day)));
        }

        let stats = aggregate(&entries, &HashMap::new());

        assert_eq!(stats.daily_stats.len(), 7);
        assert!(stats
            .daily_stats
            .windows(2)
            .all(|w| w[0].date > w[1].date));
        assert!(stats.daily_stats.iter().all(|d| d.count == 2));
    }

    #[test]
    fn test_single_day_history_guards_day_span() {
        let entries = vec![
            entry_at("2024-03-10T09:00:00Z"),
            entry_at("2024-03-10T09:00:00Z"),
            entry_at("2024-03-10T09:00:00Z"),
        ];

        let stats = aggregate(&entries, &HashMap::new());
        assert_eq!(stats.days_spanned, 1);
        assert_eq!(stats.avg_per_day, 3.0);
        assert!(stats.avg_per_day.is_finite());
    }

    #[test]
    fn test_date_range_and_average() {
        let entries = vec![
            entry_at("2024-03-01T00:00:00Z"),
            entry_at("2024-03-04T00:00:00Z"),
            entry_at("2024-03-02T00:00:00Z"),
        ];

        let stats = aggregate(&entries, &HashMap::new());
        let range = stats.date_range.unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap());
        assert_eq!(stats.days_spanned, 3);
        assert_eq!(stats.avg_per_day, 1.0);
    }

    #[test]
    fn test_untimed_entries_skip_temporal_views_only() {
        let mut untimed = entry_with_video("dQw4w9WgXcQ", Some("chan"));
        untimed.time = None;

        let stats = aggregate(&[untimed], &HashMap::new());
        assert_eq!(stats.total_videos, 1);
        assert_eq!(stats.hourly_stats.iter().sum::<u64>(), 0);
        assert!(stats.date_range.is_none());
        assert_eq!(stats.days_spanned, 0);
        assert_eq!(stats.avg_per_day, 0.0);
    }
}
