/// History normalizer: the single validation boundary between the untyped
/// export payload and the typed entries the aggregator consumes.
use crate::{
    error::{AppError, AppResult},
    models::HistoryEntry,
};
use serde_json::Value;

/// Parses raw export text and normalizes it into history entries.
///
/// Fails with a format error when the text is not JSON or the top level is
/// not an array; everything below that is permissive.
pub fn parse_history(text: &str) -> AppResult<Vec<HistoryEntry>> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| AppError::Format(format!("not valid JSON: {}", e)))?;
    normalize(raw)
}

/// Validates and reshapes raw import records into typed history entries.
///
/// The top-level value must be an array. Per-element validation is
/// permissive: entries pass through with whatever fields are present, and an
/// element that cannot be shaped into an entry at all is skipped, never an
/// error. Real exports contain deleted videos, ads and private content that
/// lack most fields.
pub fn normalize(raw: Value) -> AppResult<Vec<HistoryEntry>> {
    let Value::Array(items) = raw else {
        return Err(AppError::Format(
            "expected a top-level array of history entries".to_string(),
        ));
    };

    let total = items.len();
    let entries: Vec<HistoryEntry> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<HistoryEntry>(item) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed history entry");
                None
            }
        })
        .collect();

    if entries.len() < total {
        tracing::warn!(
            kept = entries.len(),
            skipped = total - entries.len(),
            "Some history entries were malformed and skipped"
        );
    }

    tracing::info!(entries = entries.len(), "History normalized");

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;
    use serde_json::json;

    #[test]
    fn test_normalize_rejects_non_array() {
        let result = normalize(json!({"entries": []}));
        assert!(matches!(result, Err(AppError::Format(_))));

        let result = normalize(json!("just a string"));
        assert!(matches!(result, Err(AppError::Format(_))));
    }

    #[test]
    fn test_normalize_empty_array() {
        let entries = normalize(json!([])).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_normalize_keeps_sparse_entries() {
        let entries = normalize(json!([
            {
                "header": "YouTube",
                "title": "Watched Some Video",
                "titleUrl": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "subtitles": [{"name": "Some Channel", "url": "https://www.youtube.com/channel/UCabc"}],
                "time": "2024-01-15T20:35:02.747Z"
            },
            // ad entry: no titleUrl, no subtitles
            {"header": "YouTube", "title": "Watched a video that has been removed", "time": "2024-01-14T09:00:00Z"},
        ]))
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].title_url.is_some());
        assert!(entries[1].title_url.is_none());
        assert!(entries[1].channel().is_none());
    }

    #[test]
    fn test_normalize_skips_unshapeable_elements() {
        let entries = normalize(json!([
            {"header": "YouTube", "title": "kept"},
            "just a string",
            42,
        ]))
        .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "kept");
    }

    #[test]
    fn test_parse_history_from_text() {
        let entries = parse_history(
            r#"[{"header": "YouTube Music", "title": "Watched a song", "time": "2024-02-01T08:30:00Z"}]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].header, Platform::YouTubeMusic);
    }

    #[test]
    fn test_parse_history_rejects_invalid_json() {
        assert!(matches!(
            parse_history("{not json"),
            Err(AppError::Format(_))
        ));
    }
}
