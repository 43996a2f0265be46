use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use url::Url;

/// Best-effort timestamp parsing for the formats upstream APIs and pages use.
///
/// Zone-less inputs are read in the provider's local offset (`offset_hours`).
pub fn parse_timestamp(input: &str, offset_hours: i32) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(secs) = input.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }

    let offset = FixedOffset::east_opt(offset_hours * 3600)?;
    let naive = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y.%m.%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%Y.%m.%d.", "%Y.%m.%d"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Title for a bare media URL: its last non-empty path segment, percent-decoded.
pub fn title_from_url(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .last()
            .map(|s| s.to_string())
    });

    match segment {
        Some(segment) => urlencoding::decode(&segment)
            .map(|s| s.into_owned())
            .unwrap_or(segment),
        None => url.to_string(),
    }
}

/// Renders ids that some APIs send as numbers and others as strings.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
