use crate::core::registry::Provider;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Normalized video record shared by every provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    /// Seconds.
    pub duration: u64,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ratings: BTreeMap<String, Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Set by the engine after dispatch, never by an extractor.
    #[serde(default)]
    pub provider: Option<Provider>,
    pub details: Details,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Details {
    pub definition: String,
    pub author: Author,
    #[serde(default)]
    pub embed: Option<Embed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    /// Playback stream location or key handed out by the provider.
    #[serde(default)]
    pub stream: Option<String>,
}

impl Video {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            title: String::new(),
            description: String::new(),
            thumbnail_url: String::new(),
            duration: 0,
            created_at: None,
            ratings: BTreeMap::new(),
            tags: None,
            provider: None,
            details: Details::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_json_round_trip_keeps_absent_fields() {
        let mut video = Video::new("abc", "https://example.com/abc");
        video.title = "Title".to_string();
        video.duration = 951;
        video.created_at = Some(Utc.with_ymd_and_hms(2015, 8, 4, 13, 12, 21).unwrap());
        video.ratings.insert("ytRating".to_string(), Value::String("none".to_string()));
        video.tags = Some(vec![]);
        video.details.author = Author {
            id: "u1".to_string(),
            title: "Someone".to_string(),
            url: None,
        };

        let json = serde_json::to_string(&video).unwrap();
        let back: Video = serde_json::from_str(&json).unwrap();
        assert_eq!(back, video);
        assert!(json.contains("\"created_at\":\"2015-08-04T13:12:21Z\""));
    }
}
