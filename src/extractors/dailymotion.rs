use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use std::collections::BTreeMap;

const API_BASE: &str = "https://api.dailymotion.com/video";
const FIELDS: &str = "id,title,description,thumbnail_720_url,duration,created_time,allow_embed,explicit,owner.id,owner.screenname,owner.url,tags,embed_html";

pub struct DailymotionExtractor;

#[derive(Deserialize)]
struct DailymotionVideo {
    #[serde(default)]
    title: String,
    description: Option<String>,
    thumbnail_720_url: Option<String>,
    #[serde(default)]
    duration: u64,
    created_time: Option<i64>,
    allow_embed: Option<bool>,
    explicit: Option<bool>,
    #[serde(rename = "owner.id")]
    owner_id: Option<String>,
    #[serde(rename = "owner.screenname")]
    owner_name: Option<String>,
    #[serde(rename = "owner.url")]
    owner_url: Option<String>,
    tags: Option<Vec<String>>,
    embed_html: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: DailymotionError,
}

#[derive(Deserialize)]
struct DailymotionError {
    code: u16,
    #[serde(default)]
    message: String,
}

impl DailymotionExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DailymotionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for DailymotionExtractor {
    fn provider(&self) -> Provider {
        Provider::Dailymotion
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let url = format!("{}/{}?fields={}", API_BASE, id, FIELDS);
        let response = ctx.http.get(&url, &[]).await?;

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&response.body) {
            return Err(match envelope.error.code {
                404 => VideoError::NotFound,
                403 => VideoError::Forbidden,
                code => VideoError::Transport(format!(
                    "dailymotion error {}: {}",
                    code, envelope.error.message
                )),
            });
        }
        let video: DailymotionVideo = response.check_status(&url)?.json()?;

        if video.allow_embed == Some(false) {
            return Err(VideoError::Forbidden);
        }
        if video.explicit == Some(true) {
            return Err(VideoError::AgeRestricted);
        }

        Ok(Video {
            id: id.to_string(),
            url: format!("https://www.dailymotion.com/video/{}", id),
            title: video.title,
            description: video.description.unwrap_or_default(),
            thumbnail_url: video.thumbnail_720_url.unwrap_or_default(),
            duration: video.duration,
            created_at: video.created_time.and_then(|ts| DateTime::from_timestamp(ts, 0)),
            ratings: BTreeMap::new(),
            tags: video.tags,
            provider: None,
            details: Details {
                definition: String::new(),
                author: Author {
                    id: video.owner_id.unwrap_or_default(),
                    title: video.owner_name.unwrap_or_default(),
                    url: video.owner_url,
                },
                embed: Some(Embed {
                    url: Some(format!("https://www.dailymotion.com/embed/video/{}", id)),
                    html: video.embed_html,
                    stream: None,
                }),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_context, FakeHttp};

    const API: &str = "https://api.dailymotion.com/video/x2jvvep";

    const VIDEO_JSON: &str = r#"{
        "id": "x2jvvep", "title": "Highlights", "description": "Match",
        "thumbnail_720_url": "https://s1.dmcdn.net/720.jpg", "duration": 129,
        "created_time": 1438694000, "allow_embed": true, "explicit": false,
        "owner.id": "x1abc", "owner.screenname": "Sports", "owner.url": "https://www.dailymotion.com/sports",
        "tags": ["football"], "embed_html": "<iframe></iframe>"
    }"#;

    #[tokio::test]
    async fn test_fetch_maps_fields() {
        let (_, ctx) = http_context(FakeHttp::new().route(API, 200, VIDEO_JSON));
        let video = DailymotionExtractor::new().fetch("x2jvvep", &ctx).await.unwrap();

        assert_eq!(video.title, "Highlights");
        assert_eq!(video.duration, 129);
        assert_eq!(video.details.author.title, "Sports");
        assert_eq!(
            video.created_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2015-08-04T13:13:20+00:00")
        );
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let cases = [
            (404, r#"{"error": {"code": 404, "message": "This video does not exist", "type": "not_found"}}"#.to_string(), VideoError::NotFound),
            (403, r#"{"error": {"code": 403, "message": "private", "type": "access_forbidden"}}"#.to_string(), VideoError::Forbidden),
            (200, VIDEO_JSON.replace(r#""allow_embed": true"#, r#""allow_embed": false"#), VideoError::Forbidden),
            (200, VIDEO_JSON.replace(r#""explicit": false"#, r#""explicit": true"#), VideoError::AgeRestricted),
        ];

        for (status, body, expected) in cases {
            let (_, ctx) = http_context(FakeHttp::new().route(API, status, &body));
            assert_eq!(DailymotionExtractor::new().fetch("x2jvvep", &ctx).await, Err(expected));
        }
    }
}
