use crate::core::duration::seconds_from_value;
use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::utils::{parse_timestamp, value_to_string};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use urlencoding::encode;

const API_URL: &str = "https://openapi.youku.com/v2/videos/show_basic.json";

/// Youku publishes times in China Standard Time.
const UTC_OFFSET_HOURS: i32 = 8;

pub struct YoukuExtractor {
    client_id: String,
}

#[derive(Deserialize)]
struct YoukuVideo {
    #[serde(default)]
    title: String,
    link: Option<String>,
    #[serde(default)]
    thumbnail: String,
    #[serde(rename = "bigThumbnail")]
    big_thumbnail: Option<String>,
    #[serde(default)]
    duration: Value,
    published: Option<String>,
    description: Option<String>,
    public_type: Option<String>,
    tags: Option<String>,
    user: Option<YoukuUser>,
}

#[derive(Deserialize)]
struct YoukuUser {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: String,
    link: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: YoukuError,
}

#[derive(Deserialize)]
struct YoukuError {
    #[serde(default)]
    code: i64,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    description: String,
}

impl YoukuError {
    fn into_video_error(self) -> VideoError {
        let description = self.description.to_lowercase();
        if self.kind.contains("NotFound") || description.contains("not exist") {
            VideoError::NotFound
        } else {
            VideoError::Transport(format!(
                "youku error {} ({}): {}",
                self.code, self.kind, self.description
            ))
        }
    }
}

impl YoukuExtractor {
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
        }
    }
}

#[async_trait]
impl Extractor for YoukuExtractor {
    fn provider(&self) -> Provider {
        Provider::Youku
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let url = format!(
            "{}?client_id={}&video_id={}",
            API_URL,
            encode(&self.client_id),
            encode(id)
        );
        let response = ctx.http.get(&url, &[]).await?;

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&response.body) {
            return Err(envelope.error.into_video_error());
        }
        let video: YoukuVideo = response.check_status(&url)?.json()?;

        if video.public_type.as_deref().is_some_and(|t| t != "all") {
            return Err(VideoError::Forbidden);
        }

        let author = video
            .user
            .map(|user| Author {
                id: value_to_string(&user.id),
                title: user.name,
                url: user.link,
            })
            .unwrap_or_default();

        let tags = video.tags.map(|tags| {
            tags.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        });

        Ok(Video {
            id: id.to_string(),
            url: video
                .link
                .unwrap_or_else(|| format!("https://v.youku.com/v_show/id_{}.html", id)),
            title: video.title,
            description: video.description.unwrap_or_default(),
            thumbnail_url: video.big_thumbnail.unwrap_or(video.thumbnail),
            duration: seconds_from_value(&video.duration),
            created_at: video
                .published
                .as_deref()
                .and_then(|t| parse_timestamp(t, UTC_OFFSET_HOURS)),
            ratings: BTreeMap::new(),
            tags,
            provider: None,
            details: Details {
                definition: String::new(),
                author,
                embed: Some(Embed {
                    url: Some(format!("https://player.youku.com/embed/{}", id)),
                    html: None,
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

    const API: &str = "https://openapi.youku.com/v2/videos/show_basic.json";

    const VIDEO_JSON: &str = r#"{
        "id": "XMTMwMDgxNTY0NA==", "title": "片段", "link": "http://v.youku.com/v_show/id_XMTMwMDgxNTY0NA==.html",
        "thumbnail": "http://r1.ykimg.com/small.jpg", "bigThumbnail": "http://r1.ykimg.com/big.jpg",
        "duration": "254.35", "published": "2015-08-04 13:12:21", "description": "desc",
        "public_type": "all", "tags": "music, live",
        "user": {"id": 58921428, "name": "uploader", "link": "http://i.youku.com/u/UMjM1Njg1NzEy"}
    }"#;

    #[tokio::test]
    async fn test_fetch_maps_fields() {
        let (_, ctx) = http_context(FakeHttp::new().route(API, 200, VIDEO_JSON));
        let video = YoukuExtractor::new("cid").fetch("XMTMwMDgxNTY0NA==", &ctx).await.unwrap();

        assert_eq!(video.title, "片段");
        assert_eq!(video.duration, 254);
        assert_eq!(video.thumbnail_url, "http://r1.ykimg.com/big.jpg");
        assert_eq!(video.details.author.id, "58921428");
        assert_eq!(video.tags, Some(vec!["music".to_string(), "live".to_string()]));
        assert_eq!(
            video.created_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2015-08-04T05:12:21+00:00")
        );
    }

    #[tokio::test]
    async fn test_error_mapping() {
        let missing = r#"{"error": {"code": 120020101, "type": "NotFoundError", "description": "Video not exist"}}"#;
        let quota = r#"{"error": {"code": 1010, "type": "SystemError", "description": "Service busy"}}"#;

        let (_, ctx) = http_context(FakeHttp::new().route(API, 400, missing));
        assert_eq!(YoukuExtractor::new("cid").fetch("x", &ctx).await, Err(VideoError::NotFound));

        let (_, ctx) = http_context(FakeHttp::new().route(API, 400, quota));
        assert!(matches!(
            YoukuExtractor::new("cid").fetch("x", &ctx).await,
            Err(VideoError::Transport(_))
        ));

        let private = VIDEO_JSON.replace(r#""public_type": "all""#, r#""public_type": "password""#);
        let (_, ctx) = http_context(FakeHttp::new().route(API, 200, &private));
        assert_eq!(YoukuExtractor::new("cid").fetch("x", &ctx).await, Err(VideoError::Forbidden));
    }
}
