use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::http::get_json;
use crate::utils::{parse_timestamp, value_to_string};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const API_BASE: &str = "https://rutube.ru/api";
const UTC_OFFSET_HOURS: i32 = 3;

pub struct RutubeExtractor;

#[derive(Deserialize)]
struct RutubeVideo {
    #[serde(default)]
    title: String,
    description: Option<String>,
    thumbnail_url: Option<String>,
    #[serde(default)]
    duration: u64,
    created_ts: Option<String>,
    #[serde(default)]
    is_adult: bool,
    #[serde(default)]
    is_deleted: bool,
    #[serde(default)]
    is_hidden: bool,
    author: Option<RutubeAuthor>,
    video_url: Option<String>,
    embed_url: Option<String>,
    html: Option<String>,
}

#[derive(Deserialize)]
struct RutubeAuthor {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: String,
    site_url: Option<String>,
}

#[derive(Deserialize)]
struct PlayOptions {
    video_balancer: Option<Balancer>,
}

#[derive(Deserialize)]
struct Balancer {
    m3u8: Option<String>,
}

impl RutubeExtractor {
    pub fn new() -> Self {
        Self
    }

    async fn play_stream(&self, ctx: &ExtractorContext, id: &str) -> Result<Option<String>> {
        let url = format!("{}/play/options/{}/?format=json", API_BASE, id);
        let options: PlayOptions = get_json(ctx.http.as_ref(), &url, &[]).await?;
        Ok(options.video_balancer.and_then(|b| b.m3u8))
    }
}

impl Default for RutubeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for RutubeExtractor {
    fn provider(&self) -> Provider {
        Provider::Rutube
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let url = format!("{}/video/{}/?format=json", API_BASE, id);
        let video: RutubeVideo = get_json(ctx.http.as_ref(), &url, &[]).await?;

        if video.is_deleted || video.is_hidden {
            return Err(VideoError::NotFound);
        }
        if video.is_adult {
            return Err(VideoError::AgeRestricted);
        }

        let stream = self.play_stream(ctx, id).await?;

        let author = video
            .author
            .map(|a| Author {
                id: value_to_string(&a.id),
                title: a.name,
                url: a.site_url,
            })
            .unwrap_or_default();

        Ok(Video {
            id: id.to_string(),
            url: video
                .video_url
                .unwrap_or_else(|| format!("https://rutube.ru/video/{}/", id)),
            title: video.title,
            description: video.description.unwrap_or_default(),
            thumbnail_url: video.thumbnail_url.unwrap_or_default(),
            duration: video.duration,
            created_at: video
                .created_ts
                .as_deref()
                .and_then(|t| parse_timestamp(t, UTC_OFFSET_HOURS)),
            ratings: BTreeMap::new(),
            tags: None,
            provider: None,
            details: Details {
                definition: String::new(),
                author,
                embed: Some(Embed {
                    url: video.embed_url,
                    html: video.html,
                    stream,
                }),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_context, FakeHttp};

    const ID: &str = "2a39043b2108428a150fa27376adbea2";

    fn video_json(flags: &str) -> String {
        format!(
            r#"{{"id": "{ID}", "title": "Ролик", "description": "", "thumbnail_url": "https://pic.rutube.ru/t.jpg",
                "duration": 321, "created_ts": "2015-08-04T13:12:21", {flags}
                "author": {{"id": 7508, "name": "Канал", "site_url": "https://rutube.ru/video/person/7508/"}},
                "video_url": "https://rutube.ru/video/{ID}/", "embed_url": "https://rutube.ru/play/embed/7962382"}}"#
        )
    }

    #[tokio::test]
    async fn test_fetch_with_stream() {
        let (_, ctx) = http_context(
            FakeHttp::new()
                .route("https://rutube.ru/api/video/", 200, &video_json(""))
                .route(
                    "https://rutube.ru/api/play/options/",
                    200,
                    r#"{"video_balancer": {"m3u8": "https://bl.rutube.ru/x.m3u8"}}"#,
                ),
        );

        let video = RutubeExtractor::new().fetch(ID, &ctx).await.unwrap();
        assert_eq!(video.duration, 321);
        assert_eq!(video.details.author.id, "7508");
        assert_eq!(
            video.details.embed.unwrap().stream.as_deref(),
            Some("https://bl.rutube.ru/x.m3u8")
        );
        assert_eq!(
            video.created_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2015-08-04T10:12:21+00:00")
        );
    }

    #[tokio::test]
    async fn test_flags() {
        for (flags, expected) in [
            (r#""is_deleted": true,"#, VideoError::NotFound),
            (r#""is_hidden": true,"#, VideoError::NotFound),
            (r#""is_adult": true,"#, VideoError::AgeRestricted),
        ] {
            let (http, ctx) = http_context(
                FakeHttp::new().route("https://rutube.ru/api/video/", 200, &video_json(flags)),
            );
            assert_eq!(RutubeExtractor::new().fetch(ID, &ctx).await, Err(expected));
            assert_eq!(http.hits("https://rutube.ru/api/play/"), 0);
        }
    }

    #[tokio::test]
    async fn test_geo_blocked_stream_is_forbidden() {
        let (_, ctx) = http_context(
            FakeHttp::new()
                .route("https://rutube.ru/api/video/", 200, &video_json(""))
                .route("https://rutube.ru/api/play/options/", 403, "{}"),
        );
        assert_eq!(RutubeExtractor::new().fetch(ID, &ctx).await, Err(VideoError::Forbidden));
    }
}
