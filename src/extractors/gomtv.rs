//! GomTV: page scrape, a playback key exchange, then the player info call.

use crate::core::duration::parse_duration;
use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::http::{get_json, get_text, Document};
use crate::utils::parse_timestamp;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use urlencoding::encode;

const SITE: &str = "https://www.gomtv.com";
const UTC_OFFSET_HOURS: i32 = 9;

pub struct GomTvExtractor;

struct GomPage {
    title: String,
    description: String,
    thumbnail_url: String,
    author: Author,
}

#[derive(Deserialize)]
struct KeyResponse {
    result: String,
    key: Option<String>,
}

#[derive(Deserialize)]
struct PlayerInfo {
    #[serde(default)]
    playtime: String,
    regdate: Option<String>,
    #[serde(default)]
    quality: String,
    stream: Option<String>,
}

fn scrape_page(html: &str) -> Result<GomPage> {
    let doc = Document::parse(html);

    let author = match doc.select_all("div.uploader a")?.first() {
        Some(link) => {
            let href = link.attr("href").unwrap_or_default();
            Author {
                id: href.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default().to_string(),
                title: link.text(),
                url: (!href.is_empty()).then(|| format!("{}{}", SITE, href)),
            }
        }
        None => Author {
            title: doc.meta("author")?.unwrap_or_default(),
            ..Author::default()
        },
    };

    Ok(GomPage {
        title: doc.require_meta("og:title")?,
        description: doc.meta("og:description")?.unwrap_or_default(),
        thumbnail_url: doc.meta("og:image")?.unwrap_or_default(),
        author,
    })
}

impl GomTvExtractor {
    pub fn new() -> Self {
        Self
    }

    async fn exchange_key(&self, ctx: &ExtractorContext, id: &str) -> Result<String> {
        let url = format!("{}/player/key.gom?dispid={}", SITE, encode(id));
        let response: KeyResponse = get_json(ctx.http.as_ref(), &url, &[]).await?;

        match response.result.as_str() {
            "OK" => response
                .key
                .ok_or_else(|| VideoError::malformed("gomtv key response has no key")),
            "NOT_FOUND" => Err(VideoError::NotFound),
            "FORBIDDEN" => Err(VideoError::Forbidden),
            "ADULT" => Err(VideoError::AgeRestricted),
            other => Err(VideoError::Transport(format!("gomtv key exchange: {}", other))),
        }
    }
}

impl Default for GomTvExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for GomTvExtractor {
    fn provider(&self) -> Provider {
        Provider::Gomtv
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let page_url = format!("{}/{}", SITE, id);
        let html = get_text(ctx.http.as_ref(), &page_url).await?;
        let page = scrape_page(&html)?;

        let key = self.exchange_key(ctx, id).await?;

        let info_url = format!("{}/player/info.gom?dispid={}&key={}", SITE, encode(id), encode(&key));
        let info: PlayerInfo = get_json(ctx.http.as_ref(), &info_url, &[]).await?;

        Ok(Video {
            id: id.to_string(),
            url: page_url,
            title: page.title,
            description: page.description,
            thumbnail_url: page.thumbnail_url,
            duration: parse_duration(&info.playtime),
            created_at: info
                .regdate
                .as_deref()
                .and_then(|t| parse_timestamp(t, UTC_OFFSET_HOURS)),
            ratings: BTreeMap::new(),
            tags: None,
            provider: None,
            details: Details {
                definition: info.quality,
                author: page.author,
                embed: Some(Embed {
                    url: Some(format!("{}/player/embed.gom?dispid={}", SITE, id)),
                    html: None,
                    stream: info.stream,
                }),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_context, FakeHttp};

    const PAGE: &str = r#"<html><head>
        <meta property="og:title" content="곰TV 영상">
        <meta property="og:image" content="http://thumb.gomtv.com/1.jpg">
        <meta name="author" content="meta author">
        </head><body><div class="uploader"><a href="/channel/9876">업로더</a></div></body></html>"#;

    fn routes(key_body: &str) -> FakeHttp {
        FakeHttp::new()
            .route("https://www.gomtv.com/14692214", 200, PAGE)
            .route("https://www.gomtv.com/player/key.gom", 200, key_body)
            .route(
                "https://www.gomtv.com/player/info.gom?dispid=14692214&key=abc",
                200,
                r#"{"playtime": "00:04:13", "regdate": "2015-08-04", "quality": "HD", "stream": "http://cdn.gomtv.com/v.mp4"}"#,
            )
    }

    #[tokio::test]
    async fn test_fetch() {
        let (http, ctx) = http_context(routes(r#"{"result": "OK", "key": "abc"}"#));
        let video = GomTvExtractor::new().fetch("14692214", &ctx).await.unwrap();

        assert_eq!(video.title, "곰TV 영상");
        assert_eq!(video.description, "");
        assert_eq!(video.duration, 253);
        assert_eq!(video.details.definition, "HD");
        assert_eq!(video.details.author.id, "9876");
        assert_eq!(video.details.author.url.as_deref(), Some("https://www.gomtv.com/channel/9876"));
        assert_eq!(http.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_key_exchange_failure_aborts_chain() {
        let (http, ctx) = http_context(routes(r#"{"result": "NOT_FOUND"}"#));
        assert_eq!(GomTvExtractor::new().fetch("14692214", &ctx).await, Err(VideoError::NotFound));
        assert_eq!(http.hits("https://www.gomtv.com/player/info.gom"), 0);
    }

    #[test]
    fn test_author_falls_back_to_meta() {
        let html = PAGE.replace(r#"<div class="uploader"><a href="/channel/9876">업로더</a></div>"#, "");
        let page = scrape_page(&html).unwrap();
        assert_eq!(page.author.title, "meta author");
        assert_eq!(page.author.id, "");
    }
}
