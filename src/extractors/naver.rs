//! NaverTVCast: clip page scrape, then the `inKey` exchange, then the
//! play-info endpoint for duration and encodings.

use crate::core::duration::seconds_from_value;
use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::http::{get_json, get_text, Document};
use crate::utils::parse_timestamp;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use urlencoding::encode;

const PAGE_BASE: &str = "https://tv.naver.com/v";
const PLAY_BASE: &str = "https://apis.naver.com/rmcnmv/rmcnmv/vod/play/v2.0";
const UTC_OFFSET_HOURS: i32 = 9;

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?videoId["']?\s*[:=]\s*["']([0-9A-Fa-f]+)["']"#).expect("valid videoId pattern")
});

pub struct NaverTvcastExtractor;

#[derive(Debug, PartialEq)]
struct NaverPage {
    title: String,
    description: String,
    thumbnail_url: String,
    author: Author,
    created_at: Option<DateTime<Utc>>,
    video_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyResponse {
    in_key: String,
}

#[derive(Deserialize)]
struct PlayInfo {
    videos: PlayVideos,
}

#[derive(Deserialize)]
struct PlayVideos {
    #[serde(default)]
    list: Vec<Encoding>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Encoding {
    #[serde(default)]
    duration: Value,
    encoding_option: EncodingOption,
    source: Option<String>,
}

#[derive(Deserialize)]
struct EncodingOption {
    #[serde(default)]
    name: String,
    #[serde(default)]
    height: u32,
}

fn scrape_page(html: &str) -> Result<NaverPage> {
    let doc = Document::parse(html);

    let title = doc.require_meta("og:title")?;
    let description = doc.meta("og:description")?.unwrap_or_default();
    let thumbnail_url = doc.meta("og:image")?.unwrap_or_default();

    let channel = doc.select_all("div.ch_tit a")?;
    let author = channel
        .first()
        .map(|link| {
            let href = link.attr("href").unwrap_or_default();
            Author {
                id: href.trim_matches('/').to_string(),
                title: link.text(),
                url: (!href.is_empty()).then(|| format!("https://tv.naver.com{}", href)),
            }
        })
        .unwrap_or_default();

    let created_at = doc
        .first_text("span.date")?
        .and_then(|date| parse_timestamp(&date, UTC_OFFSET_HOURS));

    let video_id = VIDEO_ID
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| VideoError::malformed("naver page has no videoId"))?;

    Ok(NaverPage {
        title,
        description,
        thumbnail_url,
        author,
        created_at,
        video_id,
    })
}

impl NaverTvcastExtractor {
    pub fn new() -> Self {
        Self
    }

    async fn exchange_key(&self, ctx: &ExtractorContext, id: &str, video_id: &str) -> Result<String> {
        let url = format!("https://tv.naver.com/api/json/v/{}/inkey?videoId={}", id, encode(video_id));
        let key: KeyResponse = get_json(ctx.http.as_ref(), &url, &[]).await?;
        Ok(key.in_key)
    }
}

impl Default for NaverTvcastExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for NaverTvcastExtractor {
    fn provider(&self) -> Provider {
        Provider::NaverTvcast
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let page_url = format!("{}/{}", PAGE_BASE, id);
        let html = get_text(ctx.http.as_ref(), &page_url).await?;
        let page = scrape_page(&html)?;

        let key = self.exchange_key(ctx, id, &page.video_id).await?;

        let play_url = format!("{}/{}?key={}", PLAY_BASE, page.video_id, encode(&key));
        let play: PlayInfo = get_json(ctx.http.as_ref(), &play_url, &[]).await?;

        let best = play
            .videos
            .list
            .iter()
            .max_by_key(|e| e.encoding_option.height)
            .ok_or_else(|| VideoError::malformed("naver play info has no encodings"))?;

        Ok(Video {
            id: id.to_string(),
            url: page_url,
            title: page.title,
            description: page.description,
            thumbnail_url: page.thumbnail_url,
            duration: seconds_from_value(&best.duration),
            created_at: page.created_at,
            ratings: BTreeMap::new(),
            tags: None,
            provider: None,
            details: Details {
                definition: best.encoding_option.name.clone(),
                author: page.author,
                embed: Some(Embed {
                    url: Some(format!("https://tv.naver.com/embed/{}", id)),
                    html: None,
                    stream: best.source.clone(),
                }),
            },
        })
    }
}
