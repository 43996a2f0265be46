use crate::core::duration::parse_duration;
use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::http::HttpResponse;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use urlencoding::encode;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const VIDEO_PARTS: &str = "snippet,contentDetails,status,player";
const VIDEO_FIELDS: &str = "items(snippet(title,description,thumbnails,channelId,publishedAt,tags),contentDetails(duration,definition,contentRating),status(embeddable),player(embedHtml))";
const CHANNEL_FIELDS: &str = "items(snippet(title))";

/// YouTube marks age-gated videos with this `contentRating.ytRating` value.
const AGE_RESTRICTED: &str = "ytAgeRestricted";

pub struct YouTubeExtractor {
    key: String,
}

#[derive(Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    snippet: Snippet,
    content_details: ContentDetails,
    #[serde(default)]
    status: Status,
    player: Option<Player>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
    channel_id: String,
    published_at: Option<DateTime<Utc>>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
    #[serde(default)]
    duration: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    content_rating: BTreeMap<String, Value>,
}

#[derive(Deserialize, Default)]
struct Status {
    embeddable: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Player {
    embed_html: Option<String>,
}

#[derive(Deserialize)]
struct ChannelItem {
    snippet: ChannelSnippet,
}

#[derive(Deserialize)]
struct ChannelSnippet {
    title: String,
}

impl YouTubeExtractor {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }

    fn api_url(&self, resource: &str, id: &str, parts: &str, fields: &str) -> String {
        format!(
            "{}/{}?id={}&part={}&fields={}&key={}",
            API_BASE,
            resource,
            encode(id),
            encode(parts),
            encode(fields),
            encode(&self.key)
        )
    }

    /// API failures (bad key, quota) are not facts about the video, so they
    /// stay untyped and are never cached.
    async fn request_list<T: DeserializeOwned>(
        &self,
        ctx: &ExtractorContext,
        url: &str,
    ) -> Result<Vec<T>> {
        let response: HttpResponse = ctx.http.get(url, &[]).await?;
        if !response.is_success() {
            return Err(VideoError::Transport(format!(
                "youtube api returned status {}",
                response.status
            )));
        }

        Ok(response.json::<ItemList<T>>()?.items)
    }

    async fn request_channel(&self, ctx: &ExtractorContext, channel_id: &str) -> Result<Author> {
        let url = self.api_url("channels", channel_id, "snippet", CHANNEL_FIELDS);
        let channel = self
            .request_list::<ChannelItem>(ctx, &url)
            .await?
            .into_iter()
            .next()
            .ok_or(VideoError::ChannelNotFound)?;

        Ok(Author {
            id: channel_id.to_string(),
            title: channel.snippet.title,
            url: Some(format!("https://www.youtube.com/channel/{}", channel_id)),
        })
    }

    async fn load_channel(&self, ctx: &ExtractorContext, channel_id: &str) -> Result<Author> {
        let key = Provider::Youtube.sub_cache_key("channel", channel_id);
        ctx.cache
            .with_cache(&key, || self.request_channel(ctx, channel_id))
            .await
    }
}

fn pick_thumbnail(thumbnails: &HashMap<String, Thumbnail>) -> String {
    ["medium", "high", "default"]
        .iter()
        .find_map(|size| thumbnails.get(*size))
        .map(|t| t.url.clone())
        .unwrap_or_default()
}

#[async_trait]
impl Extractor for YouTubeExtractor {
    fn provider(&self) -> Provider {
        Provider::Youtube
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let url = self.api_url("videos", id, VIDEO_PARTS, VIDEO_FIELDS);
        let item = self
            .request_list::<VideoItem>(ctx, &url)
            .await?
            .into_iter()
            .next()
            .ok_or(VideoError::NotFound)?;

        if item.status.embeddable == Some(false) {
            return Err(VideoError::Forbidden);
        }

        let details = item.content_details;
        let age_rating = details.content_rating.get("ytRating").and_then(Value::as_str);
        if age_rating == Some(AGE_RESTRICTED) {
            return Err(VideoError::AgeRestricted);
        }

        let snippet = item.snippet;
        let author = self.load_channel(ctx, &snippet.channel_id).await?;

        Ok(Video {
            id: id.to_string(),
            url: format!("https://www.youtube.com/watch?v={}", id),
            title: snippet.title,
            description: snippet.description,
            thumbnail_url: pick_thumbnail(&snippet.thumbnails),
            duration: parse_duration(&details.duration),
            created_at: snippet.published_at,
            ratings: details.content_rating,
            tags: snippet.tags,
            provider: None,
            details: Details {
                definition: details.definition,
                author,
                embed: item.player.map(|player| Embed {
                    url: Some(format!("https://www.youtube.com/embed/{}", id)),
                    html: player.embed_html,
                    stream: None,
                }),
            },
        })
    }
}
