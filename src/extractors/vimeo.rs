use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const API_BASE: &str = "https://api.vimeo.com/videos";

pub struct VimeoExtractor {
    access_token: String,
}

#[derive(Deserialize)]
struct VimeoVideo {
    #[serde(default)]
    name: String,
    description: Option<String>,
    #[serde(default)]
    duration: u64,
    height: Option<u32>,
    pictures: Option<Pictures>,
    #[serde(default)]
    content_rating: Vec<String>,
    user: VimeoUser,
    created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    tags: Vec<Tag>,
    embed: Option<VimeoEmbed>,
}

#[derive(Deserialize)]
struct Pictures {
    #[serde(default)]
    sizes: Vec<Picture>,
}

#[derive(Deserialize)]
struct Picture {
    link: String,
}

#[derive(Deserialize)]
struct VimeoUser {
    uri: String,
    #[serde(default)]
    name: String,
    link: Option<String>,
}

#[derive(Deserialize)]
struct Tag {
    name: String,
}

#[derive(Deserialize)]
struct VimeoEmbed {
    html: Option<String>,
}

impl VimeoExtractor {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
        }
    }
}

#[async_trait]
impl Extractor for VimeoExtractor {
    fn provider(&self) -> Provider {
        Provider::Vimeo
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let url = format!("{}/{}", API_BASE, id);
        let auth = format!("Bearer {}", self.access_token);
        let response = ctx.http.get(&url, &[("Authorization", auth.as_str())]).await?;

        match response.status {
            404 => return Err(VideoError::NotFound),
            403 => return Err(VideoError::Forbidden),
            _ => {}
        }

        let body: Value = response.json()?;
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(VideoError::Transport(format!("vimeo: {}", message)));
        }
        response.check_status(&url)?;
        let video: VimeoVideo = serde_json::from_value(body)?;

        let sizes = video.pictures.map(|p| p.sizes).unwrap_or_default();
        let thumbnail_url = sizes
            .get(2)
            .or(sizes.last())
            .map(|p| p.link.clone())
            .unwrap_or_default();

        let mut ratings = BTreeMap::new();
        if !video.content_rating.is_empty() {
            ratings.insert("content_rating".to_string(), Value::from(video.content_rating));
        }

        let definition = match video.height {
            Some(h) if h >= 720 => "hd",
            Some(_) => "sd",
            None => "",
        };

        Ok(Video {
            id: id.to_string(),
            url: format!("https://vimeo.com/{}", id),
            title: video.name,
            description: video.description.unwrap_or_default(),
            thumbnail_url,
            duration: video.duration,
            created_at: video.created_time,
            ratings,
            tags: Some(video.tags.into_iter().map(|t| t.name).collect()),
            provider: None,
            details: Details {
                definition: definition.to_string(),
                author: Author {
                    id: video.user.uri.trim_start_matches("/users/").to_string(),
                    title: video.user.name,
                    url: video.user.link,
                },
                embed: Some(Embed {
                    url: Some(format!("https://player.vimeo.com/video/{}", id)),
                    html: video.embed.and_then(|e| e.html),
                    stream: None,
                }),
            },
        })
    }
}
