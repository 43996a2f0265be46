use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::probe::MediaMeta;
use crate::utils::parse_timestamp;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use urlencoding::encode;

const GRAPH_BASE: &str = "https://graph.facebook.com/v2.5";
const FIELDS: &str = "source,description,picture,format,from,published,created_time";

/// Thumbnails at or below this width are only used as a last resort.
const THUMBNAIL_MIN_WIDTH: u32 = 400;

pub struct FacebookExtractor {
    access_token: String,
}

#[derive(Deserialize)]
struct GraphVideo {
    source: String,
    description: Option<String>,
    picture: Option<String>,
    #[serde(default)]
    format: Vec<GraphFormat>,
    from: Option<GraphUser>,
    published: Option<bool>,
    created_time: Option<String>,
}

#[derive(Deserialize)]
struct GraphFormat {
    #[serde(default)]
    width: u32,
    picture: String,
    embed_html: Option<String>,
}

#[derive(Deserialize)]
struct GraphUser {
    id: String,
    #[serde(default)]
    name: String,
}

impl FacebookExtractor {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
        }
    }

    async fn request_node(&self, ctx: &ExtractorContext, id: &str) -> Result<GraphVideo> {
        let url = format!(
            "{}/{}?fields={}&access_token={}",
            GRAPH_BASE,
            id,
            encode(FIELDS),
            encode(&self.access_token)
        );
        let response = ctx.http.get(&url, &[]).await?;

        // Graph answers unknown or inaccessible ids with an error object.
        let body: Value = response.json().map_err(|_| VideoError::InvalidUrl)?;
        if !response.is_success() || body.get("error").is_some() {
            return Err(VideoError::InvalidUrl);
        }

        Ok(serde_json::from_value(body)?)
    }

    async fn load_meta(&self, ctx: &ExtractorContext, id: &str, source: &str) -> Result<MediaMeta> {
        let key = Provider::Facebook.sub_cache_key("meta", id);
        ctx.cache
            .with_cache(&key, || ctx.probe.probe(source))
            .await
    }
}

/// Widest frame above the minimum width, else the last frame, else `picture`.
fn pick_thumbnail(formats: &[GraphFormat], picture: Option<&str>) -> String {
    formats
        .iter()
        .filter(|f| f.width > THUMBNAIL_MIN_WIDTH)
        .max_by_key(|f| f.width)
        .or(formats.last())
        .map(|f| f.picture.as_str())
        .or(picture)
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl Extractor for FacebookExtractor {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let node = self.request_node(ctx, id).await?;

        if node.published == Some(false) {
            return Err(VideoError::Forbidden);
        }

        let thumbnail_url = pick_thumbnail(&node.format, node.picture.as_deref());
        let meta = self.load_meta(ctx, id, &node.source).await?;

        let description = node.description.unwrap_or_default();
        let title = description.lines().next().unwrap_or_default().to_string();
        let author = node
            .from
            .map(|from| Author {
                url: Some(format!("https://www.facebook.com/{}", from.id)),
                id: from.id,
                title: from.name,
            })
            .unwrap_or_default();

        Ok(Video {
            id: id.to_string(),
            url: format!("https://www.facebook.com/video/embed?video_id={}", id),
            title,
            description,
            thumbnail_url,
            duration: meta.duration,
            created_at: node.created_time.as_deref().and_then(|t| parse_timestamp(t, 0)),
            ratings: BTreeMap::new(),
            tags: None,
            provider: None,
            details: Details {
                definition: String::new(),
                author,
                embed: Some(Embed {
                    url: Some(format!("https://www.facebook.com/video/embed?video_id={}", id)),
                    html: node.format.last().and_then(|f| f.embed_html.clone()),
                    stream: Some(node.source),
                }),
            },
        })
    }
}
