use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::utils::{parse_timestamp, value_to_string};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use urlencoding::encode;

const API_URL: &str = "https://api.tudou.com/v6/video/info";
const UTC_OFFSET_HOURS: i32 = 8;

pub struct TudouExtractor {
    app_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InfoResponse {
    multi_result: Option<MultiResult>,
    #[serde(rename = "error_code")]
    error_code: Option<i64>,
    #[serde(rename = "error_info")]
    error_info: Option<String>,
}

#[derive(Deserialize)]
struct MultiResult {
    #[serde(default)]
    results: Vec<TudouItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TudouItem {
    #[serde(default)]
    title: String,
    description: Option<String>,
    pic_url: Option<String>,
    big_pic_url: Option<String>,
    /// Milliseconds.
    #[serde(default)]
    total_time: u64,
    pub_date: Option<String>,
    #[serde(default)]
    owner_id: Value,
    owner_nickname: Option<String>,
    #[serde(rename = "ownerURL")]
    owner_url: Option<String>,
    item_url: Option<String>,
    tags: Option<String>,
    outer_player_url: Option<String>,
}

impl TudouExtractor {
    pub fn new(app_key: &str) -> Self {
        Self {
            app_key: app_key.to_string(),
        }
    }
}

#[async_trait]
impl Extractor for TudouExtractor {
    fn provider(&self) -> Provider {
        Provider::Tudou
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let url = format!(
            "{}?app_key={}&format=json&itemCodes={}",
            API_URL,
            encode(&self.app_key),
            encode(id)
        );
        let response: InfoResponse = ctx.http.get(&url, &[]).await?.check_status(&url)?.json()?;

        if let Some(code) = response.error_code {
            return Err(VideoError::Transport(format!(
                "tudou error {}: {}",
                code,
                response.error_info.unwrap_or_default()
            )));
        }

        let item = response
            .multi_result
            .and_then(|r| r.results.into_iter().next())
            .ok_or(VideoError::NotFound)?;

        let tags = item.tags.map(|tags| {
            tags.split(',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        });

        Ok(Video {
            id: id.to_string(),
            url: item
                .item_url
                .unwrap_or_else(|| format!("https://www.tudou.com/programs/view/{}/", id)),
            title: item.title,
            description: item.description.unwrap_or_default(),
            thumbnail_url: item.big_pic_url.or(item.pic_url).unwrap_or_default(),
            duration: millis_to_seconds(item.total_time),
            created_at: item
                .pub_date
                .as_deref()
                .and_then(|t| parse_timestamp(t, UTC_OFFSET_HOURS)),
            ratings: BTreeMap::new(),
            tags,
            provider: None,
            details: Details {
                definition: String::new(),
                author: Author {
                    id: value_to_string(&item.owner_id),
                    title: item.owner_nickname.unwrap_or_default(),
                    url: item.owner_url,
                },
                embed: item.outer_player_url.map(|player| Embed {
                    url: Some(player),
                    html: None,
                    stream: None,
                }),
            },
        })
    }
}

/// Rounds to the nearest second without overflowing near `u64::MAX`.
fn millis_to_seconds(millis: u64) -> u64 {
    millis / 1000 + u64::from(millis % 1000 >= 500)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{http_context, FakeHttp};

    const API: &str = "https://api.tudou.com/v6/video/info";

    #[tokio::test]
    async fn test_fetch_maps_fields() {
        let body = r#"{"multiResult": {"results": [{
            "itemCode": "uKg4c5O0YyQ", "title": "土豆", "description": "d",
            "picUrl": "http://i.tdimg.com/s.jpg", "bigPicUrl": "http://i.tdimg.com/b.jpg",
            "totalTime": 253600, "pubDate": "2015-08-04 13:12:21",
            "ownerId": 1234, "ownerNickname": "owner", "ownerURL": "http://www.tudou.com/home/owner",
            "itemUrl": "http://www.tudou.com/programs/view/uKg4c5O0YyQ/", "tags": "a,b",
            "outerPlayerUrl": "http://www.tudou.com/v/uKg4c5O0YyQ/v.swf"
        }]}}"#;
        let (_, ctx) = http_context(FakeHttp::new().route(API, 200, body));

        let video = TudouExtractor::new("key").fetch("uKg4c5O0YyQ", &ctx).await.unwrap();
        assert_eq!(video.duration, 254);
        assert_eq!(video.thumbnail_url, "http://i.tdimg.com/b.jpg");
        assert_eq!(video.details.author.id, "1234");
        assert_eq!(video.tags, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_millis_to_seconds() {
        assert_eq!(millis_to_seconds(253_600), 254);
        assert_eq!(millis_to_seconds(499), 0);
        assert_eq!(millis_to_seconds(u64::MAX), u64::MAX / 1000 + 1);
    }

    #[tokio::test]
    async fn test_huge_total_time() {
        let body = r#"{"multiResult": {"results": [{"itemCode": "x", "title": "t", "totalTime": 18446744073709551615}]}}"#;
        let (_, ctx) = http_context(FakeHttp::new().route(API, 200, body));
        let video = TudouExtractor::new("key").fetch("x", &ctx).await.unwrap();
        assert_eq!(video.duration, u64::MAX / 1000 + 1);
    }

    #[tokio::test]
    async fn test_empty_results_is_not_found() {
        let (_, ctx) = http_context(FakeHttp::new().route(API, 200, r#"{"multiResult": {"results": []}}"#));
        assert_eq!(TudouExtractor::new("key").fetch("x", &ctx).await, Err(VideoError::NotFound));

        let (_, ctx) = http_context(
            FakeHttp::new().route(API, 200, r#"{"error_code": 40001, "error_info": "invalid app_key"}"#),
        );
        assert!(matches!(
            TudouExtractor::new("").fetch("x", &ctx).await,
            Err(VideoError::Transport(_))
        ));
    }
}
