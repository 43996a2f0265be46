//! DaumTVPot: the clip page carries the metadata and the player `vid`, the
//! videofarm endpoint carries running time and encoding profile.

use crate::core::duration::parse_duration;
use crate::core::{Author, Details, Embed, Extractor, ExtractorContext, Provider, Result, Video, VideoError};
use crate::http::{get_json, get_text, Document};
use crate::utils::parse_timestamp;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;
use urlencoding::encode;

const PAGE_BASE: &str = "https://tvpot.daum.net/clip/ClipView.do?clipid=";
const MOVIE_DATA: &str = "https://videofarm.daum.net/controller/api/open/v1_2/MovieData.json";
const UTC_OFFSET_HOURS: i32 = 9;

pub struct DaumTvpotExtractor;

struct DaumPage {
    title: String,
    description: String,
    thumbnail_url: String,
    author: Author,
    vid: String,
}

#[derive(Deserialize)]
struct MovieData {
    result: String,
    data: Option<MovieInfo>,
}

#[derive(Deserialize)]
struct MovieInfo {
    #[serde(default)]
    duration: String,
    regdate: Option<String>,
    #[serde(default)]
    profile: String,
    playurl: Option<String>,
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned());
    value
}

fn scrape_page(html: &str) -> Result<DaumPage> {
    let doc = Document::parse(html);

    let title = doc.require_meta("og:title")?;
    let description = doc.meta("og:description")?.unwrap_or_default();
    let thumbnail_url = doc.meta("og:image")?.unwrap_or_default();

    let vid = doc
        .meta("og:video")?
        .and_then(|player| query_param(&player, "vid"))
        .ok_or_else(|| VideoError::malformed("daum page has no player vid"))?;

    let author = match doc.select_all("a.link_channel")?.first() {
        Some(link) => {
            let href = link.attr("href").unwrap_or_default();
            Author {
                id: query_param(href, "ownerid").unwrap_or_default(),
                title: link.text(),
                url: (!href.is_empty()).then(|| href.to_string()),
            }
        }
        None => Author::default(),
    };

    Ok(DaumPage {
        title,
        description,
        thumbnail_url,
        author,
        vid,
    })
}

impl DaumTvpotExtractor {
    pub fn new() -> Self {
        Self
    }

    async fn movie_data(&self, ctx: &ExtractorContext, vid: &str) -> Result<MovieInfo> {
        let url = format!("{}?vid={}&dte_type=WEB", MOVIE_DATA, encode(vid));
        let movie: MovieData = get_json(ctx.http.as_ref(), &url, &[]).await?;

        match movie.result.as_str() {
            "SUCCESS" => movie
                .data
                .ok_or_else(|| VideoError::malformed("daum movie data is empty")),
            "NOT_FOUND" => Err(VideoError::NotFound),
            "NOT_PERMITTED" | "PRIVATE" => Err(VideoError::Forbidden),
            "ADULT" => Err(VideoError::AgeRestricted),
            other => Err(VideoError::Transport(format!("daum movie data: {}", other))),
        }
    }
}

impl Default for DaumTvpotExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for DaumTvpotExtractor {
    fn provider(&self) -> Provider {
        Provider::DaumTvpot
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let page_url = format!("{}{}", PAGE_BASE, id);
        let html = get_text(ctx.http.as_ref(), &page_url).await?;
        let page = scrape_page(&html)?;

        let movie = self.movie_data(ctx, &page.vid).await?;

        Ok(Video {
            id: id.to_string(),
            url: page_url,
            title: page.title,
            description: page.description,
            thumbnail_url: page.thumbnail_url,
            duration: parse_duration(&movie.duration),
            created_at: movie
                .regdate
                .as_deref()
                .and_then(|t| parse_timestamp(t, UTC_OFFSET_HOURS)),
            ratings: BTreeMap::new(),
            tags: None,
            provider: None,
            details: Details {
                definition: movie.profile,
                author: page.author,
                embed: Some(Embed {
                    url: Some(format!(
                        "https://videofarm.daum.net/controller/video/viewer/Video.html?vid={}&play_loc=undefined",
                        page.vid
                    )),
                    html: None,
                    stream: movie.playurl,
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
        <meta property="og:title" content="다음 클립">
        <meta property="og:description" content="설명">
        <meta property="og:image" content="http://i1.daumcdn.net/thumb.jpg">
        <meta property="og:video" content="http://videofarm.daum.net/controller/player/VodPlayer.swf?vid=v9f1bYxS0Ny0S0SyY0y3qy0&amp;autoplay=0">
        </head><body>
        <a class="link_channel" href="http://tvpot.daum.net/mypot/Top.do?ownerid=45x1okb1If50">채널</a>
        </body></html>"#;

    #[test]
    fn test_scrape_page() {
        let page = scrape_page(PAGE).unwrap();
        assert_eq!(page.vid, "v9f1bYxS0Ny0S0SyY0y3qy0");
        assert_eq!(page.author.id, "45x1okb1If50");
        assert_eq!(page.author.title, "채널");
    }

    #[tokio::test]
    async fn test_fetch() {
        let (_, ctx) = http_context(
            FakeHttp::new()
                .route(PAGE_BASE, 200, PAGE)
                .route(
                    MOVIE_DATA,
                    200,
                    r#"{"result": "SUCCESS", "data": {"duration": "00:03:02", "regdate": "2015-08-04 13:12:21", "profile": "HIGH", "playurl": "http://cdn/clip.mp4"}}"#,
                ),
        );

        let video = DaumTvpotExtractor::new().fetch("72525651", &ctx).await.unwrap();
        assert_eq!(video.duration, 182);
        assert_eq!(video.details.definition, "HIGH");
        assert_eq!(video.url, "https://tvpot.daum.net/clip/ClipView.do?clipid=72525651");
        assert_eq!(
            video.created_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2015-08-04T04:12:21+00:00")
        );
    }

    #[tokio::test]
    async fn test_movie_data_results() {
        for (result, expected) in [
            ("NOT_FOUND", VideoError::NotFound),
            ("PRIVATE", VideoError::Forbidden),
            ("ADULT", VideoError::AgeRestricted),
        ] {
            let (_, ctx) = http_context(
                FakeHttp::new()
                    .route(PAGE_BASE, 200, PAGE)
                    .route(MOVIE_DATA, 200, &format!(r#"{{"result": "{}"}}"#, result)),
            );
            assert_eq!(DaumTvpotExtractor::new().fetch("1", &ctx).await, Err(expected));
        }
    }
}
