//! One adapter per provider.
//!
//! JSON adapters decode into private serde structs and map them onto [`Video`].
//! Scraping adapters keep page parsing in a synchronous `scrape_page` so a
//! markup change is caught by that adapter's fixture tests alone.
//!
//! [`Video`]: crate::core::Video

pub mod dailymotion;
pub mod daum;
pub mod facebook;
pub mod gomtv;
pub mod http_media;
pub mod naver;
pub mod rutube;
pub mod tudou;
pub mod vimeo;
pub mod youku;
pub mod youtube;

pub use dailymotion::DailymotionExtractor;
pub use daum::DaumTvpotExtractor;
pub use facebook::FacebookExtractor;
pub use gomtv::GomTvExtractor;
pub use http_media::HttpMediaExtractor;
pub use naver::NaverTvcastExtractor;
pub use rutube::RutubeExtractor;
pub use tudou::TudouExtractor;
pub use vimeo::VimeoExtractor;
pub use youku::YoukuExtractor;
pub use youtube::YouTubeExtractor;

use crate::config::Config;
use crate::core::Extractor;

/// Every built-in extractor, configured with the credentials in `config`.
pub fn builtin(config: &Config) -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(YouTubeExtractor::new(&config.youtube.key)),
        Box::new(VimeoExtractor::new(&config.vimeo.access_token)),
        Box::new(FacebookExtractor::new(&config.facebook.access_token)),
        Box::new(YoukuExtractor::new(&config.youku.client_id)),
        Box::new(DailymotionExtractor::new()),
        Box::new(NaverTvcastExtractor::new()),
        Box::new(RutubeExtractor::new()),
        Box::new(DaumTvpotExtractor::new()),
        Box::new(TudouExtractor::new(&config.tudou.app_key)),
        Box::new(GomTvExtractor::new()),
        Box::new(HttpMediaExtractor::new()),
    ]
}
