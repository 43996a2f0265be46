use crate::core::{Details, Extractor, ExtractorContext, Provider, Result, Video};
use crate::utils::title_from_url;
use async_trait::async_trait;

/// Direct media URLs. The identifier is the URL itself.
pub struct HttpMediaExtractor;

impl HttpMediaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HttpMediaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Extractor for HttpMediaExtractor {
    fn provider(&self) -> Provider {
        Provider::Http
    }

    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video> {
        let meta = ctx.probe.probe(id).await?;

        let mut video = Video::new(id, id);
        video.title = title_from_url(id);
        video.description = meta
            .tags
            .get("description")
            .or_else(|| meta.tags.get("comment"))
            .cloned()
            .unwrap_or_default();
        video.duration = meta.duration;
        video.details = Details::default();

        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VideoError;
    use crate::probe::MediaMeta;
    use crate::testing::{context, FakeHttp, FakeProbe};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fetch_uses_probe() {
        let tags = BTreeMap::from([("comment".to_string(), "shot on a phone".to_string())]);
        let probe = Arc::new(FakeProbe::new(Ok(MediaMeta { duration: 61, tags })));
        let ctx = context(Arc::new(FakeHttp::new()), probe.clone());

        let url = "https://cdn.example.com/media/My%20Clip.mp4";
        let video = HttpMediaExtractor::new().fetch(url, &ctx).await.unwrap();

        assert_eq!(video.id, url);
        assert_eq!(video.url, url);
        assert_eq!(video.title, "My Clip.mp4");
        assert_eq!(video.description, "shot on a phone");
        assert_eq!(video.duration, 61);
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test]
    async fn test_probe_failure_propagates() {
        let probe = Arc::new(FakeProbe::new(Err(VideoError::malformed("ffprobe exited with 1"))));
        let ctx = context(Arc::new(FakeHttp::new()), probe);

        let result = HttpMediaExtractor::new().fetch("https://x/y.mp4", &ctx).await;
        assert!(matches!(result, Err(VideoError::Malformed(_))));
    }
}
