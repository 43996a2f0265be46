use crate::config::Config;
use crate::core::cache::{CacheErrorListener, CacheGateway, CacheStore, MemoryCache};
use crate::core::error::{Result, VideoError};
use crate::core::metadata::Video;
use crate::core::registry::{Classification, Provider, Registry, Resolution};
use crate::http::{HttpClient, ReqwestClient};
use crate::probe::{FfprobeProbe, MediaProbe};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Redirect hops allowed while resolving a URL to an identifier.
pub const MAX_INDIRECTION: usize = 1;

/// Collaborators handed to every extractor call.
#[derive(Clone)]
pub struct ExtractorContext {
    pub http: Arc<dyn HttpClient>,
    pub cache: CacheGateway,
    pub probe: Arc<dyn MediaProbe>,
}

#[async_trait]
pub trait Extractor: Send + Sync {
    fn provider(&self) -> Provider;

    /// Fetches and normalizes one video. Called on cache misses only.
    async fn fetch(&self, id: &str, ctx: &ExtractorContext) -> Result<Video>;
}

pub struct ExtractorEngine {
    registry: Registry,
    extractors: HashMap<Provider, Box<dyn Extractor>>,
    ctx: ExtractorContext,
}

impl ExtractorEngine {
    pub fn new(config: &Config) -> Result<Self> {
        EngineBuilder::new(config.clone()).build()
    }

    pub fn builder(config: Config) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Installs `extractor`, replacing any previous one for its provider.
    pub fn register_extractor(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.insert(extractor.provider(), extractor);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn context(&self) -> &ExtractorContext {
        &self.ctx
    }

    pub fn classify_url(&self, url: &str) -> Result<Classification> {
        self.registry.classify(url)
    }

    /// Classifies `url`, following at most [`MAX_INDIRECTION`] redirects.
    pub async fn resolve(&self, url: &str) -> Result<(Provider, String)> {
        let mut current = url.trim().to_string();

        for hop in 0..=MAX_INDIRECTION {
            let classification = self.registry.classify(&current)?;

            match classification.resolution {
                Resolution::Direct => {
                    return Ok((classification.provider, classification.identifier));
                }
                Resolution::Redirect if hop < MAX_INDIRECTION => {
                    debug!("Following redirect for {}", current);
                    current = self.ctx.http.resolve_redirect(&current).await?;
                }
                Resolution::Redirect => break,
            }
        }

        debug!("Gave up resolving {} after {} hop(s)", url, MAX_INDIRECTION);
        Err(VideoError::NotSupportedProvider)
    }

    pub async fn parse_video(&self, url: &str) -> Result<Video> {
        let (provider, id) = self.resolve(url).await?;

        let extractor = self
            .extractors
            .get(&provider)
            .ok_or(VideoError::NotSupportedProvider)?;

        let key = provider.cache_key(&id);
        let mut video = self
            .ctx
            .cache
            .with_cache(&key, || extractor.fetch(&id, &self.ctx))
            .await?;

        video.provider = Some(provider);
        info!("Resolved {} as {} {}", url, provider, id);

        Ok(video)
    }
}

pub struct EngineBuilder {
    config: Config,
    registry: Option<Registry>,
    http: Option<Arc<dyn HttpClient>>,
    store: Option<Arc<dyn CacheStore>>,
    probe: Option<Arc<dyn MediaProbe>>,
    listener: Option<CacheErrorListener>,
}

impl EngineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: None,
            http: None,
            store: None,
            probe: None,
            listener: None,
        }
    }

    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn http(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn MediaProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Receives cache failures that do not affect the returned result.
    pub fn on_cache_error(mut self, listener: CacheErrorListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn build(self) -> Result<ExtractorEngine> {
        let http: Arc<dyn HttpClient> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestClient::new(&self.config)?),
        };
        let store: Arc<dyn CacheStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryCache::new()),
        };
        let probe: Arc<dyn MediaProbe> = match self.probe {
            Some(probe) => probe,
            None => Arc::new(FfprobeProbe::new(self.config.ffprobe.clone())),
        };

        let mut cache = CacheGateway::new(store, self.config.name.clone(), self.config.cache_ttl());
        if let Some(listener) = self.listener {
            cache = cache.with_listener(listener);
        }

        let mut engine = ExtractorEngine {
            registry: self.registry.unwrap_or_default(),
            extractors: HashMap::new(),
            ctx: ExtractorContext { http, cache, probe },
        };

        for extractor in crate::extractors::builtin(&self.config) {
            engine.register_extractor(extractor);
        }

        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHttp, FakeProbe};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedExtractor {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Extractor for CannedExtractor {
        fn provider(&self) -> Provider {
            Provider::Vimeo
        }

        async fn fetch(&self, id: &str, _ctx: &ExtractorContext) -> Result<Video> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut video = Video::new(id, format!("https://vimeo.com/{}", id));
            video.title = "canned".to_string();
            Ok(video)
        }
    }

    fn engine(http: FakeHttp) -> ExtractorEngine {
        ExtractorEngine::builder(Config::default())
            .http(Arc::new(http))
            .probe(Arc::new(FakeProbe::with_duration(0)))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_registered_extractor_replaces_builtin() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut engine = engine(FakeHttp::new());
        engine.register_extractor(Box::new(CannedExtractor {
            calls: calls.clone(),
        }));

        let video = engine.parse_video("https://vimeo.com/42").await.unwrap();
        assert_eq!(video.title, "canned");
        assert_eq!(video.provider, Some(Provider::Vimeo));

        engine.parse_video("https://player.vimeo.com/video/42").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_direct_skips_network() {
        let engine = engine(FakeHttp::new());
        let resolved = engine.resolve("  https://vimeo.com/42 ").await.unwrap();
        assert_eq!(resolved, (Provider::Vimeo, "42".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_redirect_to_unknown_site() {
        let engine = engine(FakeHttp::new().redirect("https://video.rutube.ru/7962382", "https://example.com/"));
        assert_eq!(
            engine.resolve("https://video.rutube.ru/7962382").await,
            Err(VideoError::NotSupportedProvider)
        );
    }

    #[tokio::test]
    async fn test_unsupported_url() {
        let engine = engine(FakeHttp::new());
        assert_eq!(
            engine.parse_video("ftp://example.com/file").await,
            Err(VideoError::NotSupportedProvider)
        );
    }
}
