//! Fixture-backed collaborators for unit tests.

use crate::core::cache::{CacheGateway, MemoryCache, DEFAULT_TTL};
use crate::core::error::{Result, VideoError};
use crate::core::extractor::ExtractorContext;
use crate::http::{HttpClient, HttpResponse};
use crate::probe::{MediaMeta, MediaProbe};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Answers each GET with the route whose prefix is the longest match.
#[derive(Default)]
pub struct FakeHttp {
    routes: Vec<(String, HttpResponse)>,
    redirects: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, prefix: &str, status: u16, body: &str) -> Self {
        self.routes
            .push((prefix.to_string(), HttpResponse::new(status, body)));
        self
    }

    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    pub fn hits(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());

        self.routes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, response)| response.clone())
            .ok_or_else(|| VideoError::Transport(format!("no route for {}", url)))
    }

    async fn resolve_redirect(&self, url: &str) -> Result<String> {
        self.requests.lock().unwrap().push(format!("HEAD {}", url));
        Ok(self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string()))
    }
}

pub struct FakeProbe {
    meta: Result<MediaMeta>,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(meta: Result<MediaMeta>) -> Self {
        Self {
            meta,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_duration(duration: u64) -> Self {
        Self::new(Ok(MediaMeta {
            duration,
            ..MediaMeta::default()
        }))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, _url: &str) -> Result<MediaMeta> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.meta.clone()
    }
}

pub fn context(http: Arc<FakeHttp>, probe: Arc<FakeProbe>) -> ExtractorContext {
    ExtractorContext {
        http,
        cache: CacheGateway::new(Arc::new(MemoryCache::new()), "test", DEFAULT_TTL),
        probe,
    }
}

pub fn http_context(http: FakeHttp) -> (Arc<FakeHttp>, ExtractorContext) {
    let http = Arc::new(http);
    let ctx = context(http.clone(), Arc::new(FakeProbe::with_duration(0)));
    (http, ctx)
}
