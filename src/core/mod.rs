pub mod cache;
pub mod duration;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod registry;

pub use cache::{CacheGateway, CacheStore, HashCache, MemoryCache, MemoryHashStore};
pub use duration::parse_duration;
pub use error::{Result, VideoError};
pub use extractor::{EngineBuilder, Extractor, ExtractorContext, ExtractorEngine};
pub use metadata::{Author, Details, Embed, Video};
pub use registry::{classify_url, Classification, Provider, ProviderRule, Registry, Resolution};
