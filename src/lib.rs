pub mod cli;
pub mod config;
pub mod core;
pub mod extractors;
pub mod http;
pub mod probe;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::config::Config;
pub use crate::core::{
    classify_url, parse_duration, EngineBuilder, Extractor, ExtractorEngine, Provider, Video,
    VideoError,
};
