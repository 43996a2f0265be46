use crate::config::Config;
use crate::core::{ExtractorEngine, Resolution, VideoError};
use anyhow::Result;
use clap::Parser;
use futures::future::join_all;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "video-parser")]
#[command(about = "Resolve video URLs and print normalized metadata as JSON")]
#[command(version)]
pub struct Cli {
    /// Video page URLs
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// TOML config with API credentials and cache settings
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Only report which provider and identifier each URL maps to
    #[arg(long)]
    pub classify: bool,

    /// Override the cache TTL in seconds
    #[arg(long, value_name = "SECS")]
    pub ttl: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(ttl) = self.ttl {
            config.ttl = ttl;
        }
        Ok(config)
    }

    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        debug!("Using cache namespace {} with ttl {}s", config.name, config.ttl);

        let engine = ExtractorEngine::new(&config)?;

        let lines = if self.classify {
            self.urls.iter().map(|url| classify_line(&engine, url)).collect()
        } else {
            join_all(self.urls.iter().map(|url| parse_line(&engine, url))).await
        };

        for line in lines {
            println!("{}", serde_json::to_string(&line)?);
        }

        Ok(())
    }
}

fn error_line(url: &str, err: &VideoError) -> Value {
    warn!("Failed to parse {}: {}", url, err);
    json!({
        "url": url,
        "error": err.code().map(str::to_string).unwrap_or_else(|| err.to_string()),
    })
}

fn classify_line(engine: &ExtractorEngine, url: &str) -> Value {
    match engine.classify_url(url) {
        Ok(found) => json!({
            "url": url,
            "provider": found.provider,
            "identifier": found.identifier,
            "redirect": found.resolution == Resolution::Redirect,
            "priority": found.priority,
        }),
        Err(err) => error_line(url, &err),
    }
}

async fn parse_line(engine: &ExtractorEngine, url: &str) -> Value {
    let parsed = engine
        .parse_video(url)
        .await
        .and_then(|video| serde_json::to_value(video).map_err(VideoError::from));

    match parsed {
        Ok(value) => value,
        Err(err) => error_line(url, &err),
    }
}
