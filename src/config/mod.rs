use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache namespace.
    pub name: String,
    /// Cache TTL in seconds.
    pub ttl: u64,
    pub user_agent: String,
    /// HTTP timeout in seconds.
    pub timeout: u64,
    pub ffprobe: PathBuf,
    pub youtube: YoutubeConfig,
    pub vimeo: VimeoConfig,
    pub facebook: FacebookConfig,
    pub youku: YoukuConfig,
    pub tudou: TudouConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VimeoConfig {
    pub access_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FacebookConfig {
    pub access_token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YoukuConfig {
    pub client_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TudouConfig {
    pub app_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "video-parser-cache".to_string(),
            ttl: 3600 * 24 * 7,
            user_agent: format!("video-parser/{}", env!("CARGO_PKG_VERSION")),
            timeout: 30,
            ffprobe: PathBuf::from("ffprobe"),
            youtube: YoutubeConfig::default(),
            vimeo: VimeoConfig::default(),
            facebook: FacebookConfig::default(),
            youku: YoukuConfig::default(),
            tudou: TudouConfig::default(),
        }
    }
}

impl Config {
    /// Reads a TOML file, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}
