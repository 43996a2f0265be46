use crate::core::error::{Result, VideoError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Container-level facts about a media URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMeta {
    /// Seconds, rounded.
    pub duration: u64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<MediaMeta>;
}

/// Shells out to `ffprobe`.
pub struct FfprobeProbe {
    binary: PathBuf,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl FfprobeProbe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn parse_output(stdout: &str) -> Result<MediaMeta> {
        let output: FfprobeOutput = serde_json::from_str(stdout)?;
        let duration = output
            .format
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<f64>().ok())
            .map(|d| d.max(0.0).round() as u64)
            .unwrap_or(0);

        Ok(MediaMeta {
            duration,
            tags: output.format.tags,
        })
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn probe(&self, url: &str) -> Result<MediaMeta> {
        debug!("Probing {}", url);

        let output = Command::new(&self.binary)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(url)
            .output()
            .await
            .map_err(|e| VideoError::malformed(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(VideoError::malformed(format!(
                "ffprobe exited with {} for {}",
                output.status, url
            )));
        }

        Self::parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}
