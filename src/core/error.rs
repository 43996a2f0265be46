use thiserror::Error;

/// Failure kinds surfaced by the parser.
///
/// The recognized kinds carry a stable code (`video.not_found`, ...) and are
/// cached like successful results. `Transport` and `Malformed` are untyped
/// failures and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoError {
    #[error("no provider rule matches the url")]
    NotSupportedProvider,
    #[error("video not found")]
    NotFound,
    #[error("video is not embeddable or not published")]
    Forbidden,
    #[error("video is age restricted")]
    AgeRestricted,
    #[error("invalid video url")]
    InvalidUrl,
    #[error("channel not found")]
    ChannelNotFound,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, VideoError>;

impl VideoError {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            VideoError::NotSupportedProvider => Some("video.not_supported_provider"),
            VideoError::NotFound => Some("video.not_found"),
            VideoError::Forbidden => Some("video.forbidden"),
            VideoError::AgeRestricted => Some("video.age_restricted"),
            VideoError::InvalidUrl => Some("video.invalid_url"),
            VideoError::ChannelNotFound => Some("video.channel_not_found"),
            VideoError::Transport(_) | VideoError::Malformed(_) => None,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "video.not_supported_provider" => Some(VideoError::NotSupportedProvider),
            "video.not_found" => Some(VideoError::NotFound),
            "video.forbidden" => Some(VideoError::Forbidden),
            "video.age_restricted" => Some(VideoError::AgeRestricted),
            "video.invalid_url" => Some(VideoError::InvalidUrl),
            "video.channel_not_found" => Some(VideoError::ChannelNotFound),
            _ => None,
        }
    }

    /// Whether this outcome may be stored in the cache.
    pub fn is_cacheable(&self) -> bool {
        self.code().is_some()
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        VideoError::Malformed(msg.into())
    }
}

impl From<reqwest::Error> for VideoError {
    fn from(err: reqwest::Error) -> Self {
        VideoError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for VideoError {
    fn from(err: serde_json::Error) -> Self {
        VideoError::Malformed(err.to_string())
    }
}
