use crate::core::error::{Result, VideoError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Youtube,
    Vimeo,
    Facebook,
    Youku,
    Dailymotion,
    NaverTvcast,
    Rutube,
    DaumTvpot,
    Tudou,
    Gomtv,
    Http,
}

impl Provider {
    pub const ALL: [Provider; 11] = [
        Provider::Youtube,
        Provider::Vimeo,
        Provider::Facebook,
        Provider::Youku,
        Provider::Dailymotion,
        Provider::NaverTvcast,
        Provider::Rutube,
        Provider::DaumTvpot,
        Provider::Tudou,
        Provider::Gomtv,
        Provider::Http,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Youtube => "youtube",
            Provider::Vimeo => "vimeo",
            Provider::Facebook => "facebook",
            Provider::Youku => "youku",
            Provider::Dailymotion => "dailymotion",
            Provider::NaverTvcast => "navertvcast",
            Provider::Rutube => "rutube",
            Provider::DaumTvpot => "daumtvpot",
            Provider::Tudou => "tudou",
            Provider::Gomtv => "gomtv",
            Provider::Http => "http",
        }
    }

    /// Cache key for a top-level lookup, e.g. `youtube_O5jUi3kBins`.
    pub fn cache_key(&self, identifier: &str) -> String {
        format!("{}_{}", self.as_str(), identifier)
    }

    /// Cache key for a derived sub-resource, e.g. `facebook_meta_123`.
    pub fn sub_cache_key(&self, resource: &str, identifier: &str) -> String {
        format!("{}_{}_{}", self.as_str(), resource, identifier)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(VideoError::NotSupportedProvider)
    }
}

/// How the captured token turns into an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The capture group is the identifier.
    Direct,
    /// The URL must be dereferenced and the target classified again.
    Redirect,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid pattern for rule {priority}: {source}")]
    InvalidPattern {
        priority: u16,
        #[source]
        source: regex::Error,
    },
    #[error("duplicate rule priority {0}")]
    DuplicatePriority(u16),
    #[error("rule {priority} has no capture group {index}")]
    MissingGroup { priority: u16, index: usize },
}

#[derive(Debug, Clone)]
pub struct ProviderRule {
    /// Lower runs first. Overlapping patterns are settled by this number only.
    pub priority: u16,
    pub provider: Provider,
    pub pattern: Regex,
    pub index: usize,
    pub resolution: Resolution,
}

impl ProviderRule {
    pub fn new(
        priority: u16,
        provider: Provider,
        pattern: &str,
        index: usize,
        resolution: Resolution,
    ) -> std::result::Result<Self, RegistryError> {
        let pattern = Regex::new(pattern)
            .map_err(|source| RegistryError::InvalidPattern { priority, source })?;

        if index >= pattern.captures_len() {
            return Err(RegistryError::MissingGroup { priority, index });
        }

        Ok(Self {
            priority,
            provider,
            pattern,
            index,
            resolution,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub provider: Provider,
    pub identifier: String,
    pub resolution: Resolution,
    pub priority: u16,
}

// (priority, provider, pattern, capture index, resolution)
const BUILTIN_RULES: &[(u16, Provider, &str, usize, Resolution)] = &[
    (
        10,
        Provider::Youtube,
        r"(?:https?://)?(?:www\.|m\.)?(?:youtube\.com|youtu\.be|youtube-nocookie\.com)/(?:embed/|v/|watch\?(?:[^#]*&)?v=)?([\w-]{11})",
        1,
        Resolution::Direct,
    ),
    (
        20,
        Provider::Vimeo,
        r"(?:https?://)?(?:www\.|player\.)?vimeo\.com/(?:video/|channels/[\w-]+/)?(\d+)",
        1,
        Resolution::Direct,
    ),
    (
        30,
        Provider::Facebook,
        r"(?:https?://)?(?:www\.|m\.)?facebook\.com/(?:[\w.-]+/)?videos?/(?:embed\?video_id=|vb\.\d+/)?(\d+)",
        1,
        Resolution::Direct,
    ),
    (
        40,
        Provider::Youku,
        r"v\.youku\.com/v_show/id_([\w=]+?)(?:_ev_\d+)?\.html",
        1,
        Resolution::Direct,
    ),
    (
        41,
        Provider::Youku,
        r"player\.youku\.com/embed/([\w=]+)",
        1,
        Resolution::Direct,
    ),
    (
        42,
        Provider::Youku,
        r"player\.youku\.com/player\.php/.*?/sid/([\w=]+)/v\.swf",
        1,
        Resolution::Direct,
    ),
    (
        50,
        Provider::Dailymotion,
        r"dailymotion\.com/(?:embed/)?video/([a-zA-Z0-9]+)",
        1,
        Resolution::Direct,
    ),
    (
        51,
        Provider::Dailymotion,
        r"dai\.ly/([a-zA-Z0-9]+)",
        1,
        Resolution::Direct,
    ),
    (
        60,
        Provider::NaverTvcast,
        r"(?:https?://)?(?:m\.)?tv(?:cast)?\.naver\.com/v/(\d+)",
        1,
        Resolution::Direct,
    ),
    (
        70,
        Provider::Rutube,
        r"rutube\.ru/video/([a-f0-9]{32})",
        1,
        Resolution::Direct,
    ),
    (
        71,
        Provider::Rutube,
        r"rutube\.ru/play/embed/(\d+)",
        1,
        Resolution::Redirect,
    ),
    (
        72,
        Provider::Rutube,
        r"video\.rutube\.ru/(\d+)",
        1,
        Resolution::Redirect,
    ),
    (
        80,
        Provider::DaumTvpot,
        r"m\.tvpot\.daum\.net/v/(\d+)(?:[/?#]|$)",
        1,
        Resolution::Direct,
    ),
    (
        81,
        Provider::DaumTvpot,
        r"tvpot\.daum\.net/.*[?&]clipid=(\d+)",
        1,
        Resolution::Direct,
    ),
    (
        82,
        Provider::DaumTvpot,
        r"tvpot\.daum\.net/v/([\w%$-]+)",
        1,
        Resolution::Redirect,
    ),
    (
        90,
        Provider::Tudou,
        r"tudou\.com/(?:programs/view|v)/([\w-]+)",
        1,
        Resolution::Direct,
    ),
    (
        100,
        Provider::Gomtv,
        r"gomtv\.com/(\d+)",
        1,
        Resolution::Direct,
    ),
    (
        1000,
        Provider::Http,
        r"(?i)^https?://[^\s?#]+\.(?:mp4|m4v|mov|webm|mkv|flv|ogv|avi|m3u8)(?:[?#]\S*)?$",
        0,
        Resolution::Direct,
    ),
];

/// Ordered rule set. The first rule whose pattern matches decides the provider.
#[derive(Debug, Clone)]
pub struct Registry {
    rules: Vec<ProviderRule>,
}

impl Registry {
    pub fn new(mut rules: Vec<ProviderRule>) -> std::result::Result<Self, RegistryError> {
        rules.sort_by_key(|rule| rule.priority);

        if let Some(pair) = rules.windows(2).find(|w| w[0].priority == w[1].priority) {
            return Err(RegistryError::DuplicatePriority(pair[0].priority));
        }

        Ok(Self { rules })
    }

    pub fn default_rules() -> std::result::Result<Vec<ProviderRule>, RegistryError> {
        BUILTIN_RULES
            .iter()
            .map(|&(priority, provider, pattern, index, resolution)| {
                ProviderRule::new(priority, provider, pattern, index, resolution)
            })
            .collect()
    }

    pub fn rules(&self) -> &[ProviderRule] {
        &self.rules
    }

    pub fn classify(&self, url: &str) -> Result<Classification> {
        let url = url.trim();

        for rule in &self.rules {
            let Some(captures) = rule.pattern.captures(url) else {
                continue;
            };

            let Some(identifier) = captures.get(rule.index) else {
                continue;
            };

            debug!(
                "Rule {} ({}) matched {}",
                rule.priority, rule.provider, url
            );

            return Ok(Classification {
                provider: rule.provider,
                identifier: identifier.as_str().to_string(),
                resolution: rule.resolution,
                priority: rule.priority,
            });
        }

        Err(VideoError::NotSupportedProvider)
    }
}

impl Default for Registry {
    fn default() -> Self {
        DEFAULT_REGISTRY.clone()
    }
}

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let rules = Registry::default_rules().expect("built-in provider rules compile");
    Registry::new(rules).expect("built-in provider priorities are unique")
});

/// Classifies `url` against the built-in rules without any network access.
pub fn classify_url(url: &str) -> Result<Classification> {
    DEFAULT_REGISTRY.classify(url)
}
