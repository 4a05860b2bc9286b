use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RandimgError, Result};
use crate::tracker::RateLimit;

const ACCESS_KEY_ENV: &str = "UNSPLASH_ACCESS_KEY";
const LEGACY_ACCESS_KEY_ENV: &str = "ACCESS_KEY";

/// One year
const MAX_WINDOW_SECS: u64 = 366 * 24 * 60 * 60;

/// Unsplash topic to draw random photos from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
}

impl Topic {
    fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
        }
    }
}

/// Request limit as it appears in the config file
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_limit() -> usize {
    RateLimit::DEFAULT_LIMIT
}

fn default_window_secs() -> u64 {
    RateLimit::DEFAULT_WINDOW_SECS
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            window_secs: default_window_secs(),
        }
    }
}

/// Configuration settings for randimg
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Unsplash access key; `UNSPLASH_ACCESS_KEY` overrides it
    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_format")]
    pub format: String,

    /// Requested image width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_orientation")]
    pub orientation: String,

    #[serde(default = "default_topics")]
    pub topics: Vec<Topic>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

fn default_api_base_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_format() -> String {
    "jpg".to_string()
}

fn default_width() -> u32 {
    3840 // 4k
}

fn default_orientation() -> String {
    "landscape".to_string()
}

fn default_topics() -> Vec<Topic> {
    vec![
        Topic::new("bo8jQKTaE0Y", "Wallpapers"),
        Topic::new("6sMVjTLSkeQ", "Nature"),
    ]
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key: None,
            api_base_url: default_api_base_url(),
            format: default_format(),
            width: default_width(),
            orientation: default_orientation(),
            topics: default_topics(),
            timeout_secs: default_timeout_secs(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Get the default config file path (~/.randimg.json)
    fn config_file_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".randimg.json"))
    }

    /// Load configuration, layering the environment over the file over the
    /// defaults. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_file_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RandimgError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup(ACCESS_KEY_ENV)
            .or_else(|| lookup(LEGACY_ACCESS_KEY_ENV))
            .filter(|k| !k.trim().is_empty());
        if key.is_some() {
            self.access_key = key;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.rate_limit.limit == 0 {
            return Err(RandimgError::Config("rateLimit.limit must be at least 1".to_string()));
        }
        if self.rate_limit.window_secs == 0 || self.rate_limit.window_secs > MAX_WINDOW_SECS {
            return Err(RandimgError::Config(format!(
                "rateLimit.windowSecs must be between 1 and {MAX_WINDOW_SECS}"
            )));
        }
        if self.width == 0 {
            return Err(RandimgError::Config("width must be positive".to_string()));
        }
        if self.format.trim().is_empty() {
            return Err(RandimgError::Config("format must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn access_key(&self) -> Result<&str> {
        self.access_key.as_deref().ok_or_else(|| {
            RandimgError::Config(format!(
                "no Unsplash access key; set {ACCESS_KEY_ENV} or accessKey in ~/.randimg.json"
            ))
        })
    }

    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::new(self.rate_limit.limit, self.rate_limit.window_secs)
    }

    /// Comma-separated topic ids, as the API expects them
    pub fn topic_ids(&self) -> String {
        self.topics
            .iter()
            .map(|t| t.id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn topic_titles(&self) -> String {
        self.topics
            .iter()
            .map(|t| t.title.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}
