use thiserror::Error;

#[derive(Error, Debug)]
pub enum RandimgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request returned status code {status}.\nRequest: {url}")]
    Http { status: u16, url: String },

    #[error("Request limit reached. Please try again later. Limit = {limit}/{}.", window_label(.window_secs))]
    RateLimitExceeded { limit: usize, window_secs: u64 },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Metadata key is reserved: {0}")]
    ReservedKey(String),

    #[error("Unsafe file name from API response: {0}")]
    UnsafeFilename(String),
}

impl RandimgError {
    /// Rate limiting is reported to the user, not treated as a failure.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, RandimgError::RateLimitExceeded { .. })
    }
}

fn window_label(window_secs: &u64) -> String {
    match *window_secs {
        3600 => "hour".to_string(),
        60 => "minute".to_string(),
        86400 => "day".to_string(),
        secs => format!("{secs}s"),
    }
}

pub type Result<T> = std::result::Result<T, RandimgError>;
