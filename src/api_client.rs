use std::time::Duration;

use reqwest::blocking::Response;

use crate::error::{RandimgError, Result};
use crate::models::RandomPhoto;

/// Parameters of a `/photos/random` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoQuery {
    pub orientation: String,
    /// Comma-separated topic ids
    pub topics: String,
}

/// Where random photos come from.
pub trait PhotoSource {
    /// URL of the metadata request for `query`. Holds no credentials, so it
    /// is safe to store in the tracker.
    fn random_photo_url(&self, query: &PhotoQuery) -> String;
    fn random_photo(&self, url: &str) -> Result<RandomPhoto>;
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP client for the Unsplash API.
pub struct UnsplashClient {
    base_url: String,
    access_key: String,
    client: reqwest::blocking::Client,
}

impl UnsplashClient {
    pub fn new(base_url: &str, access_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("randimg/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RandimgError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(resp: Response, url: &str) -> Result<Response> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(RandimgError::Http {
                status: resp.status().as_u16(),
                url: url.to_string(),
            })
        }
    }
}

impl PhotoSource for UnsplashClient {
    fn random_photo_url(&self, query: &PhotoQuery) -> String {
        format!(
            "{}?orientation={}&topics={}",
            self.url("/photos/random"),
            query.orientation,
            query.topics
        )
    }

    fn random_photo(&self, url: &str) -> Result<RandomPhoto> {
        tracing::debug!(url, "requesting random photo");
        let resp = self
            .client
            .get(url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .send()
            .map_err(|e| RandimgError::Network(e.to_string()))?;
        let resp = Self::check_status(resp, url)?;

        if let Some(remaining) = resp
            .headers()
            .get("X-Ratelimit-Remaining")
            .and_then(|v| v.to_str().ok())
        {
            tracing::debug!(remaining, "api quota");
        }

        resp.json::<RandomPhoto>()
            .map_err(|e| RandimgError::Network(e.to_string()))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!(url, "downloading image");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| RandimgError::Network(e.to_string()))?;
        let resp = Self::check_status(resp, url)?;

        let bytes = resp
            .bytes()
            .map_err(|e| RandimgError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
