use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ENDPOINT: &str = "https://api.flickr.com/services/rest/";

/// Largest page the Flickr photoset API will return.
pub const MAX_PER_PAGE: u32 = 500;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlickrConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Serve users from a TOML fixture file instead of the live API.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

impl FlickrConfig {
    pub fn page_size(&self) -> u32 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }
}

impl Default for FlickrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            per_page: default_per_page(),
            timeout_seconds: default_timeout_seconds(),
            fixture: None,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_per_page() -> u32 {
    MAX_PER_PAGE
}

fn default_timeout_seconds() -> u64 {
    10
}
