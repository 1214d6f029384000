pub mod config;
pub mod error;
pub mod providers;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Read-only access to a photo hosting service.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn find_user(&self, username: &str) -> Result<UserRef, SourceError>;

    async fn list_albums(&self, user_id: &str) -> Result<Vec<AlbumSummary>, SourceError>;

    /// Fetches one 1-based page of an album.
    async fn album_photos(
        &self,
        user_id: &str,
        album_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<PhotoPage, SourceError>;

    fn name(&self) -> &str;

    /// Public page for an album on the photo host.
    fn album_url(&self, user_id: &str, album_id: &str) -> String {
        format!(
            "https://www.flickr.com/photos/{}/albums/{}",
            urlencoding::encode(user_id),
            urlencoding::encode(album_id)
        )
    }
}

pub type DynPhotoSource = Arc<dyn PhotoSource>;

pub async fn create_source(config: &FlickrConfig) -> Result<DynPhotoSource, SourceError> {
    if let Some(fixture) = &config.fixture {
        return Ok(Arc::new(
            providers::fixture::FixtureSource::from_file(fixture).await?,
        ));
    }

    match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {
            Ok(Arc::new(providers::flickr::FlickrSource::new(config)?))
        }
        _ => Err(SourceError::ConfigError(
            "no Flickr API key or fixture configured".to_string(),
        )),
    }
}
