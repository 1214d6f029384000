// Photodex module - resolves a trainer and lays their album over the catalog
mod error;
mod handlers;

pub use error::PhotodexError;
pub use handlers::{home_handler, trainer_handler};

use crate::{
    cache::{AlbumRef, EntryInfo, LookupCache, LookupTtl},
    catalog::{Catalog, Region, build_regions},
    photos::{PhotoMap, PhotoRecord, Preview, map_photos},
    source::{DynPhotoSource, PhotoPage, SourceError, UserRef},
};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type SharedPhotodexService = Arc<PhotodexService>;

/// A trainer's collection, ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct Photodex {
    /// Name shown on the page: the album's trainer override or the username.
    pub trainer: String,
    pub username: String,
    pub user_id: String,
    pub album_id: String,
    pub album_url: String,
    pub preview: Option<Preview>,
    pub photo_map: PhotoMap,
    pub regions: Vec<Region>,
    pub snap_count: usize,
    pub photo_count: usize,
}

/// JSON view of a Photódex served by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerSummary {
    pub username: String,
    pub photodex_url: String,
    pub user_id: String,
    pub album_id: String,
    pub external_url: String,
    pub preview_url: Option<String>,
    pub preview_thumb_url: Option<String>,
    pub count: usize,
    pub photos: PhotoMap,
}

impl Photodex {
    pub fn summary(&self, base_url: Option<&str>) -> TrainerSummary {
        let base = base_url.unwrap_or_default().trim_end_matches('/');
        TrainerSummary {
            username: self.username.clone(),
            photodex_url: format!("{}/{}", base, urlencoding::encode(&self.username)),
            user_id: self.user_id.clone(),
            album_id: self.album_id.clone(),
            external_url: self.album_url.clone(),
            preview_url: self.preview.as_ref().map(|p| p.url.clone()),
            preview_thumb_url: self.preview.as_ref().map(|p| p.thumb_url.clone()),
            count: self.snap_count,
            photos: self.photo_map.clone(),
        }
    }
}

pub struct PhotodexService {
    source: DynPhotoSource,
    lookups: Arc<LookupCache>,
    catalog: Catalog,
    per_page: u32,
}

impl PhotodexService {
    pub fn new(source: DynPhotoSource, catalog: Catalog, ttl: LookupTtl, per_page: u32) -> Self {
        Self {
            lookups: Arc::new(LookupCache::new(source.clone(), ttl)),
            source,
            catalog,
            per_page: per_page.max(1),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn lookups(&self) -> &Arc<LookupCache> {
        &self.lookups
    }

    pub async fn lookup_entries(&self) -> Vec<EntryInfo> {
        self.lookups.entries().await
    }

    /// Loads a trainer's Photódex.
    ///
    /// Any failure along the way invalidates the trainer's cached lookups so
    /// the next request resolves from scratch.
    pub async fn load(&self, username: &str) -> Result<Photodex, PhotodexError> {
        let user = match self.lookups.resolve_user(username).await {
            Ok(user) => user,
            Err(e) => return Err(self.fail(username, None, e).await),
        };
        let user_id = user.user_id.clone();
        match self.resolve(user).await {
            Ok(photodex) => Ok(photodex),
            Err(e) => Err(self.fail(username, Some(&user_id), e).await),
        }
    }

    async fn fail(&self, username: &str, user_id: Option<&str>, e: SourceError) -> PhotodexError {
        warn!(username = %username, error = %e, "Failed to load Photodex");
        self.lookups.invalidate(username, user_id).await;
        e.into()
    }

    async fn resolve(&self, user: UserRef) -> Result<Photodex, SourceError> {
        let album = self.lookups.resolve_album(&user.user_id).await?;
        let photos = self.fetch_album(&user.user_id, &album).await?;

        let mapped = map_photos(&self.catalog, &photos);
        let regions = build_regions(&self.catalog, &mapped.photo_map);
        let snap_count = mapped.snap_count();

        info!(
            username = %user.username,
            album_id = %album.album_id,
            photos = photos.len(),
            snaps = snap_count,
            "Loaded Photodex"
        );

        Ok(Photodex {
            trainer: album
                .trainer_name
                .clone()
                .unwrap_or_else(|| user.username.clone()),
            album_url: self.source.album_url(&user.user_id, &album.album_id),
            username: user.username,
            user_id: user.user_id,
            album_id: album.album_id,
            preview: mapped.preview,
            photo_map: mapped.photo_map,
            regions,
            snap_count,
            photo_count: photos.len(),
        })
    }

    /// Fetches every page of the album concurrently, keeping page order.
    async fn fetch_album(
        &self,
        user_id: &str,
        album: &AlbumRef,
    ) -> Result<Vec<PhotoRecord>, SourceError> {
        let expected_pages = album.photo_count.div_ceil(self.per_page).max(1);
        let mut pages = self.fetch_pages(user_id, &album.album_id, 1..=expected_pages).await?;

        // The album listing's count can lag behind the album itself.
        let reported_pages = pages.first().map_or(1, |page| page.pages);
        if reported_pages > expected_pages {
            debug!(
                album_id = %album.album_id,
                expected_pages,
                reported_pages,
                "Fetching pages beyond the listed photo count"
            );
            let extra = self
                .fetch_pages(user_id, &album.album_id, expected_pages + 1..=reported_pages)
                .await?;
            pages.extend(extra);
        }

        Ok(pages.into_iter().flat_map(|page| page.photos).collect())
    }

    async fn fetch_pages(
        &self,
        user_id: &str,
        album_id: &str,
        pages: std::ops::RangeInclusive<u32>,
    ) -> Result<Vec<PhotoPage>, SourceError> {
        try_join_all(
            pages.map(|page| self.source.album_photos(user_id, album_id, page, self.per_page)),
        )
        .await
    }
}
