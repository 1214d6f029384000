use super::{EntryInfo, ExpiringCache};
use crate::source::{AlbumSummary, DynPhotoSource, SourceError, UserRef};
use regex::Regex;
use serde::Serialize;
use std::{sync::LazyLock, time::Duration};
use tracing::{debug, info, warn};

static PHOTODEX_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)phot[oó]dex").expect("valid album title pattern"));

static TRAINER_OVERRIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*trainer[ \t]*:[ \t]*(\S.*?)[ \t]*\r?$").expect("valid trainer pattern")
});

/// The album a user's Photódex lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumRef {
    pub album_id: String,
    pub title: String,
    /// Display name set in the album description, replacing the username.
    pub trainer_name: Option<String>,
    pub photo_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTtl {
    pub user: Duration,
    pub album: Duration,
}

impl Default for LookupTtl {
    fn default() -> Self {
        Self {
            user: Duration::from_secs(1),
            album: Duration::from_secs(1),
        }
    }
}

/// Short-lived memoization of username and album resolutions.
///
/// Exists to absorb bursts of identical requests, not as long-term storage.
/// Concurrent misses for the same key may all reach the source.
pub struct LookupCache {
    source: DynPhotoSource,
    users: ExpiringCache<UserRef>,
    albums: ExpiringCache<AlbumRef>,
    ttl: LookupTtl,
}

impl LookupCache {
    pub fn new(source: DynPhotoSource, ttl: LookupTtl) -> Self {
        Self {
            source,
            users: ExpiringCache::new(),
            albums: ExpiringCache::new(),
            ttl,
        }
    }

    pub async fn resolve_user(&self, username: &str) -> Result<UserRef, SourceError> {
        let key = user_key(username);
        if let Some(user) = self.users.get(&key).await {
            debug!(key = %key, "Lookup cache hit");
            return Ok(user);
        }

        let user = self.source.find_user(username).await?;
        debug!(key = %key, user_id = %user.user_id, "Resolved user");
        self.users.insert(key, user.clone(), self.ttl.user).await;
        Ok(user)
    }

    pub async fn resolve_album(&self, user_id: &str) -> Result<AlbumRef, SourceError> {
        let key = album_key(user_id);
        if let Some(album) = self.albums.get(&key).await {
            debug!(key = %key, "Lookup cache hit");
            return Ok(album);
        }

        let albums = self.source.list_albums(user_id).await?;
        let album = find_photodex_album(&albums)
            .ok_or_else(|| SourceError::NotFound("No Photodex album found".to_string()))?;

        let album = AlbumRef {
            album_id: album.id.clone(),
            title: album.title.clone(),
            trainer_name: parse_trainer_override(&album.description),
            photo_count: album.photo_count,
        };
        debug!(key = %key, album_id = %album.album_id, "Resolved album");
        self.albums.insert(key, album.clone(), self.ttl.album).await;
        Ok(album)
    }

    /// Forgets a user and the album resolved through it.
    ///
    /// `user_id` names the album entry when the caller already resolved the
    /// user; otherwise it is taken from the cached user entry, if any.
    pub async fn invalidate(&self, username: &str, user_id: Option<&str>) {
        let key = user_key(username);
        let cached = self.users.remove(&key).await;
        let Some(user_id) = user_id.or(cached.as_ref().map(|user| user.user_id.as_str())) else {
            return;
        };
        self.albums.remove(&album_key(user_id)).await;
        info!(key = %key, user_id = %user_id, "Invalidated lookups");
    }

    pub async fn clear(&self) {
        self.users.clear().await;
        self.albums.clear().await;
        info!("Cleared lookup cache");
    }

    pub async fn entries(&self) -> Vec<EntryInfo> {
        let mut entries = self.users.entries().await;
        entries.extend(self.albums.entries().await);
        entries
    }

    pub async fn purge_expired(&self) -> usize {
        self.users.purge_expired().await + self.albums.purge_expired().await
    }

    pub fn start_background_purge(cache: std::sync::Arc<Self>, interval_seconds: u64) {
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_seconds));
            interval.tick().await; // Skip the first immediate tick

            loop {
                interval.tick().await;
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    debug!("Purged {} expired lookups", purged);
                }
            }
        });
    }
}

pub fn user_key(username: &str) -> String {
    format!("findUser:{}", username.to_lowercase())
}

pub fn album_key(user_id: &str) -> String {
    format!("findAlbumId:{}", user_id)
}

/// Picks the album titled "Photodex" (any case, accent optional).
///
/// When several albums match, the first one wins; there is no rule to tell
/// them apart, so the situation is logged.
pub fn find_photodex_album(albums: &[AlbumSummary]) -> Option<&AlbumSummary> {
    let mut matches = albums
        .iter()
        .filter(|album| PHOTODEX_TITLE.is_match(&album.title));
    let first = matches.next()?;

    let extra = matches.count();
    if extra > 0 {
        warn!(
            album_id = %first.id,
            "{} albums match the Photodex title, using the first",
            extra + 1
        );
    }

    Some(first)
}

pub fn parse_trainer_override(description: &str) -> Option<String> {
    TRAINER_OVERRIDE
        .captures(description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photos::PhotoRecord;
    use crate::source::providers::fixture::{FixtureAlbum, FixtureSource, FixtureUser};
    use std::sync::Arc;

    fn album(id: &str, title: &str) -> AlbumSummary {
        AlbumSummary {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            photo_count: 0,
        }
    }

    fn fixture_user(username: &str, user_id: &str, album_id: &str) -> FixtureUser {
        FixtureUser {
            username: username.to_string(),
            user_id: user_id.to_string(),
            albums: vec![FixtureAlbum {
                id: album_id.to_string(),
                title: "My Photódex".to_string(),
                description: "Snaps!\ntrainer: Red".to_string(),
                photos: vec![PhotoRecord {
                    title: "025".to_string(),
                    thumb_url: "m".to_string(),
                    full_url: "l".to_string(),
                    width: 1,
                    height: 1,
                    is_primary: false,
                }],
            }],
        }
    }

    fn setup() -> (Arc<FixtureSource>, LookupCache) {
        let source = Arc::new(FixtureSource::new(vec![fixture_user("Red", "1@N01", "a1")]));
        let cache = LookupCache::new(source.clone(), LookupTtl::default());
        (source, cache)
    }

    #[test]
    fn test_album_title_matching() {
        let albums = vec![
            album("1", "Holiday"),
            album("2", "PHOTÓDEX 2018"),
            album("3", "photodex"),
        ];
        assert_eq!(find_photodex_album(&albums).unwrap().id, "2");
        assert_eq!(find_photodex_album(&albums[2..]).unwrap().id, "3");
        assert!(find_photodex_album(&albums[..1]).is_none());
        assert!(find_photodex_album(&[album("4", "Photo dex")]).is_none());
    }

    #[test]
    fn test_trainer_override() {
        assert_eq!(
            parse_trainer_override("My dex\nTrainer:  Ash Ketchum  \n"),
            Some("Ash Ketchum".to_string())
        );
        assert_eq!(parse_trainer_override("Just photos"), None);
        assert_eq!(parse_trainer_override("trainer:"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_lookup_is_cached_case_insensitively() {
        let (source, cache) = setup();

        let first = cache.resolve_user("Red").await.unwrap();
        let second = cache.resolve_user("RED").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.call_counts().find_user, 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        cache.resolve_user("red").await.unwrap();
        assert_eq!(source.call_counts().find_user, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_album_lookup() {
        let (source, cache) = setup();

        let album = cache.resolve_album("1@N01").await.unwrap();
        assert_eq!(album.album_id, "a1");
        assert_eq!(album.trainer_name.as_deref(), Some("Red"));
        assert_eq!(album.photo_count, 1);

        cache.resolve_album("1@N01").await.unwrap();
        assert_eq!(source.call_counts().list_albums, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_album_is_not_found() {
        let source = Arc::new(FixtureSource::new(vec![FixtureUser {
            username: "blue".to_string(),
            user_id: "2@N01".to_string(),
            albums: Vec::new(),
        }]));
        let cache = LookupCache::new(source, LookupTtl::default());

        let err = cache.resolve_album("2@N01").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(cache.entries().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_requery() {
        let (source, cache) = setup();

        cache.resolve_user("Red").await.unwrap();
        cache.resolve_album("1@N01").await.unwrap();
        let keys: Vec<String> = cache.entries().await.into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["findUser:red", "findAlbumId:1@N01"]);

        cache.invalidate("rEd", None).await;
        assert!(cache.entries().await.is_empty());

        cache.resolve_user("Red").await.unwrap();
        cache.resolve_album("1@N01").await.unwrap();
        assert_eq!(source.call_counts().find_user, 2);
        assert_eq!(source.call_counts().list_albums, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_with_uncached_user() {
        let source = Arc::new(FixtureSource::new(vec![fixture_user("Red", "1@N01", "a1")]));
        let ttl = LookupTtl {
            user: Duration::ZERO,
            album: Duration::from_secs(60),
        };
        let cache = LookupCache::new(source.clone(), ttl);

        let user = cache.resolve_user("Red").await.unwrap();
        cache.resolve_album(&user.user_id).await.unwrap();
        let keys: Vec<String> = cache.entries().await.into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["findAlbumId:1@N01"]);

        cache.invalidate("Red", Some(&user.user_id)).await;
        assert!(cache.entries().await.is_empty());

        cache.resolve_album("1@N01").await.unwrap();
        assert_eq!(source.call_counts().list_albums, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_unknown_user_is_noop() {
        let (_, cache) = setup();
        cache.resolve_album("1@N01").await.unwrap();

        cache.invalidate("nobody", None).await;
        assert_eq!(cache.entries().await.len(), 1);

        cache.clear().await;
        assert!(cache.entries().await.is_empty());
    }
}
