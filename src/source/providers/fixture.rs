use crate::photos::PhotoRecord;
use crate::source::{AlbumSummary, PhotoPage, PhotoSource, SourceError, UserRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub users: Vec<FixtureUser>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixtureUser {
    pub username: String,
    pub user_id: String,
    #[serde(default)]
    pub albums: Vec<FixtureAlbum>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixtureAlbum {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photos: Vec<PhotoRecord>,
}

/// How many times each source method has been called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub find_user: usize,
    pub list_albums: usize,
    pub album_photos: usize,
}

/// In-memory photo host for offline runs and tests.
///
/// Users can be swapped at runtime to simulate renames and deleted albums.
pub struct FixtureSource {
    users: RwLock<Vec<FixtureUser>>,
    find_user_calls: AtomicUsize,
    list_albums_calls: AtomicUsize,
    album_photos_calls: AtomicUsize,
}

impl FixtureSource {
    pub fn new(users: Vec<FixtureUser>) -> Self {
        Self {
            users: RwLock::new(users),
            find_user_calls: AtomicUsize::new(0),
            list_albums_calls: AtomicUsize::new(0),
            album_photos_calls: AtomicUsize::new(0),
        }
    }

    pub async fn from_file(path: &Path) -> Result<Self, SourceError> {
        let content = tokio::fs::read_to_string(path).await?;
        let fixture: FixtureFile = toml_edit::de::from_str(&content).map_err(|e| {
            SourceError::ConfigError(format!("invalid fixture {:?}: {}", path, e))
        })?;

        info!(
            "Loaded photo fixture {:?} with {} users",
            path,
            fixture.users.len()
        );
        Ok(Self::new(fixture.users))
    }

    pub async fn replace_users(&self, users: Vec<FixtureUser>) {
        *self.users.write().await = users;
    }

    pub fn call_counts(&self) -> CallCounts {
        CallCounts {
            find_user: self.find_user_calls.load(Ordering::Relaxed),
            list_albums: self.list_albums_calls.load(Ordering::Relaxed),
            album_photos: self.album_photos_calls.load(Ordering::Relaxed),
        }
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl PhotoSource for FixtureSource {
    async fn find_user(&self, username: &str) -> Result<UserRef, SourceError> {
        self.find_user_calls.fetch_add(1, Ordering::Relaxed);
        debug!(username = %username, "Fixture user lookup");

        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .map(|u| UserRef {
                user_id: u.user_id.clone(),
                username: u.username.clone(),
            })
            .ok_or_else(|| SourceError::NotFound("User not found".to_string()))
    }

    async fn list_albums(&self, user_id: &str) -> Result<Vec<AlbumSummary>, SourceError> {
        self.list_albums_calls.fetch_add(1, Ordering::Relaxed);

        let users = self.users.read().await;
        let user = users
            .iter()
            .find(|u| u.user_id == user_id)
            .ok_or_else(|| SourceError::NotFound("User not found".to_string()))?;

        Ok(user
            .albums
            .iter()
            .map(|album| AlbumSummary {
                id: album.id.clone(),
                title: album.title.clone(),
                description: album.description.clone(),
                photo_count: u32::try_from(album.photos.len()).unwrap_or(u32::MAX),
            })
            .collect())
    }

    async fn album_photos(
        &self,
        user_id: &str,
        album_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<PhotoPage, SourceError> {
        self.album_photos_calls.fetch_add(1, Ordering::Relaxed);

        let users = self.users.read().await;
        let album = users
            .iter()
            .filter(|u| u.user_id == user_id)
            .flat_map(|u| u.albums.iter())
            .find(|a| a.id == album_id)
            .ok_or_else(|| SourceError::NotFound("Photoset not found".to_string()))?;

        let per_page = per_page.max(1) as usize;
        let total = album.photos.len();
        let start = (page.max(1) as usize - 1) * per_page;
        let photos = album
            .photos
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();

        Ok(PhotoPage {
            photos,
            page: page.max(1),
            pages: u32::try_from(total.div_ceil(per_page).max(1)).unwrap_or(u32::MAX),
            total: u32::try_from(total).unwrap_or(u32::MAX),
        })
    }

    fn name(&self) -> &str {
        "Fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FIXTURE: &str = r#"
[[users]]
username = "Misty"
user_id = "42@N01"

[[users.albums]]
id = "900"
title = "Photodex"
description = "trainer: Misty of Cerulean"

[[users.albums.photos]]
title = "120 Staryu"
thumb_url = "https://img.example/120_m.jpg"
full_url = "https://img.example/120_l.jpg"
width = 500
height = 375

[[users.albums.photos]]
title = "121 Starmie"
thumb_url = "https://img.example/121_m.jpg"
full_url = "https://img.example/121_l.jpg"
width = 375
height = 500
is_primary = true
"#;

    #[tokio::test]
    async fn test_fixture_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fixture.toml");
        std::fs::write(&path, FIXTURE).unwrap();

        let source = FixtureSource::from_file(&path).await.unwrap();
        let user = source.find_user("MISTY").await.unwrap();
        assert_eq!(user.user_id, "42@N01");
        assert_eq!(user.username, "Misty");

        let albums = source.list_albums(&user.user_id).await.unwrap();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].photo_count, 2);

        let page = source.album_photos("42@N01", "900", 1, 500).await.unwrap();
        assert_eq!(page.photos.len(), 2);
        assert!(page.photos[1].is_primary);
        assert!(!page.photos[0].is_primary);

        assert_eq!(
            source.call_counts(),
            CallCounts {
                find_user: 1,
                list_albums: 1,
                album_photos: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_fixture_pagination() {
        let photos = (1..=5)
            .map(|n| PhotoRecord {
                title: format!("{:03}", n),
                thumb_url: format!("{}_m", n),
                full_url: format!("{}_l", n),
                width: 10,
                height: 10,
                is_primary: false,
            })
            .collect();
        let source = FixtureSource::new(vec![FixtureUser {
            username: "brock".to_string(),
            user_id: "7".to_string(),
            albums: vec![FixtureAlbum {
                id: "a".to_string(),
                title: "Photódex".to_string(),
                description: String::new(),
                photos,
            }],
        }]);

        let second = source.album_photos("7", "a", 2, 2).await.unwrap();
        assert_eq!((second.page, second.pages, second.total), (2, 3, 5));
        let titles: Vec<&str> = second.photos.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["003", "004"]);

        let last = source.album_photos("7", "a", 3, 2).await.unwrap();
        assert_eq!(last.photos.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let source = FixtureSource::default();
        assert!(source.find_user("nobody").await.unwrap_err().is_not_found());
        assert!(source.list_albums("0").await.unwrap_err().is_not_found());
    }
}
