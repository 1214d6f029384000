use crate::photos::PhotoRecord;
use crate::source::{AlbumSummary, FlickrConfig, PhotoPage, PhotoSource, SourceError, UserRef};
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

/// Extra photo fields requested from `flickr.photosets.getPhotos`.
const PHOTO_EXTRAS: &str = "url_m,url_l";

/// Flickr REST client speaking the JSON flavour of the API.
pub struct FlickrSource {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl FlickrSource {
    pub fn new(config: &FlickrConfig) -> Result<Self, SourceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SourceError::ConfigError("missing Flickr API key".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("photodex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: config.endpoint.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        debug!(method = %method, "Calling Flickr API");

        let body: serde_json::Value = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("method", method),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
                ("nojsoncallback", "1"),
            ])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_envelope(body)
    }
}

#[async_trait]
impl PhotoSource for FlickrSource {
    async fn find_user(&self, username: &str) -> Result<UserRef, SourceError> {
        let response: FindUserResponse = self
            .call("flickr.people.findByUsername", &[("username", username)])
            .await?;

        Ok(UserRef {
            user_id: response.user.nsid,
            username: response.user.username.content,
        })
    }

    async fn list_albums(&self, user_id: &str) -> Result<Vec<AlbumSummary>, SourceError> {
        let response: AlbumListResponse = self
            .call("flickr.photosets.getList", &[("user_id", user_id)])
            .await?;

        Ok(response
            .photosets
            .photoset
            .into_iter()
            .map(WireAlbum::into_summary)
            .collect())
    }

    async fn album_photos(
        &self,
        user_id: &str,
        album_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<PhotoPage, SourceError> {
        let page_param = page.to_string();
        let per_page_param = per_page.to_string();
        let response: AlbumPhotosResponse = self
            .call(
                "flickr.photosets.getPhotos",
                &[
                    ("user_id", user_id),
                    ("photoset_id", album_id),
                    ("extras", PHOTO_EXTRAS),
                    ("page", &page_param),
                    ("per_page", &per_page_param),
                ],
            )
            .await?;

        Ok(response.photoset.into_page())
    }

    fn name(&self) -> &str {
        "Flickr"
    }
}

/// Unwraps Flickr's `stat` envelope; error code 1 is Flickr's "not found".
fn parse_envelope<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, SourceError> {
    if body.get("stat").and_then(|s| s.as_str()) == Some("fail") {
        let code = body.get("code").and_then(|c| c.as_i64()).unwrap_or_default();
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(if code == 1 {
            SourceError::NotFound(message)
        } else {
            SourceError::Api { code, message }
        });
    }

    serde_json::from_value(body).map_err(|e| SourceError::InvalidResponse(e.to_string()))
}

#[derive(Deserialize)]
struct Content {
    #[serde(rename = "_content", default)]
    content: String,
}

#[derive(Deserialize)]
struct FindUserResponse {
    user: WireUser,
}

#[derive(Deserialize)]
struct WireUser {
    nsid: String,
    username: Content,
}

#[derive(Deserialize)]
struct AlbumListResponse {
    photosets: WireAlbumList,
}

#[derive(Deserialize)]
struct WireAlbumList {
    #[serde(default)]
    photoset: Vec<WireAlbum>,
}

#[derive(Deserialize)]
struct WireAlbum {
    id: String,
    title: Content,
    #[serde(default)]
    description: Option<Content>,
    #[serde(default)]
    photos: Option<FlexNumber>,
}

impl WireAlbum {
    fn into_summary(self) -> AlbumSummary {
        AlbumSummary {
            id: self.id,
            title: self.title.content,
            description: self.description.map(|d| d.content).unwrap_or_default(),
            photo_count: self.photos.map(|p| p.value()).unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct AlbumPhotosResponse {
    photoset: WirePhotoPage,
}

#[derive(Deserialize)]
struct WirePhotoPage {
    #[serde(default)]
    photo: Vec<WirePhoto>,
    page: FlexNumber,
    pages: FlexNumber,
    total: FlexNumber,
}

impl WirePhotoPage {
    fn into_page(self) -> PhotoPage {
        PhotoPage {
            photos: self
                .photo
                .into_iter()
                .filter_map(WirePhoto::into_record)
                .collect(),
            page: self.page.value(),
            pages: self.pages.value(),
            total: self.total.value(),
        }
    }
}

#[derive(Deserialize)]
struct WirePhoto {
    #[serde(default)]
    title: String,
    #[serde(default)]
    isprimary: Option<FlexNumber>,
    url_m: Option<String>,
    width_m: Option<FlexNumber>,
    height_m: Option<FlexNumber>,
    url_l: Option<String>,
}

impl WirePhoto {
    /// Photos without a medium rendition cannot be shown and are dropped.
    fn into_record(self) -> Option<PhotoRecord> {
        let Some(thumb_url) = self.url_m else {
            debug!(title = %self.title, "Dropping photo without medium URL");
            return None;
        };

        Some(PhotoRecord {
            full_url: self.url_l.unwrap_or_else(|| thumb_url.clone()),
            thumb_url,
            width: self.width_m.map(|w| w.value()).unwrap_or_default(),
            height: self.height_m.map(|h| h.value()).unwrap_or_default(),
            is_primary: self.isprimary.is_some_and(|p| p.value() == 1),
            title: self.title,
        })
    }
}

/// Flickr sends counts and dimensions as numbers or strings depending on the method.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlexNumber {
    Number(u64),
    Text(String),
}

impl FlexNumber {
    fn value(&self) -> u32 {
        match self {
            FlexNumber::Number(n) => u32::try_from(*n).unwrap_or(u32::MAX),
            FlexNumber::Text(s) => s.trim().parse().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_envelope_maps_to_errors() {
        let missing = json!({"stat": "fail", "code": 1, "message": "User not found"});
        let err = parse_envelope::<FindUserResponse>(missing).err().unwrap();
        assert!(err.is_not_found());

        let bad_key = json!({"stat": "fail", "code": 100, "message": "Invalid API Key"});
        match parse_envelope::<FindUserResponse>(bad_key) {
            Err(SourceError::Api { code, message }) => {
                assert_eq!(code, 100);
                assert_eq!(message, "Invalid API Key");
            }
            _ => panic!("expected API error"),
        }
    }

    #[test]
    fn test_find_user_response() {
        let body = json!({
            "user": {"id": "1234@N01", "nsid": "1234@N01", "username": {"_content": "AshK"}},
            "stat": "ok"
        });
        let response: FindUserResponse = parse_envelope(body).unwrap();
        assert_eq!(response.user.nsid, "1234@N01");
        assert_eq!(response.user.username.content, "AshK");
    }

    #[test]
    fn test_album_list_response() {
        let body = json!({
            "photosets": {
                "page": 1,
                "photoset": [
                    {"id": "721", "photos": 12, "title": {"_content": "Photódex"},
                     "description": {"_content": "trainer: Ash"}},
                    {"id": "722", "photos": "3", "title": {"_content": "Holiday"}}
                ]
            },
            "stat": "ok"
        });
        let response: AlbumListResponse = parse_envelope(body).unwrap();
        let albums: Vec<AlbumSummary> = response
            .photosets
            .photoset
            .into_iter()
            .map(WireAlbum::into_summary)
            .collect();

        assert_eq!(albums.len(), 2);
        assert_eq!(albums[0].title, "Photódex");
        assert_eq!(albums[0].description, "trainer: Ash");
        assert_eq!(albums[0].photo_count, 12);
        assert_eq!(albums[1].description, "");
        assert_eq!(albums[1].photo_count, 3);
    }

    #[test]
    fn test_album_photos_response() {
        let body = json!({
            "photoset": {
                "id": "721",
                "photo": [
                    {"id": "1", "title": "025 Pikachu", "isprimary": "1",
                     "url_m": "https://live.example/1_m.jpg", "width_m": "500", "height_m": 375,
                     "url_l": "https://live.example/1_b.jpg"},
                    {"id": "2", "title": "small", "isprimary": "0",
                     "url_m": "https://live.example/2_m.jpg", "width_m": 240, "height_m": 240},
                    {"id": "3", "title": "no renditions", "isprimary": "0"}
                ],
                "page": 2, "pages": "3", "perpage": 500, "total": "1002"
            },
            "stat": "ok"
        });
        let response: AlbumPhotosResponse = parse_envelope(body).unwrap();
        let page = response.photoset.into_page();

        assert_eq!((page.page, page.pages, page.total), (2, 3, 1002));
        assert_eq!(page.photos.len(), 2);

        let first = &page.photos[0];
        assert!(first.is_primary);
        assert_eq!((first.width, first.height), (500, 375));
        assert_eq!(first.full_url, "https://live.example/1_b.jpg");

        let second = &page.photos[1];
        assert!(!second.is_primary);
        assert_eq!(second.full_url, second.thumb_url);
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = FlickrConfig::default();
        assert!(matches!(
            FlickrSource::new(&config),
            Err(SourceError::ConfigError(_))
        ));

        let config = FlickrConfig {
            api_key: Some("key".to_string()),
            ..FlickrConfig::default()
        };
        let source = FlickrSource::new(&config).unwrap();
        assert_eq!(source.name(), "Flickr");
        assert_eq!(
            source.album_url("1234@N01", "721"),
            "https://www.flickr.com/photos/1234%40N01/albums/721"
        );
    }
}
