use crate::photos::PhotoRecord;
use serde::{Deserialize, Serialize};

/// A resolved account on the photo host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRef {
    pub user_id: String,
    /// The username as the host spells it, which may differ in case from the request.
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlbumSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photo_count: u32,
}

/// One page of an album listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPage {
    pub photos: Vec<PhotoRecord>,
    pub page: u32,
    pub pages: u32,
    pub total: u32,
}
