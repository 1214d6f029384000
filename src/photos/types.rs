use crate::catalog::CatalogNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A photo as delivered by the photo source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PhotoRecord {
    pub title: String,
    pub thumb_url: String,
    pub full_url: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
}

/// Where a thumbnail should anchor when it is cropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    Bottom,
    Left,
    Right,
}

impl Position {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn from_arrow(arrow: char) -> Option<Self> {
        match arrow {
            '↑' => Some(Self::Top),
            '↓' => Some(Self::Bottom),
            '←' => Some(Self::Left),
            '→' => Some(Self::Right),
            _ => None,
        }
    }
}

/// One photo mapped onto a catalog number.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormEntry {
    pub thumb_url: String,
    pub gallery_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub orientation: Orientation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Horizontal recentering offset, in percent, for landscape thumbnails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_crop: Option<f64>,
}

/// Catalog number to its forms, in source encounter order.
pub type PhotoMap = BTreeMap<CatalogNumber, Vec<FormEntry>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub url: String,
    pub thumb_url: String,
}

/// Output of the photo mapper for one album.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedPhotos {
    pub photo_map: PhotoMap,
    pub preview: Option<Preview>,
}

impl MappedPhotos {
    /// Number of distinct catalog numbers with at least one photo.
    pub fn snap_count(&self) -> usize {
        self.photo_map.len()
    }
}
