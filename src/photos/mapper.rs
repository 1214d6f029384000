use super::{FormEntry, MappedPhotos, Orientation, PhotoMap, PhotoRecord, Preview, parse_title};
use crate::catalog::{Catalog, CatalogNumber};
use tracing::debug;

/// Groups an album's photos by catalog number and picks its preview.
///
/// Pure: the same photo list always yields the same map. Photos whose
/// title has no number, or a number outside the catalog, are left out of
/// the map but can still be chosen as preview.
pub fn map_photos(catalog: &Catalog, photos: &[PhotoRecord]) -> MappedPhotos {
    let mut photo_map = PhotoMap::new();

    for photo in photos {
        let parsed = parse_title(&photo.title);

        let Some(number) = parsed
            .number
            .as_deref()
            .and_then(|raw| raw.parse::<CatalogNumber>().ok())
            .filter(|number| catalog.contains(*number))
        else {
            debug!(title = %photo.title, "Skipping photo without a catalog number");
            continue;
        };

        let ratio = aspect_ratio(photo);
        let orientation = if ratio > 1.0 {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        let thumb_crop = match (orientation, parsed.position) {
            (Orientation::Landscape, None) => Some(crop_offset(ratio)),
            _ => None,
        };

        photo_map.entry(number).or_default().push(FormEntry {
            thumb_url: photo.thumb_url.clone(),
            gallery_url: photo.full_url.clone(),
            title: (!photo.title.is_empty()).then(|| photo.title.clone()),
            orientation,
            position: parsed.position,
            thumb_crop,
        });
    }

    MappedPhotos {
        photo_map,
        preview: select_preview(photos),
    }
}

/// The primary photo if one is flagged, otherwise the first photo.
pub fn select_preview(photos: &[PhotoRecord]) -> Option<Preview> {
    photos
        .iter()
        .find(|photo| photo.is_primary)
        .or_else(|| photos.first())
        .map(|photo| Preview {
            url: photo.full_url.clone(),
            thumb_url: photo.thumb_url.clone(),
        })
}

/// Percentage to shift a square-cropped landscape thumbnail so it stays centered.
pub fn crop_offset(ratio: f64) -> f64 {
    ((ratio - 1.0) / 2.0) * 100.0
}

fn aspect_ratio(photo: &PhotoRecord) -> f64 {
    if photo.height == 0 {
        return 1.0;
    }
    f64::from(photo.width) / f64::from(photo.height)
}
