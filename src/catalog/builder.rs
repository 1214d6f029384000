use super::{Catalog, CatalogNumber};
use crate::photos::{FormEntry, PhotoMap};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DexEntry {
    pub number: CatalogNumber,
    pub forms: Vec<FormEntry>,
    pub unobtainable: bool,
}

impl DexEntry {
    pub fn is_snapped(&self) -> bool {
        !self.forms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub region: String,
    pub entries: Vec<DexEntry>,
}

/// Lays the photo map out over every catalog region.
///
/// Each region keeps its interior gaps as empty placeholders so the grid
/// stays positional, but loses the empty tail after its last snap. Regions
/// left without entries are dropped.
pub fn build_regions(catalog: &Catalog, photo_map: &PhotoMap) -> Vec<Region> {
    catalog
        .ranges()
        .iter()
        .filter_map(|range| {
            let mut entries: Vec<DexEntry> = range
                .numbers()
                .map(|number| DexEntry {
                    number,
                    forms: photo_map.get(&number).cloned().unwrap_or_default(),
                    unobtainable: catalog.is_unobtainable(number),
                })
                .collect();

            let kept = entries
                .iter()
                .rposition(DexEntry::is_snapped)
                .map_or(0, |last| last + 1);
            entries.truncate(kept);

            (!entries.is_empty()).then(|| Region {
                region: range.region.clone(),
                entries,
            })
        })
        .collect()
}
