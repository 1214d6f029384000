// Catalog module - the fixed numbered domain photos are mapped onto
mod builder;

pub use builder::{DexEntry, Region, build_regions};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{collections::BTreeSet, fmt, str::FromStr};
use thiserror::Error;

/// Highest number a 3-digit key can express.
pub const MAX_NUMBER: u16 = 999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Invalid catalog number: {0}")]
    InvalidNumber(String),

    #[error("Catalog has no regions")]
    Empty,

    #[error("Region '{region}' has an invalid range {start}..={end}")]
    InvalidRange { region: String, start: u16, end: u16 },

    #[error("Region '{region}' starts at {start}, expected {expected}")]
    NotContiguous {
        region: String,
        start: u16,
        expected: u16,
    },
}

/// A zero-padded 3-digit catalog key ("001".."999").
///
/// Ordering is numeric, which matches the lexicographic order of the
/// padded strings since every key has the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CatalogNumber(u16);

impl CatalogNumber {
    pub fn new(value: u16) -> Option<Self> {
        (1..=MAX_NUMBER).contains(&value).then_some(Self(value))
    }

    pub fn value(self) -> u16 {
        self.0
    }
}

impl fmt::Display for CatalogNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl FromStr for CatalogNumber {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 3 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CatalogError::InvalidNumber(s.to_string()));
        }
        s.parse::<u16>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| CatalogError::InvalidNumber(s.to_string()))
    }
}

impl Serialize for CatalogNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CatalogNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogRange {
    pub region: String,
    pub start: u16,
    pub end: u16,
}

impl CatalogRange {
    pub fn new(region: &str, start: u16, end: u16) -> Self {
        Self {
            region: region.to_string(),
            start,
            end,
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        (self.start..=self.end).contains(&value)
    }

    /// Every number of the range in ascending order.
    pub fn numbers(&self) -> impl Iterator<Item = CatalogNumber> + '_ {
        (self.start..=self.end).filter_map(CatalogNumber::new)
    }
}

/// The ordered generation list plus the numbers nobody can ever snap.
#[derive(Debug, Clone)]
pub struct Catalog {
    ranges: Vec<CatalogRange>,
    unobtainable: BTreeSet<u16>,
}

impl Catalog {
    /// Validates that the ranges start at 1, are non-empty and contiguous.
    pub fn new(
        ranges: Vec<CatalogRange>,
        unobtainable: impl IntoIterator<Item = u16>,
    ) -> Result<Self, CatalogError> {
        if ranges.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut expected = 1;
        for range in &ranges {
            if range.start > range.end || range.end > MAX_NUMBER {
                return Err(CatalogError::InvalidRange {
                    region: range.region.clone(),
                    start: range.start,
                    end: range.end,
                });
            }
            if range.start != expected {
                return Err(CatalogError::NotContiguous {
                    region: range.region.clone(),
                    start: range.start,
                    expected,
                });
            }
            expected = range.end + 1;
        }

        Ok(Self {
            ranges,
            unobtainable: unobtainable.into_iter().collect(),
        })
    }

    /// The built-in generation list.
    pub fn standard() -> Self {
        Self {
            ranges: standard_ranges(),
            unobtainable: STANDARD_UNOBTAINABLE.iter().copied().collect(),
        }
    }

    pub fn ranges(&self) -> &[CatalogRange] {
        &self.ranges
    }

    pub fn contains(&self, number: CatalogNumber) -> bool {
        self.ranges.iter().any(|r| r.contains(number.value()))
    }

    pub fn is_unobtainable(&self, number: CatalogNumber) -> bool {
        self.unobtainable.contains(&number.value())
    }

    pub fn size(&self) -> usize {
        self.ranges
            .iter()
            .map(|r| usize::from(r.end - r.start) + 1)
            .sum()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_ranges() -> Vec<CatalogRange> {
    vec![
        CatalogRange::new("Kanto", 1, 151),
        CatalogRange::new("Johto", 152, 251),
        CatalogRange::new("Hoenn", 252, 386),
        CatalogRange::new("Sinnoh", 387, 493),
        CatalogRange::new("Unova", 494, 649),
        CatalogRange::new("Kalos", 650, 721),
        CatalogRange::new("Alola", 722, 809),
        CatalogRange::new("Galar", 810, 898),
        CatalogRange::new("Hisui", 899, 905),
    ]
}

const STANDARD_UNOBTAINABLE: &[u16] = &[235, 352, 489, 490, 493, 647, 648, 720, 721];
