use super::Direction;
use crate::catalog::CatalogNumber;
use crate::photos::PhotoMap;

/// Sorted snapped numbers with neighbour lookup, built once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapIndex {
    numbers: Vec<CatalogNumber>,
}

impl SnapIndex {
    pub fn new(numbers: impl IntoIterator<Item = CatalogNumber>) -> Self {
        let mut numbers: Vec<CatalogNumber> = numbers.into_iter().collect();
        numbers.sort_unstable();
        numbers.dedup();
        Self { numbers }
    }

    pub fn from_photo_map(photo_map: &PhotoMap) -> Self {
        Self::new(
            photo_map
                .iter()
                .filter(|(_, forms)| !forms.is_empty())
                .map(|(number, _)| *number),
        )
    }

    pub fn contains(&self, number: CatalogNumber) -> bool {
        self.numbers.binary_search(&number).is_ok()
    }

    pub fn previous(&self, number: CatalogNumber) -> Option<CatalogNumber> {
        let position = self.numbers.binary_search(&number).ok()?;
        position.checked_sub(1).map(|i| self.numbers[i])
    }

    pub fn next(&self, number: CatalogNumber) -> Option<CatalogNumber> {
        let position = self.numbers.binary_search(&number).ok()?;
        self.numbers.get(position + 1).copied()
    }

    pub fn neighbor(&self, number: CatalogNumber, direction: Direction) -> Option<CatalogNumber> {
        match direction {
            Direction::Previous => self.previous(number),
            Direction::Next => self.next(number),
        }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = CatalogNumber> + '_ {
        self.numbers.iter().copied()
    }
}
