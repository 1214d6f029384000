use super::{Action, Direction, Key, KeyTracker, Modifiers, SnapIndex, Swipe};
use crate::catalog::CatalogNumber;
use crate::photos::PhotoMap;
use std::{collections::HashMap, time::Duration};
use tracing::debug;

/// How long transient transition markers stay applied.
pub const TRANSITION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Previous,
    Current,
    Next,
}

impl From<Direction> for Slot {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Previous => Slot::Previous,
            Direction::Next => Slot::Next,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotImage {
    pub url: String,
    /// The number has more than one form to cycle through.
    pub multiform: bool,
}

/// A change for the view layer to apply, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Point a slot at an image, or blank it.
    SetImage {
        slot: Slot,
        image: Option<SlotImage>,
    },
    /// Shift the slots one step: the image in the `Slot::from(direction)`
    /// slot becomes current, the old current moves to the opposite slot and
    /// the slot in `direction` is recreated empty.
    Slide(Direction),
    /// Briefly show the current image in the `away` slot, then move it back.
    Bounce { away: Slot, clear_after: Duration },
    /// Mark the current image as changing form until `clear_after` elapses.
    FormChange { clear_after: Duration },
    Show,
    Hide,
    LockScroll { offset: f64 },
    RestoreScroll { offset: f64 },
    /// Replace the location fragment without adding a history entry.
    ReplaceFragment(Option<CatalogNumber>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The location fragment changed from outside, including at page load.
    FragmentChanged { fragment: String, scroll_offset: f64 },
    /// A thumbnail or script asked for a number.
    Navigate {
        number: CatalogNumber,
        scroll_offset: f64,
    },
    KeyDown { code: u32, modifiers: Modifiers },
    KeyUp { code: u32 },
    Swipe(Swipe),
    ImageClicked,
    BackgroundClicked,
    CloseClicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryState {
    Closed,
    Open { current: CatalogNumber },
}

/// Reads a `#NNN` fragment. Anything else means "closed".
pub fn parse_fragment(fragment: &str) -> Option<CatalogNumber> {
    strip_hash(fragment).parse().ok()
}

fn strip_hash(fragment: &str) -> &str {
    fragment.strip_prefix('#').unwrap_or(fragment)
}

/// Full-screen viewer over a trainer's photo map.
///
/// The controller owns the viewer state and never touches a page itself:
/// each event yields the effects a view layer must apply.
#[derive(Debug, Clone)]
pub struct GalleryController {
    photo_map: PhotoMap,
    index: SnapIndex,
    state: GalleryState,
    forms: HashMap<CatalogNumber, usize>,
    keys: KeyTracker,
    locked_scroll: Option<f64>,
}

impl GalleryController {
    pub fn new(photo_map: PhotoMap) -> Self {
        Self {
            index: SnapIndex::from_photo_map(&photo_map),
            photo_map,
            state: GalleryState::Closed,
            forms: HashMap::new(),
            keys: KeyTracker::default(),
            locked_scroll: None,
        }
    }

    /// Builds a controller from the photo map embedded in a page.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn state(&self) -> GalleryState {
        self.state
    }

    pub fn current(&self) -> Option<CatalogNumber> {
        match self.state {
            GalleryState::Open { current } => Some(current),
            GalleryState::Closed => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.current().is_some()
    }

    pub fn index(&self) -> &SnapIndex {
        &self.index
    }

    /// Form shown for `number`; zero until it has been cycled.
    pub fn form_index(&self, number: CatalogNumber) -> usize {
        self.forms.get(&number).copied().unwrap_or(0)
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::FragmentChanged {
                fragment,
                scroll_offset,
            } => {
                let requested = parse_fragment(&fragment);
                let has_fragment = !strip_hash(&fragment).is_empty();
                if requested.is_some() && requested == self.current() {
                    return Vec::new();
                }
                match requested.filter(|n| self.index.contains(*n)) {
                    Some(number) => self.open(number, scroll_offset),
                    None if self.is_open() || has_fragment => self.close(),
                    None => Vec::new(),
                }
            }
            Event::Navigate {
                number,
                scroll_offset,
            } => {
                if self.current() == Some(number) {
                    Vec::new()
                } else if self.index.contains(number) {
                    self.open(number, scroll_offset)
                } else {
                    self.close()
                }
            }
            Event::KeyDown { code, modifiers } => {
                match self.keys.press(Key::from_code(code), modifiers) {
                    Some(Action::Slide(direction)) => self.slide(direction),
                    Some(Action::CycleForm(direction)) => self.cycle_form(direction),
                    Some(Action::Close) => self.close(),
                    None => Vec::new(),
                }
            }
            Event::KeyUp { code } => {
                self.keys.release(Key::from_code(code));
                Vec::new()
            }
            Event::Swipe(swipe) => self.slide(swipe.direction()),
            Event::ImageClicked => self.cycle_form(Direction::Next),
            Event::BackgroundClicked | Event::CloseClicked => self.close(),
        }
    }

    /// Shows `number` with its neighbours preloaded. Unknown numbers close
    /// the viewer.
    pub fn open(&mut self, number: CatalogNumber, scroll_offset: f64) -> Vec<Effect> {
        if !self.index.contains(number) {
            return self.close();
        }

        let was_open = self.is_open();
        self.state = GalleryState::Open { current: number };
        debug!(number = %number, "Opening viewer");

        let mut effects = vec![Effect::ReplaceFragment(Some(number))];
        effects.push(self.set_image(Slot::Current, Some(number)));
        effects.push(self.set_image(Slot::Previous, self.index.previous(number)));
        effects.push(self.set_image(Slot::Next, self.index.next(number)));

        if self.locked_scroll.is_none() {
            self.locked_scroll = Some(scroll_offset);
            effects.push(Effect::LockScroll {
                offset: scroll_offset,
            });
        }
        if !was_open {
            effects.push(Effect::Show);
        }
        effects
    }

    /// Closes the viewer, forgetting cycled forms. The fragment is cleared
    /// even when the viewer was already closed.
    pub fn close(&mut self) -> Vec<Effect> {
        let was_open = self.is_open();
        self.state = GalleryState::Closed;
        self.forms.clear();

        let mut effects = vec![
            Effect::ReplaceFragment(None),
            Effect::SetImage {
                slot: Slot::Previous,
                image: None,
            },
            Effect::SetImage {
                slot: Slot::Current,
                image: None,
            },
            Effect::SetImage {
                slot: Slot::Next,
                image: None,
            },
        ];
        if let Some(offset) = self.locked_scroll.take() {
            effects.push(Effect::RestoreScroll { offset });
        }
        if was_open {
            debug!("Closing viewer");
            effects.push(Effect::Hide);
        }
        effects
    }

    /// Moves to the adjacent snapped number, or bounces at either end.
    pub fn slide(&mut self, direction: Direction) -> Vec<Effect> {
        let Some(current) = self.current() else {
            return Vec::new();
        };

        let Some(target) = self.index.neighbor(current, direction) else {
            return vec![Effect::Bounce {
                away: direction.opposite().into(),
                clear_after: TRANSITION,
            }];
        };

        self.state = GalleryState::Open { current: target };
        vec![
            Effect::ReplaceFragment(Some(target)),
            Effect::Slide(direction),
            self.set_image(direction.into(), self.index.neighbor(target, direction)),
        ]
    }

    /// Steps the current number's form, wrapping at both ends.
    pub fn cycle_form(&mut self, direction: Direction) -> Vec<Effect> {
        let Some(current) = self.current() else {
            return Vec::new();
        };
        let count = self.photo_map.get(&current).map_or(0, Vec::len);
        if count == 0 {
            return Vec::new();
        }

        let form = self.form_index(current);
        let next = match direction {
            Direction::Next => (form + 1) % count,
            Direction::Previous => (form + count - 1) % count,
        };
        self.forms.insert(current, next);

        vec![
            self.set_image(Slot::Current, Some(current)),
            Effect::FormChange {
                clear_after: TRANSITION,
            },
        ]
    }

    fn set_image(&self, slot: Slot, number: Option<CatalogNumber>) -> Effect {
        let image = number.and_then(|number| {
            let forms = self.photo_map.get(&number)?;
            let form = forms.get(self.form_index(number)).or_else(|| forms.first())?;
            Some(SlotImage {
                url: form.gallery_url.clone(),
                multiform: forms.len() > 1,
            })
        });
        Effect::SetImage { slot, image }
    }
}
