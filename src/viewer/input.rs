use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Previous => Self::Next,
            Self::Next => Self::Previous,
        }
    }
}

/// Keys the viewer reacts to, identified by DOM key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Up,
    Right,
    Down,
    Escape,
    Other(u32),
}

impl Key {
    pub fn from_code(code: u32) -> Self {
        match code {
            37 => Self::Left,
            38 => Self::Up,
            39 => Self::Right,
            40 => Self::Down,
            27 => Self::Escape,
            other => Self::Other(other),
        }
    }

    pub fn action(self) -> Option<Action> {
        match self {
            Self::Left => Some(Action::Slide(Direction::Previous)),
            Self::Right => Some(Action::Slide(Direction::Next)),
            Self::Up => Some(Action::CycleForm(Direction::Previous)),
            Self::Down => Some(Action::CycleForm(Direction::Next)),
            Self::Escape => Some(Action::Close),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Slide(Direction),
    CycleForm(Direction),
    Close,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn any(self) -> bool {
        self.alt || self.ctrl || self.meta || self.shift
    }
}

/// Horizontal swipe, named by the finger's travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Left,
    Right,
}

impl Swipe {
    pub fn direction(self) -> Direction {
        match self {
            Self::Right => Direction::Previous,
            Self::Left => Direction::Next,
        }
    }
}

/// Suppresses auto-repeat: a key acts once until it is released.
#[derive(Debug, Clone, Default)]
pub struct KeyTracker {
    down: HashSet<Key>,
}

impl KeyTracker {
    /// Returns the key's action for a fresh, unmodified press.
    ///
    /// A held key stays blocked even if modifiers change. Modified presses
    /// are not recorded, so they never block a later plain press.
    pub fn press(&mut self, key: Key, modifiers: Modifiers) -> Option<Action> {
        if self.down.contains(&key) || modifiers.any() {
            return None;
        }
        self.down.insert(key);
        key.action()
    }

    pub fn release(&mut self, key: Key) {
        self.down.remove(&key);
    }
}
