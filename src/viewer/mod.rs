// Viewer module - the full-screen snap viewer driven by fragment, keys and swipes
mod controller;
mod index;
mod input;

pub use controller::{
    Effect, Event, GalleryController, GalleryState, Slot, SlotImage, TRANSITION, parse_fragment,
};
pub use index::SnapIndex;
pub use input::{Action, Direction, Key, KeyTracker, Modifiers, Swipe};
