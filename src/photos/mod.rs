// Photo module - turns album photos into catalog forms
mod mapper;
mod title;
mod types;

pub use mapper::{crop_offset, map_photos, select_preview};
pub use title::{ParsedTitle, parse_title};
pub use types::*;
