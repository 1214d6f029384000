// Cache module - time-boxed memoization for lookups and rendered pages
mod expiring;
mod lookup;

pub use expiring::{EntryInfo, ExpiringCache};
pub use lookup::{
    AlbumRef, LookupCache, LookupTtl, album_key, find_photodex_album, parse_trainer_override,
    user_key,
};

/// Rendered HTML keyed by request path.
pub type PageCache = ExpiringCache<String>;
