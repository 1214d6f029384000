pub mod fixture;
pub mod flickr;
