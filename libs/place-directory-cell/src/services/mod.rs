pub mod directory;
pub mod geocode;
pub mod overpass;
