pub mod error;
pub mod geo;

pub use error::AppError;
pub use geo::Coordinates;
