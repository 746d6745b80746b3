pub mod capacity;
pub mod routing;
