pub mod cache;
pub mod estimator;
