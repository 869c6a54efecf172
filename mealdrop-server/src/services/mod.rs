//! Business workflows built on the db layer

pub mod placement;
pub mod reconcile;
pub mod revenue;
