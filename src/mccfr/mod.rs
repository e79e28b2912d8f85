pub mod average;
pub mod regret;
pub mod strategy;

pub use average::Average;
pub use strategy::Strategy;
