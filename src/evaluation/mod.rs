pub mod evaluator;
pub mod strength;

pub use evaluator::{evaluate, HandRanker};
pub use strength::Strength;
