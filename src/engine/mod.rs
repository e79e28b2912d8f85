//! The authoritative no-limit hold'em game tree: blinds/antes/straddles,
//! legal-move predicates, state transitions, and pot settlement. Everything
//! else in the crate (sequence abstraction, MCCFR, the commander) drives a
//! [`node::Node`] rather than reimplementing its rules.

pub mod action;
pub mod deck;
pub mod node;
pub mod pot;
pub mod round;

pub use action::{AbstractAction, Action, Play};
pub use deck::{Deck, DeckState};
pub use node::Node;
pub use round::Round;
