//! Error taxonomy shared by every component. Hand-rolled rather than
//! `thiserror`-derived: the donor crate never pulls that dependency in,
//! so neither do we.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    /// a method was called in the wrong lifecycle phase, e.g. `Apply` at a
    /// chance node, `AwardPot` while still `in_progress`, `NewHand` with a
    /// non-zero pot, `PostStraddles` outside the preflop chance node.
    InvalidPhase(String),
    /// a legal-move predicate failed: `Fold` when `!CanFold`, an illegally
    /// sized `Bet`, `CheckCall` when `!CanCheckCall`.
    InvalidMove(String),
    /// a Scribe file was opened against mismatched `kPlayers`/`kActions`.
    InvalidSnapshot { field: &'static str, expected: u64, found: u64 },
    /// two Averages were battled with differing action abstractions.
    IncompatibleAbstraction(String),
    /// an internal invariant broke (Hamilton apportionment over-awarded, etc).
    /// Always indicates a bug upstream, never a user error.
    Internal(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPhase(msg) => write!(f, "invalid phase: {msg}"),
            Self::InvalidMove(msg) => write!(f, "invalid move: {msg}"),
            Self::InvalidSnapshot { field, expected, found } => write!(
                f,
                "snapshot mismatch on {field}: expected {expected}, found {found}"
            ),
            Self::IncompatibleAbstraction(msg) => write!(f, "incompatible abstraction: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for SolverError {}

pub type Result<T> = std::result::Result<T, SolverError>;
