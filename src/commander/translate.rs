//! Pseudo-harmonic bet-size mapping (PS-HAR) and the abstract bet-size
//! enumeration rules spec §4.6 describes, both expressed in pot-proportion
//! units rather than chips.

use crate::engine::{Node, Play};
use crate::sequence::{SequenceId, SequenceTable};
use crate::Chips;
use rand::Rng;

/// probability of mapping `x ∈ [a,b]` to `a` rather than `b`.
/// `f(a,b,a)=1, f(a,b,b)=0`; `a==b` degenerates to probability 1.
pub fn ps_har_probability(a: f64, b: f64, x: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        return 1.0;
    }
    (((b - x) * (1.0 + a)) / ((b - a) * (1.0 + x))).clamp(0.0, 1.0)
}

pub fn chips_to_proportion(pot: Chips, chips: Chips) -> f64 {
    if pot <= 0 {
        return f64::INFINITY;
    }
    chips as f64 / pot as f64
}

#[derive(Clone, Copy)]
pub struct SizeCandidate {
    pub action_idx: usize,
    pub size: f64,
}

/// builds the ordered list of `(action_idx, pot_proportion)` pairs the
/// abstraction offers at `(node.round(), seq)`, per the enumeration rules:
/// Fold is skipped, CheckCall is only a sizeable candidate for probing a
/// check on the first action of the round, AllIn's size is the acting
/// player's stack-to-pot proportion, Bet uses its own `size` filter.
pub fn enumerate_sizes<const P: usize>(
    table: &SequenceTable,
    node: &Node<P>,
    seq: SequenceId,
    first_round_action: bool,
) -> Vec<SizeCandidate> {
    let mut out = Vec::new();
    for action_idx in table.legal_action_indices(node.round(), seq) {
        let a = &table.actions()[action_idx];
        match a.play {
            Play::Fold => continue,
            Play::CheckCall => {
                if first_round_action {
                    out.push(SizeCandidate { action_idx, size: 0.0 });
                }
            }
            Play::AllIn => {
                let size = chips_to_proportion(node.pot(), node.stack(node.acting_player()));
                out.push(SizeCandidate { action_idx, size });
            }
            Play::Bet => out.push(SizeCandidate { action_idx, size: a.size }),
        }
    }
    out.sort_by(|x, y| x.size.partial_cmp(&y.size).unwrap());
    out
}

/// picks a candidate index for an out-of-abstraction proportion `x`,
/// applying the edge cases before falling back to PS-HAR between the
/// bracketing sizes.
pub fn pick_size(candidates: &[SizeCandidate], x: f64, rng: &mut impl Rng) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let below = candidates.iter().rposition(|c| c.size <= x);
    let above = candidates.iter().position(|c| c.size >= x);
    match (below, above) {
        (Some(lo), Some(hi)) if lo == hi => Some(lo),
        (Some(lo), Some(hi)) => {
            let f = ps_har_probability(candidates[lo].size, candidates[hi].size, x);
            Some(if rng.random::<f64>() < f { lo } else { hi })
        }
        (None, Some(hi)) => Some(hi), // no smaller size exists: play the smallest
        (Some(lo), None) => Some(lo), // no larger size exists: play the largest
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ps_har_is_one_at_a_and_zero_at_b() {
        assert!((ps_har_probability(0.5, 1.5, 0.5) - 1.0).abs() < 1e-9);
        assert!(ps_har_probability(0.5, 1.5, 1.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_interval_always_selects_a() {
        assert_eq!(ps_har_probability(1.0, 1.0, 1.0), 1.0);
    }
}
