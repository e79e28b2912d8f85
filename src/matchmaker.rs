//! C3: wraps the canonical per-round hand indexers. The indexer/evaluator
//! proper (C2) is external per spec §2 — `Matchmaker` only folds a player's
//! visible cards into a canonical index and hands it to a caller-supplied
//! lookup, exactly as spec §4.5 describes ("`fn` is supplied by the
//! caller: during training it reads a materialized cluster table; at play
//! time it reads the Scribe-backed on-disk table").

use crate::abstraction::InfoAbstraction;
use crate::engine::{Node, Round};

/// folds a player's hole+board cards into a canonical index: each card's
/// `u8` isomorphism id, sorted ascending, packed base-53 (0 reserved for
/// "no card"). This stands in for the real indexer's suit/rank-isomorphic
/// index — correct as a collision-free key, not claimed to be
/// combinatorially minimal.
pub fn canonical_index<const P: usize>(node: &Node<P>, player: usize) -> u64 {
    let mut cards: Vec<u8> = node.player_cards(player).into_iter().map(u8::from).collect();
    cards.sort_unstable();
    cards.iter().fold(0u64, |acc, &c| acc * 53 + 1 + c as u64)
}

/// `Matchmaker(cluster_fn, clusters_per_round)`: `cluster_fn(round, idx)`
/// maps a canonical index to a cluster id, `clusters_per_round(round)`
/// reports the cluster count Strategy needs to size its tables.
pub struct Matchmaker<C, N> {
    cluster_fn: C,
    clusters_per_round: N,
}

impl<C, N> Matchmaker<C, N>
where
    C: Fn(Round, u64) -> usize,
    N: Fn(Round) -> usize,
{
    pub fn new(cluster_fn: C, clusters_per_round: N) -> Self {
        Self { cluster_fn, clusters_per_round }
    }

    pub fn cluster<const P: usize>(&self, node: &Node<P>, player: usize) -> usize {
        (self.cluster_fn)(node.round(), canonical_index(node, player))
    }

    pub fn cluster_array<const P: usize>(&self, node: &Node<P>) -> [usize; P] {
        let mut out = [0usize; P];
        for (p, slot) in out.iter_mut().enumerate() {
            if !node.is_folded(p) && node.stack(p) > 0 {
                *slot = self.cluster(node, p);
            }
        }
        out
    }
}

impl<const P: usize, C, N> InfoAbstraction<P> for Matchmaker<C, N>
where
    C: Fn(Round, u64) -> usize,
    N: Fn(Round) -> usize,
{
    fn num_clusters(&self, round: Round) -> usize {
        (self.clusters_per_round)(round)
    }
    fn cluster_of(&self, node: &Node<P>, player: usize) -> usize {
        self.cluster(node, player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, Rank, Suit};

    #[test]
    fn identical_hole_cards_index_the_same() {
        let a = Node::<2>::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let mut b = a.clone();
        let cards = [Card::new(Rank::Ace, Suit::Spade), Card::new(Rank::King, Suit::Heart)];
        let mut a = a;
        a.set_hole(0, cards);
        b.set_hole(0, cards);
        assert_eq!(canonical_index(&a, 0), canonical_index(&b, 0));
    }
}
