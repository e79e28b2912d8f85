//! The seam spec's deep-templating note calls for: a small trait standing
//! in for the training-time cluster table / play-time Scribe-backed table,
//! injected into [`crate::mccfr::strategy::Strategy`] rather than hardcoded.

use crate::engine::{Node, Round};

pub trait InfoAbstraction<const P: usize> {
    fn num_clusters(&self, round: Round) -> usize;
    fn cluster_of(&self, node: &Node<P>, player: usize) -> usize;

    /// clusters for every non-folded, non-all-in player at the node's
    /// current round; the default just calls `cluster_of` per seat
    fn cluster_array_of(&self, node: &Node<P>) -> [usize; P] {
        let mut out = [0usize; P];
        for (p, slot) in out.iter_mut().enumerate() {
            if !node.is_folded(p) && node.stack(p) > 0 {
                *slot = self.cluster_of(node, p);
            }
        }
        out
    }
}
