//! C5: the MCCFR trainer. Owns the integer regret tables and the
//! preflop-only action-count table, and drives `TraverseMCCFR` /
//! `UpdateStrategy` / `Discount` / `SampleAction` as described in spec
//! §4.3. Parameterized over the player count `P`, the injected
//! [`InfoAbstraction`] `A`, and a [`HandRanker`]-shaped `R` used only at
//! terminal nodes (`AwardPot` needs a ranker; the concrete ranker stays
//! outside this module per the indexer/evaluator being an external
//! collaborator).

use crate::abstraction::InfoAbstraction;
use crate::cards::Card;
use crate::engine::{AbstractAction, Node, Round};
use crate::evaluation::Strength;
use crate::sequence::{SequenceTable, LEAF_ID};
use crate::{Probability, Regret, Utility, REGRET_FLOOR};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;
use std::sync::Arc;

pub struct Strategy<const P: usize, A, R> {
    table: Arc<SequenceTable>,
    abstraction: Arc<A>,
    ranker: Arc<R>,
    regrets: Vec<Vec<Regret>>,
    action_counts: Vec<u64>,
    strategy_rng: SmallRng,
    prune_constant: Regret,
    regret_floor: Regret,
    _players: PhantomData<[(); P]>,
}

impl<const P: usize, A, R> Strategy<P, A, R>
where
    A: InfoAbstraction<P>,
    R: Fn(&[Card]) -> Strength,
{
    pub fn new(
        start: &Node<P>,
        actions: Vec<AbstractAction>,
        abstraction: A,
        ranker: R,
        prune_constant: Regret,
        seed: u64,
    ) -> Self {
        let table = SequenceTable::build(start, actions);
        let regrets = Round::all()
            .iter()
            .map(|&r| vec![0 as Regret; abstraction.num_clusters(r) * table.total_width(r)])
            .collect();
        let preflop_width = table.total_width(Round::PreFlop);
        let action_counts = vec![0u64; abstraction.num_clusters(Round::PreFlop) * preflop_width];
        Self {
            table: Arc::new(table),
            abstraction: Arc::new(abstraction),
            ranker: Arc::new(ranker),
            regrets,
            action_counts,
            strategy_rng: SmallRng::seed_from_u64(seed),
            prune_constant,
            regret_floor: REGRET_FLOOR,
            _players: PhantomData,
        }
    }

    pub fn seed_rng(&mut self, seed: u64) {
        self.strategy_rng = SmallRng::seed_from_u64(seed);
    }

    pub fn table(&self) -> &SequenceTable {
        &self.table
    }
    pub fn table_arc(&self) -> Arc<SequenceTable> {
        Arc::clone(&self.table)
    }
    pub fn abstraction_arc(&self) -> Arc<A> {
        Arc::clone(&self.abstraction)
    }
    pub fn ranker_arc(&self) -> Arc<R> {
        Arc::clone(&self.ranker)
    }
    pub fn regret_floor(&self) -> Regret {
        self.regret_floor
    }

    fn index(&self, round: Round, cluster: usize, seq: usize, legal_i: usize) -> usize {
        cluster * self.table.total_width(round) + self.table.legal_offset(round, seq) + legal_i
    }

    pub fn regret_match_at(&self, round: Round, cluster: usize, seq: usize) -> Vec<Probability> {
        let legal = self.table.legal_action_indices(round, seq);
        let regrets: Vec<Regret> = (0..legal.len())
            .map(|li| self.regrets[round as usize][self.index(round, cluster, seq, li)])
            .collect();
        super::regret::regret_match(&regrets)
    }

    /// regret-match, rejection-sample a `uniform(0,1)`, return
    /// `(round_idx, legal_idx)`. Re-enters the loop rather than falling
    /// back to an explicit uniform pick when float rounding leaves the
    /// draw unaccounted for — matches the donor's published fixtures
    /// (spec §9 open question, resolved toward the re-entrant variant).
    pub fn sample_action(&mut self, round: Round, cluster: usize, seq: usize) -> (usize, usize) {
        let legal = self.table.legal_action_indices(round, seq);
        loop {
            let probs = self.regret_match_at(round, cluster, seq);
            let draw: f32 = self.strategy_rng.random_range(0.0..1.0);
            let mut acc = 0.0f32;
            for (legal_i, &p) in probs.iter().enumerate() {
                acc += p;
                if draw < acc {
                    return (legal[legal_i], legal_i);
                }
            }
        }
    }

    /// Recursive external-sampling traversal from `node`, accumulating
    /// regret for `player` under pruning when `prune` is set.
    pub fn traverse_mccfr(
        &mut self,
        mut node: Node<P>,
        player: usize,
        prune: bool,
        mut card_buckets: [usize; P],
    ) -> Utility {
        if !node.in_progress() {
            node.award_pot_same_stack(self.ranker.as_ref())
                .expect("terminal node must be awardable");
            return node.stack(player) as Utility;
        }
        if node.is_folded(player) {
            return node.stack(player) as Utility;
        }
        if node.acting_player() == Node::<P>::CHANCE {
            node.proceed_play().expect("chance node must proceed");
            card_buckets = self.abstraction.cluster_array_of(&node);
            return self.traverse_mccfr(node, player, prune, card_buckets);
        }

        let acting = node.acting_player();
        let round = node.round();
        let seq = self.table.seq_of(&node);
        let cluster = card_buckets[acting];
        let legal = self.table.legal_action_indices(round, seq);

        if acting != player {
            let (action_idx, _) = self.sample_action(round, cluster, seq);
            let concrete = self.table.concrete_action(&node, action_idx);
            let mut child = node.clone();
            child.apply(concrete).expect("sampled action must be legal");
            return self.traverse_mccfr(child, player, prune, card_buckets);
        }

        let probs = self.regret_match_at(round, cluster, seq);
        let mut action_values = vec![0.0 as Utility; legal.len()];
        let mut explored = vec![false; legal.len()];

        for (legal_i, &action_idx) in legal.iter().enumerate() {
            let regret = self.regrets[round as usize][self.index(round, cluster, seq, legal_i)];
            let leads_to_leaf = self.table.next(round, seq, action_idx) == LEAF_ID;
            let explore =
                !prune || regret > self.prune_constant || round == Round::River || leads_to_leaf;
            if !explore {
                continue;
            }
            let concrete = self.table.concrete_action(&node, action_idx);
            let mut child = node.clone();
            child.apply(concrete).expect("abstraction action must be legal here");
            action_values[legal_i] = self.traverse_mccfr(child, player, prune, card_buckets);
            explored[legal_i] = true;
        }

        let node_value: Utility = (0..legal.len())
            .filter(|&li| explored[li])
            .map(|li| probs[li] as Utility * action_values[li])
            .sum();

        for (legal_i, &explored_here) in explored.iter().enumerate() {
            if !explored_here {
                continue;
            }
            let idx = self.index(round, cluster, seq, legal_i);
            let delta = (action_values[legal_i] - node_value).round() as Regret;
            self.regrets[round as usize][idx] =
                (self.regrets[round as usize][idx] + delta).max(self.regret_floor);
        }

        node_value
    }

    /// preflop-only walk accumulating `action_counts` for the
    /// MCCFR+ time-averaged policy trick.
    pub fn update_strategy(&mut self, node: Node<P>, player: usize) {
        if !node.in_progress()
            || node.round() != Round::PreFlop
            || node.is_folded(player)
            || node.stack(player) == 0
        {
            return;
        }
        if node.acting_player() == Node::<P>::CHANCE {
            return;
        }

        let acting = node.acting_player();
        let round = node.round();
        let seq = self.table.seq_of(&node);
        let legal = self.table.legal_action_indices(round, seq);

        if acting == player {
            let cluster = self.abstraction.cluster_of(&node, player);
            let (action_idx, legal_i) = self.sample_action(round, cluster, seq);
            let idx = self.index(round, cluster, seq, legal_i);
            self.action_counts[idx] += 1;
            let concrete = self.table.concrete_action(&node, action_idx);
            let mut child = node.clone();
            if child.apply(concrete).is_ok() {
                self.update_strategy(child, player);
            }
        } else {
            for &action_idx in &legal {
                let concrete = self.table.concrete_action(&node, action_idx);
                let mut child = node.clone();
                if child.apply(concrete).is_ok() {
                    self.update_strategy(child, player);
                }
            }
        }
    }

    /// the Discounted-CFR schedule: positive regrets shrink by
    /// `t^alpha/(t^alpha+1)`, negative regrets by `t^omega/(t^omega+1)`,
    /// and the preflop action counts by `t^gamma/(t^gamma+1)`, all rounded
    /// to the nearest integer. Parallel over cluster ranges when the
    /// `server` feature's `rayon` dependency is available.
    pub fn discount(&mut self, iteration: f32) {
        let pos_factor = iteration.powf(crate::DISCOUNT_ALPHA) / (iteration.powf(crate::DISCOUNT_ALPHA) + 1.0);
        let neg_factor = iteration.powf(crate::DISCOUNT_OMEGA) / (iteration.powf(crate::DISCOUNT_OMEGA) + 1.0);
        let count_factor = iteration.powf(crate::DISCOUNT_GAMMA) / (iteration.powf(crate::DISCOUNT_GAMMA) + 1.0);
        for round_regrets in self.regrets.iter_mut() {
            discount_regret_slice(round_regrets, pos_factor, neg_factor);
        }
        discount_count_slice(&mut self.action_counts, count_factor);
    }

    pub fn regrets(&self) -> &[Vec<Regret>] {
        &self.regrets
    }
    pub fn action_counts(&self) -> &[u64] {
        &self.action_counts
    }
}

fn scale_regret(r: Regret, pos_factor: f32, neg_factor: f32) -> Regret {
    let factor = if r >= 0 { pos_factor } else { neg_factor };
    ((r as f32) * factor).round() as Regret
}

#[cfg(feature = "server")]
fn discount_regret_slice(slice: &mut [Regret], pos_factor: f32, neg_factor: f32) {
    use rayon::prelude::*;
    slice.par_iter_mut().for_each(|r| *r = scale_regret(*r, pos_factor, neg_factor));
}
#[cfg(not(feature = "server"))]
fn discount_regret_slice(slice: &mut [Regret], pos_factor: f32, neg_factor: f32) {
    slice.iter_mut().for_each(|r| *r = scale_regret(*r, pos_factor, neg_factor));
}

#[cfg(feature = "server")]
fn discount_count_slice(slice: &mut [u64], factor: f32) {
    use rayon::prelude::*;
    slice.par_iter_mut().for_each(|c| *c = ((*c as f32) * factor).round() as u64);
}
#[cfg(not(feature = "server"))]
fn discount_count_slice(slice: &mut [u64], factor: f32) {
    slice.iter_mut().for_each(|c| *c = ((*c as f32) * factor).round() as u64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};
    use crate::evaluation::evaluate;
    use crate::matchmaker::Matchmaker;
    use crate::Chips;

    fn uniform_abstraction() -> Matchmaker<impl Fn(Round, u64) -> usize, impl Fn(Round) -> usize> {
        Matchmaker::new(|_round, idx| (idx % 8) as usize, |_round| 8)
    }

    fn heads_up_actions() -> Vec<AbstractAction> {
        vec![
            AbstractAction::fold(),
            AbstractAction::check_call(),
            AbstractAction::bet(1.0),
            AbstractAction::all_in(),
        ]
    }

    #[test]
    fn discount_scales_regrets_down() {
        let start: Node<2> = Node::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let mut strategy = Strategy::new(
            &start,
            heads_up_actions(),
            uniform_abstraction(),
            evaluate,
            crate::PRUNE_CONSTANT,
            7,
        );
        strategy.regrets[0][0] = 1000;
        // at iteration=1.0, t^alpha/(t^alpha+1) == 0.5 for any alpha > 0
        strategy.discount(1.0);
        assert_eq!(strategy.regrets[0][0], 500);
    }

    #[test]
    fn traverse_preserves_chip_conservation() {
        let start: Node<2> = Node::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let total_before: Chips = (0..2).map(|i| start.stack(i) + start.bet(i)).sum();
        let mut strategy = Strategy::new(
            &start,
            heads_up_actions(),
            uniform_abstraction(),
            evaluate,
            crate::PRUNE_CONSTANT,
            7,
        );
        let mut node = start.clone();
        node.set_hole(0, [Card::new(Rank::King, Suit::Club), Card::new(Rank::King, Suit::Heart)]);
        node.set_hole(1, [Card::new(Rank::Two, Suit::Club), Card::new(Rank::Seven, Suit::Heart)]);
        let buckets = [0usize; 2];
        let value = strategy.traverse_mccfr(node, 0, false, buckets);
        assert!(value >= 0.0 && (value as Chips) <= total_before);
    }
}
