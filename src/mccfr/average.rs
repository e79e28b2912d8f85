//! C6: the time-averaged policy accumulator. Spec §4.4 — preflop rows are
//! overwritten from normalized action counts at every `+=` (the MCCFR+
//! average-strategy trick), later rounds accumulate `CalculateStrategy`
//! (regret-match) outputs and are divided by `n` lazily in `Policy`.

use crate::abstraction::InfoAbstraction;
use crate::cards::Card;
use crate::engine::{Node, Round};
use crate::evaluation::Strength;
use crate::mccfr::strategy::Strategy;
use crate::sequence::{SequenceId, SequenceTable};
use crate::{Probability, Utility};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub struct Average<const P: usize, A, R> {
    table: Arc<SequenceTable>,
    abstraction: Arc<A>,
    ranker: Arc<R>,
    probabilities: Vec<Vec<Probability>>,
    n: u64,
}

impl<const P: usize, A, R> Average<P, A, R>
where
    A: InfoAbstraction<P>,
    R: Fn(&[Card]) -> Strength,
{
    /// wraps a freshly trained `Strategy`, copying its abstractions and
    /// seeding `n=1` by folding the strategy in once.
    pub fn from_strategy(strategy: &Strategy<P, A, R>) -> Self {
        let table = strategy.table_arc();
        let abstraction = strategy.abstraction_arc();
        let ranker = strategy.ranker_arc();
        let probabilities = Round::all()
            .iter()
            .map(|&r| vec![0 as Probability; abstraction.num_clusters(r) * table.total_width(r)])
            .collect();
        let mut avg = Self { table, abstraction, ranker, probabilities, n: 0 };
        avg.accumulate(strategy);
        avg
    }

    pub fn table(&self) -> &SequenceTable {
        &self.table
    }

    pub fn abstraction(&self) -> &A {
        &self.abstraction
    }

    pub fn ranker(&self) -> &R {
        &self.ranker
    }

    /// the raw accumulated row for `round`, width `num_clusters(round) *
    /// table.total_width(round)`, already divided by `n` where applicable.
    /// Used by the on-disk snapshot writer; callers normalize first if they
    /// want a single comparable snapshot.
    pub fn raw_round(&self, round: Round) -> &[Probability] {
        &self.probabilities[round as usize]
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    fn index(&self, round: Round, cluster: usize, seq: SequenceId, legal_i: usize) -> usize {
        cluster * self.table.total_width(round) + self.table.legal_offset(round, seq) + legal_i
    }

    /// `+= strategy`: overwrites preflop from normalized action counts,
    /// accumulates regret-match outputs everywhere else, increments `n`.
    pub fn accumulate(&mut self, strategy: &Strategy<P, A, R>) {
        for &round in Round::all().iter() {
            let n_states = self.table.num_states(round);
            for seq in 0..n_states {
                let legal = self.table.legal_action_indices(round, seq);
                if legal.is_empty() {
                    continue;
                }
                for cluster in 0..self.abstraction.num_clusters(round) {
                    let idx_base = self.index(round, cluster, seq, 0);
                    if round == Round::PreFlop {
                        let counts: Vec<u64> = (0..legal.len())
                            .map(|li| strategy.action_counts()[idx_base + li])
                            .collect();
                        let total: u64 = counts.iter().sum();
                        for (li, &c) in counts.iter().enumerate() {
                            self.probabilities[round as usize][idx_base + li] = if total > 0 {
                                c as Probability / total as Probability
                            } else {
                                1.0 / legal.len() as Probability
                            };
                        }
                    } else {
                        let probs = strategy.regret_match_at(round, cluster, seq);
                        for (li, &p) in probs.iter().enumerate() {
                            self.probabilities[round as usize][idx_base + li] += p;
                        }
                    }
                }
            }
        }
        self.n += 1;
    }

    /// divides all non-preflop entries by `n` and resets `n=1`; preflop is
    /// already normalized at every `accumulate`.
    pub fn normalize(&mut self) {
        if self.n > 1 {
            for &round in Round::all().iter() {
                if round == Round::PreFlop {
                    continue;
                }
                for p in self.probabilities[round as usize].iter_mut() {
                    *p /= self.n as Probability;
                }
            }
            self.n = 1;
        }
    }

    /// a per-action array of the round's full abstract width; entries for
    /// actions not legal at `(round, seq)` are zero.
    pub fn policy(&self, round: Round, cluster: usize, seq: SequenceId) -> Vec<Probability> {
        let legal = self.table.legal_action_indices(round, seq);
        let mut out = vec![0 as Probability; self.table.actions().len()];
        let divisor = if round == Round::PreFlop || self.n <= 1 { 1.0 } else { self.n as Probability };
        for (li, &action_idx) in legal.iter().enumerate() {
            let idx = self.index(round, cluster, seq, li);
            out[action_idx] = self.probabilities[round as usize][idx] / divisor;
        }
        out
    }

    pub fn sample_action(
        &self,
        round: Round,
        cluster: usize,
        seq: SequenceId,
        rng: &mut SmallRng,
    ) -> (usize, usize) {
        let legal = self.table.legal_action_indices(round, seq);
        let full = self.policy(round, cluster, seq);
        loop {
            let draw: f32 = rng.random_range(0.0..1.0);
            let mut acc = 0.0f32;
            for (legal_i, &action_idx) in legal.iter().enumerate() {
                acc += full[action_idx];
                if draw < acc {
                    return (action_idx, legal_i);
                }
            }
        }
    }

    /// runs `means` rounds of `trials` self-play hands each, rotating
    /// which player seat this average controls (the rest are played by
    /// `op`); returns the per-round mean chip delta for this average at
    /// seat 0.
    pub fn battle_stats<OA, OR>(
        &self,
        op: &Average<P, OA, OR>,
        means: usize,
        trials: usize,
        start: &Node<P>,
        seed: u64,
    ) -> Vec<Utility>
    where
        OA: InfoAbstraction<P>,
        OR: Fn(&[Card]) -> Strength,
    {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut results = Vec::with_capacity(means);
        for round_idx in 0..means {
            let mut total: Utility = 0.0;
            for trial in 0..trials {
                let self_is_seat_zero = (round_idx + trial) % 2 == 0;
                let before = start.stack(0) as Utility;
                let mut node = start.clone();
                node.seed_node_rng(seed ^ ((round_idx * trials + trial) as u64));
                let mut guard = 0;
                while node.in_progress() && guard < 10_000 {
                    guard += 1;
                    if node.acting_player() == Node::<P>::CHANCE {
                        node.proceed_play().expect("chance node must proceed");
                        continue;
                    }
                    let acting = node.acting_player();
                    let acting_is_self = (acting == 0) == self_is_seat_zero;
                    let cluster_self = self.abstraction.cluster_of(&node, acting);
                    let cluster_op = op.abstraction.cluster_of(&node, acting);
                    let seq = self.table.seq_of(&node);
                    let (action_idx, _) = if acting_is_self {
                        self.sample_action(node.round(), cluster_self, seq, &mut rng)
                    } else {
                        op.sample_action(node.round(), cluster_op, seq, &mut rng)
                    };
                    let concrete = self.table.concrete_action(&node, action_idx);
                    if node.apply(concrete).is_err() {
                        break;
                    }
                }
                if !node.in_progress() {
                    let ranker_self = self.ranker.as_ref();
                    let _ = node.award_pot_single_run(ranker_self);
                }
                let after = node.stack(0) as Utility;
                total += after - before;
            }
            results.push(total / trials as Utility);
        }
        results
    }
}
