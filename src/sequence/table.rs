//! C4: the action-abstracted sequence tree. Built once by DFS from a
//! starting [`Node`] and an ordered list of [`AbstractAction`]s; every
//! MCCFR/policy table is subsequently indexed by
//! `(round, cluster, LegalOffset(r,s) + legal_i)`.

use crate::engine::{AbstractAction, Action, Node, Play, Round};
use crate::Chips;
use std::collections::HashMap;

pub type SequenceId = usize;

/// marks "this action is not legal in that abstract state"
pub const ILLEGAL_ID: SequenceId = SequenceId::MAX;
/// marks "this action leads to the next round (or to terminal)"
pub const LEAF_ID: SequenceId = SequenceId::MAX - 1;

#[derive(Clone, PartialEq, Eq, Hash)]
struct StateKey {
    bets: Vec<Chips>,
    folded: Vec<bool>,
    acting: usize,
    pot_good: usize,
    no_raise: usize,
    min_raise: Chips,
    max_bet: Chips,
}

impl StateKey {
    fn of<const P: usize>(node: &Node<P>) -> Self {
        Self {
            bets: (0..P).map(|i| node.bet(i)).collect(),
            folded: (0..P).map(|i| node.is_folded(i)).collect(),
            acting: node.acting_player(),
            pot_good: node.pot_good(),
            no_raise: node.no_raise(),
            min_raise: node.min_raise(),
            max_bet: node.max_bet(),
        }
    }
}

#[derive(Clone)]
pub struct SequenceTable {
    actions: Vec<AbstractAction>,
    rows: Vec<Vec<Vec<SequenceId>>>,
    legal_offset: Vec<Vec<usize>>,
    num_legal: Vec<Vec<usize>>,
    start_id: SequenceId,
    seen: Vec<HashMap<StateKey, SequenceId>>,
}

impl SequenceTable {
    pub fn build<const P: usize>(start: &Node<P>, actions: Vec<AbstractAction>) -> Self {
        let mut rows: Vec<Vec<Vec<SequenceId>>> = (0..Round::N_ROUNDS).map(|_| Vec::new()).collect();
        let mut seen: Vec<HashMap<StateKey, SequenceId>> =
            (0..Round::N_ROUNDS).map(|_| HashMap::new()).collect();
        let start_id = Self::visit(start.clone(), 0, &actions, &mut rows, &mut seen);

        let mut legal_offset = Vec::with_capacity(Round::N_ROUNDS);
        let mut num_legal = Vec::with_capacity(Round::N_ROUNDS);
        for round_rows in &rows {
            let counts: Vec<usize> =
                round_rows.iter().map(|row| row.iter().filter(|&&v| v != ILLEGAL_ID).count()).collect();
            let mut offsets = Vec::with_capacity(counts.len());
            let mut acc = 0;
            for &c in &counts {
                offsets.push(acc);
                acc += c;
            }
            legal_offset.push(offsets);
            num_legal.push(counts);
        }

        Self { actions, rows, legal_offset, num_legal, start_id, seen }
    }

    /// finds the `SequenceId` of a live traversal node, by recomputing the
    /// same state key the builder indexed it under. Only ever called on
    /// nodes reached by applying the table's own concretized actions, so
    /// the lookup cannot miss.
    pub fn seq_of<const P: usize>(&self, node: &Node<P>) -> SequenceId {
        let key = StateKey::of(node);
        *self.seen[node.round() as usize]
            .get(&key)
            .expect("traversal left the action abstraction")
    }

    fn visit<const P: usize>(
        node: Node<P>,
        raises_so_far: u32,
        actions: &[AbstractAction],
        rows: &mut Vec<Vec<Vec<SequenceId>>>,
        seen: &mut Vec<HashMap<StateKey, SequenceId>>,
    ) -> SequenceId {
        let round = node.round();
        let key = StateKey::of(&node);
        if let Some(&id) = seen[round as usize].get(&key) {
            return id;
        }
        let id = rows[round as usize].len();
        rows[round as usize].push(vec![ILLEGAL_ID; actions.len()]);
        seen[round as usize].insert(key, id);

        for (i, abstract_action) in actions.iter().enumerate() {
            let players_in = node.players_left() as u32;
            if !abstract_action.admits(raises_so_far, round, players_in, node.pot()) {
                continue;
            }
            let Some(concrete) = Self::concretize(&node, abstract_action) else {
                continue;
            };
            if !node.is_legal(concrete) {
                continue;
            }

            let prev_max_bet = node.max_bet();
            let mut child = node.clone();
            if child.apply(concrete).is_err() {
                continue;
            }
            let raised = child.max_bet() > prev_max_bet;
            let round_changed = child.in_progress() && child.round() != round;

            let outcome = if !child.in_progress() || round_changed {
                LEAF_ID
            } else {
                Self::visit(child.clone(), raises_so_far + u32::from(raised), actions, rows, seen)
            };
            rows[round as usize][id][i] = outcome;

            // the state key never depends on card identity, so the next
            // round's betting states can be enumerated immediately rather
            // than waiting on an actual deal — this seeds `rows`/`seen` for
            // that round so a later `seq_of` lookup at runtime succeeds.
            if round_changed && child.acting_player() == Node::<P>::CHANCE {
                let mut proceeded = child.clone();
                if proceeded.proceed_play().is_ok() {
                    Self::visit(proceeded, 0, actions, rows, seen);
                }
            }
        }

        id
    }

    /// translates a pot-fraction [`AbstractAction`] into a concrete
    /// [`Action`] at `node`'s current bet level: `Bet` sizes are a pot
    /// fraction of the *raise* added on top of the current `max_bet`.
    fn concretize<const P: usize>(node: &Node<P>, a: &AbstractAction) -> Option<Action> {
        match a.play {
            Play::Fold => Some(Action::Fold),
            Play::CheckCall => Some(Action::CheckCall),
            Play::AllIn => Some(Action::AllIn),
            Play::Bet => {
                let raise = ((node.pot() as f64) * a.size).round() as Chips;
                let total_bet = node.max_bet() + raise.max(node.min_raise());
                Some(Action::Bet(total_bet))
            }
        }
    }

    /// re-derives the concrete [`Action`] for `action_idx` at `node`'s
    /// current bet level; panics if that action isn't legal there, which
    /// would indicate the caller used an `action_idx` this table never
    /// marked legal for `node`'s state.
    pub fn concrete_action<const P: usize>(&self, node: &Node<P>, action_idx: usize) -> Action {
        Self::concretize(node, &self.actions[action_idx]).expect("action_idx must be legal at node")
    }

    pub fn start_state(&self) -> (Round, SequenceId) {
        (Round::PreFlop, self.start_id)
    }

    pub fn actions(&self) -> &[AbstractAction] {
        &self.actions
    }

    pub fn next(&self, round: Round, seq: SequenceId, action_idx: usize) -> SequenceId {
        self.rows[round as usize][seq][action_idx]
    }

    pub fn num_legal_actions(&self, round: Round, seq: SequenceId) -> usize {
        self.num_legal[round as usize][seq]
    }

    pub fn legal_offset(&self, round: Round, seq: SequenceId) -> usize {
        self.legal_offset[round as usize][seq]
    }

    pub fn legal_action_indices(&self, round: Round, seq: SequenceId) -> Vec<usize> {
        self.rows[round as usize][seq]
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != ILLEGAL_ID)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn total_width(&self, round: Round) -> usize {
        self.num_legal[round as usize].iter().sum()
    }

    pub fn num_states(&self, round: Round) -> usize {
        self.rows[round as usize].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Node;

    fn heads_up_actions() -> Vec<AbstractAction> {
        vec![
            AbstractAction::fold(),
            AbstractAction::check_call(),
            AbstractAction::bet(1.0),
            AbstractAction::all_in(),
        ]
    }

    #[test]
    fn illegal_id_matches_node_legality() {
        let start: Node<2> = Node::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let table = SequenceTable::build(&start, heads_up_actions());
        let (round, seq) = table.start_state();
        assert!(table.next(round, seq, 0) != ILLEGAL_ID); // fold always legal when facing a bet
        assert_eq!(table.num_legal_actions(round, seq), table.legal_action_indices(round, seq).len());
    }

    #[test]
    fn fold_is_always_a_leaf() {
        let start: Node<2> = Node::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let table = SequenceTable::build(&start, heads_up_actions());
        let (round, seq) = table.start_state();
        let fold_idx = 0;
        assert_eq!(table.next(round, seq, fold_idx), LEAF_ID);
    }
}
