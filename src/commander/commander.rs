//! C7: the real-time play driver. Runs two [`Node`]s side by side — `actual`
//! tracks the real game (real stacks, real bet sizes, real board), `abstract_node`
//! tracks the same hand projected onto the action abstraction the policy was
//! trained against. Opponent moves are translated onto `abstract_node` by the
//! pseudo-harmonic mapping in [`super::translate`]; fishbait's own queried move
//! is translated the other way, from the abstraction back into real chips.

use super::translate::{self, SizeCandidate};
use crate::abstraction::InfoAbstraction;
use crate::cards::Card;
use crate::engine::{Action, Node, Play};
use crate::error::{Result, SolverError};
use crate::evaluation::Strength;
use crate::mccfr::Average;
use crate::sequence::SequenceTable;
use crate::{Chips, Probability};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub struct Commander<const P: usize, A, R> {
    actual: Node<P>,
    abstract_node: Node<P>,
    table: Arc<SequenceTable>,
    average: Arc<Average<P, A, R>>,
    abstraction: Arc<A>,
    ranker: Arc<R>,
    fishbait_seat: usize,
    rng: SmallRng,
    first_round_action: bool,
}

impl<const P: usize, A, R> Commander<P, A, R>
where
    A: InfoAbstraction<P>,
    R: Fn(&[Card]) -> Strength,
{
    pub fn new(
        actual: Node<P>,
        table: Arc<SequenceTable>,
        average: Arc<Average<P, A, R>>,
        abstraction: Arc<A>,
        ranker: Arc<R>,
        fishbait_seat: usize,
        seed: u64,
    ) -> Self {
        let abstract_node = actual.clone();
        Self {
            actual,
            abstract_node,
            table,
            average,
            abstraction,
            ranker,
            fishbait_seat,
            rng: SmallRng::seed_from_u64(seed),
            first_round_action: true,
        }
    }

    /// true while fishbait still has chips behind and at least two players
    /// remain who aren't folded or all-in; once false the abstract state
    /// stops tracking (there's nothing left to translate: everyone left is
    /// either fishbait drawing dead or a side-show between others).
    pub fn should_update_abstract(&self) -> bool {
        self.actual.in_progress()
            && self.actual.stack(self.fishbait_seat) > 0
            && (0..P).filter(|&i| !self.actual.is_folded(i) && self.actual.stack(i) > 0).count() >= 2
    }

    pub fn reset(&mut self, stacks: [Chips; P], button: usize, big_blind: Chips, small_blind: Chips, seed: u64) {
        let a = &self.actual;
        self.actual = Node::new(
            stacks,
            button,
            big_blind,
            small_blind,
            a.ante,
            a.big_blind_ante,
            a.blind_before_ante,
            a.rake,
            a.rake_cap,
            a.no_flop_no_drop,
            seed,
        );
        self.abstract_node = self.actual.clone();
        self.first_round_action = true;
    }

    pub fn new_hand(&mut self, stacks: [Chips; P]) -> Result<()> {
        self.actual.new_hand(stacks)?;
        self.abstract_node = self.actual.clone();
        self.first_round_action = true;
        Ok(())
    }

    pub fn proceed_play(&mut self) -> Result<()> {
        self.actual.proceed_play()?;
        if self.should_update_abstract() {
            self.abstract_node.proceed_play()?;
        }
        self.first_round_action = true;
        Ok(())
    }

    pub fn award_pot(&mut self) -> Result<[Chips; P]> {
        self.actual.award_pot_single_run(self.ranker.as_ref())
    }

    pub fn set_hand(&mut self, player: usize, cards: [Card; 2]) {
        self.actual.set_hole(player, cards);
        if self.should_update_abstract() {
            self.abstract_node.set_hole(player, cards);
        }
    }

    pub fn set_board(&mut self, cards: &[Card]) {
        self.actual.set_board(cards);
        if self.should_update_abstract() {
            self.abstract_node.set_board(cards);
        }
    }

    /// applies an opponent's real move, translating it onto `abstract_node`
    /// via PS-HAR before mirroring it onto `actual`.
    pub fn apply(&mut self, actual_action: Action) -> Result<()> {
        if !self.should_update_abstract() {
            self.actual.apply(actual_action)?;
            return Ok(());
        }

        let abstract_move = self.translate_to_abstract(actual_action)?;
        self.abstract_node.apply(abstract_move)?;
        self.actual.apply(actual_action)?;
        self.first_round_action = false;
        self.catch_up_abstract()?;
        Ok(())
    }

    fn candidates(&self) -> Vec<SizeCandidate> {
        let seq = self.table.seq_of(&self.abstract_node);
        translate::enumerate_sizes(&self.table, &self.abstract_node, seq, self.first_round_action)
    }

    fn pick(&mut self, x: f64) -> Option<usize> {
        let candidates = self.candidates();
        translate::pick_size(&candidates, x, &mut self.rng)
    }

    fn translate_to_abstract(&mut self, actual_action: Action) -> Result<Action> {
        let acting = self.actual.acting_player();
        match actual_action {
            Action::Fold => {
                Ok(if self.abstract_node.can_fold() { Action::Fold } else { Action::CheckCall })
            }
            Action::CheckCall => {
                Ok(if self.abstract_node.can_check_call() { Action::CheckCall } else { Action::AllIn })
            }
            Action::AllIn => {
                let stack = self.actual.stack(acting);
                let call = self.actual.needed_to_call(acting);
                if stack <= call {
                    // all-in for a call: map [0, call] through PS-HAR against a
                    // fold/check-call boundary
                    let call_prop = translate::chips_to_proportion(self.actual.pot(), call);
                    let stack_prop = translate::chips_to_proportion(self.actual.pot(), stack);
                    let f = translate::ps_har_probability(0.0, call_prop, stack_prop);
                    if self.abstract_node.can_fold() && self.rng.random::<f64>() >= f {
                        Ok(Action::Fold)
                    } else {
                        Ok(Action::CheckCall)
                    }
                } else {
                    // all-in for a raise: try the abstraction's own all-in,
                    // otherwise bracket it like any other bet size
                    let prop = translate::chips_to_proportion(self.actual.pot(), stack);
                    if let Some(idx) = self.pick(prop) {
                        Ok(self.table.concrete_action(&self.abstract_node, idx))
                    } else {
                        Ok(Action::AllIn)
                    }
                }
            }
            Action::Bet(total_bet) => {
                let raise = total_bet - self.actual.max_bet();
                let prop = translate::chips_to_proportion(self.actual.pot(), raise.max(0));
                match self.pick(prop) {
                    Some(idx) => Ok(self.table.concrete_action(&self.abstract_node, idx)),
                    None => Ok(Action::AllIn),
                }
            }
        }
    }

    /// after translating a real move, fast-forwards `abstract_node` past any
    /// players who are actually folded or all-in but whom the abstraction,
    /// having no notion of their real stack, still thinks are live.
    fn catch_up_abstract(&mut self) -> Result<()> {
        let mut guard = 0;
        while self.should_update_abstract()
            && self.abstract_node.in_progress()
            && self.abstract_node.acting_player() != Node::<P>::CHANCE
        {
            let acting = self.abstract_node.acting_player();
            let really_out = self.actual.is_folded(acting) || self.actual.stack(acting) == 0;
            if !really_out {
                break;
            }
            let action =
                if self.abstract_node.can_check_call() { Action::CheckCall } else { Action::Fold };
            self.abstract_node.apply(action)?;
            guard += 1;
            if guard > P * 4 {
                return Err(SolverError::Internal("catch_up_abstract did not converge".into()));
            }
        }
        Ok(())
    }

    /// fishbait's own legal policy at the current abstract state, zeroed at
    /// every slot illegal in the real game and renormalized.
    pub fn get_normalized_legal_policy(&self) -> Vec<Probability> {
        let round = self.abstract_node.round();
        let seq = self.table.seq_of(&self.abstract_node);
        let cluster = self.abstraction.cluster_of(&self.abstract_node, self.fishbait_seat);
        let mut policy = self.average.policy(round, cluster, seq);
        for (idx, template) in self.table.actions().iter().enumerate() {
            if policy[idx] == 0.0 {
                continue;
            }
            if !self.real_move_is_legal(template) {
                policy[idx] = 0.0;
            }
        }
        let total: Probability = policy.iter().sum();
        if total > 0.0 {
            for p in policy.iter_mut() {
                *p /= total;
            }
        }
        policy
    }

    fn real_move_is_legal(&self, template: &crate::engine::AbstractAction) -> bool {
        let action = match template.play {
            Play::Fold => Action::Fold,
            Play::CheckCall => Action::CheckCall,
            Play::AllIn => Action::AllIn,
            Play::Bet => {
                let raise = ((self.actual.pot() as f64) * template.size).round() as Chips;
                Action::Bet(self.actual.max_bet() + raise.max(self.actual.min_raise()))
            }
        };
        self.actual.is_legal(action)
    }

    /// samples fishbait's move from the normalized legal policy, applies it
    /// to both states, and returns the concrete real-game action taken.
    pub fn query(&mut self) -> Result<Action> {
        if self.actual.acting_player() != self.fishbait_seat {
            return Err(SolverError::InvalidPhase("Query called out of turn".into()));
        }
        let policy = self.get_normalized_legal_policy();
        let draw: f64 = self.rng.random_range(0.0..1.0);
        let mut acc = 0.0;
        let mut chosen = policy.len() - 1;
        for (i, &p) in policy.iter().enumerate() {
            acc += p as f64;
            if draw < acc {
                chosen = i;
                break;
            }
        }
        let template = self.table.actions()[chosen];
        let real_action = self.real_move_from_template(&template);
        let abstract_action = self.table.concrete_action(&self.abstract_node, chosen);
        self.abstract_node.apply(abstract_action)?;
        self.actual.apply(real_action)?;
        self.first_round_action = false;
        self.catch_up_abstract()?;
        Ok(real_action)
    }

    fn real_move_from_template(&self, template: &crate::engine::AbstractAction) -> Action {
        match template.play {
            Play::Fold => Action::Fold,
            Play::CheckCall => Action::CheckCall,
            Play::AllIn => Action::AllIn,
            Play::Bet => {
                let raise = ((self.actual.pot() as f64) * template.size).round() as Chips;
                Action::Bet(self.actual.max_bet() + raise.max(self.actual.min_raise()))
            }
        }
    }

    pub fn actual(&self) -> &Node<P> {
        &self.actual
    }

    pub fn abstract_node(&self) -> &Node<P> {
        &self.abstract_node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AbstractAction, Round};
    use crate::evaluation::evaluate;
    use crate::matchmaker::Matchmaker;
    use crate::mccfr::Strategy;
    use crate::PRUNE_CONSTANT;

    fn heads_up_actions() -> Vec<AbstractAction> {
        vec![
            AbstractAction::fold(),
            AbstractAction::check_call(),
            AbstractAction::bet(0.5),
            AbstractAction::bet(1.0),
            AbstractAction::all_in(),
        ]
    }

    fn small_matchmaker() -> Matchmaker<fn(Round, u64) -> usize, fn(Round) -> usize> {
        fn cluster_fn(_round: Round, _idx: u64) -> usize {
            0
        }
        fn clusters_per_round(_round: Round) -> usize {
            1
        }
        Matchmaker::new(cluster_fn, clusters_per_round)
    }

    #[test]
    fn opponent_all_in_for_less_translates_without_error() {
        let start: Node<2> = Node::new([100, 100], 0, 4, 2, 0, false, true, 0.0, 0, false, 1);
        let strategy =
            Strategy::new(&start, heads_up_actions(), small_matchmaker(), evaluate, PRUNE_CONSTANT, 7);
        let table = strategy.table_arc();
        let abstraction = strategy.abstraction_arc();
        let ranker = strategy.ranker_arc();
        let average = Arc::new(Average::from_strategy(&strategy));

        let mut commander = Commander::new(start, table, average, abstraction, ranker, 0, 9);
        assert!(commander.should_update_abstract());
        assert!(commander.apply(Action::CheckCall).is_ok());
    }
}
