use crate::cards::card::Card;
use crate::engine::action::Action;
use crate::engine::deck::{Deck, DeckState};
use crate::engine::pot;
use crate::engine::round::Round;
use crate::error::{Result, SolverError};
use crate::Chips;

/// sentinel acting-player value meaning "this is a chance node"
pub fn chance_player<const P: usize>() -> usize {
    P
}

/// the authoritative no-limit hold'em state machine. `P` is the seat count.
///
/// `bets[i]` and `max_bet` are cumulative across the *entire hand*, not reset
/// between streets — this is what lets side-pot math at showdown work
/// directly off `bets[]` without separate per-street bookkeeping. Only
/// `min_raise`, `pot_good`, and `no_raise` reset when a new round begins.
#[derive(Clone)]
pub struct Node<const P: usize> {
    pub big_blind: Chips,
    pub small_blind: Chips,
    pub ante: Chips,
    pub big_blind_ante: bool,
    pub blind_before_ante: bool,
    pub rake: f64,
    pub rake_cap: Chips,
    pub no_flop_no_drop: bool,

    button: usize,
    in_progress: bool,
    round: Round,
    cycled: usize,
    acting: usize,
    pot_good: usize,
    no_raise: usize,
    folded: [bool; P],
    players_left: usize,
    players_all_in: usize,

    pot: Chips,
    bets: [Chips; P],
    stack: [Chips; P],
    min_raise: Chips,
    max_bet: Chips,

    deck: Deck<P>,
}

impl<const P: usize> Node<P> {
    pub const CHANCE: usize = P;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stacks: [Chips; P],
        button: usize,
        big_blind: Chips,
        small_blind: Chips,
        ante: Chips,
        big_blind_ante: bool,
        blind_before_ante: bool,
        rake: f64,
        rake_cap: Chips,
        no_flop_no_drop: bool,
        seed: u64,
    ) -> Self {
        assert!(P >= 2, "hold'em needs at least two players");
        let mut node = Self {
            big_blind,
            small_blind,
            ante,
            big_blind_ante,
            blind_before_ante,
            rake,
            rake_cap,
            no_flop_no_drop,
            button,
            in_progress: true,
            round: Round::PreFlop,
            cycled: 0,
            acting: 0,
            pot_good: 0,
            no_raise: 0,
            folded: [false; P],
            players_left: P,
            players_all_in: 0,
            pot: 0,
            bets: [0; P],
            stack: stacks,
            min_raise: big_blind,
            max_bet: 0,
            deck: Deck::new(seed),
        };
        node.post_opening_chips();
        node.pot = node.bets.iter().sum();
        node.pot_good = P;
        node.no_raise = 0;
        node.acting = node.first_to_act_preflop();
        node.deck.deal(0, Deck::<P>::HOLE_CARDS);
        node
    }

    fn sb_player(&self) -> usize {
        if P == 2 {
            self.button
        } else {
            (self.button + 1) % P
        }
    }
    fn bb_player(&self) -> usize {
        if P == 2 {
            (self.button + 1) % P
        } else {
            (self.button + 2) % P
        }
    }
    fn first_to_act_preflop(&self) -> usize {
        if P == 2 {
            self.sb_player()
        } else {
            self.next_eligible(self.bb_player())
        }
    }

    fn post_blind(&mut self, player: usize, size: Chips) {
        let posted = size.min(self.stack[player]);
        self.bets[player] += posted;
        self.stack[player] -= posted;
    }

    /// posts blinds and (if configured) antes, honoring `blind_before_ante`
    fn post_opening_chips(&mut self) {
        if self.ante > 0 && !self.blind_before_ante {
            self.post_antes();
            self.post_blind(self.sb_player(), self.small_blind);
            self.post_blind(self.bb_player(), self.big_blind);
        } else {
            self.post_blind(self.sb_player(), self.small_blind);
            self.post_blind(self.bb_player(), self.big_blind);
            if self.ante > 0 {
                self.post_antes();
            }
        }
        let effective_ante = self.effective_ante();
        self.max_bet = self.big_blind + effective_ante;
        self.min_raise = self.big_blind;
    }

    fn effective_ante(&self) -> Chips {
        if !self.big_blind_ante {
            return self.ante;
        }
        let pool = (self.ante * P as Chips).min(self.stack[self.bb_player()] + self.bets[self.bb_player()]);
        pool / P as Chips
    }

    fn post_antes(&mut self) {
        if self.big_blind_ante {
            let bb = self.bb_player();
            let pool = (self.ante * P as Chips).min(self.stack[bb]);
            let share = pool / P as Chips;
            let remainder = pool - share * P as Chips;
            self.stack[bb] -= pool;
            for i in 0..P {
                self.bets[i] += share;
            }
            self.bets[bb] += remainder;
        } else {
            for i in 0..P {
                let posted = self.ante.min(self.stack[i]);
                self.bets[i] += posted;
                self.stack[i] -= posted;
            }
        }
    }

    /// straddles `n` players in order starting UTG (first-to-act preflop).
    /// Only legal before any real action has been taken this hand.
    pub fn post_straddles(&mut self, n: usize) -> Result<()> {
        if self.round != Round::PreFlop || self.cycled != 0 {
            return Err(SolverError::InvalidPhase(
                "PostStraddles only legal at the preflop chance node".into(),
            ));
        }
        let mut straddler = self.first_to_act_preflop();
        let mut size = 2 * self.big_blind;
        let mut posted = 0usize;
        for _ in 0..n {
            if self.stack[straddler] < size {
                break;
            }
            self.post_blind(straddler, size);
            self.max_bet = self.max_bet.max(size);
            self.min_raise = self.min_raise.max(size);
            posted += 1;
            straddler = (straddler + 1) % P;
            size *= 2;
        }
        self.pot = self.bets.iter().sum();
        self.cycled = posted;
        self.acting = straddler;
        Ok(())
    }

    fn next_eligible(&self, from: usize) -> usize {
        let all_but_one_all_in = self.players_left - self.players_all_in <= 1;
        let mut p = (from + 1) % P;
        loop {
            let skip_folded_or_allin = self.folded[p] || self.stack[p] == 0;
            let skip_matched = all_but_one_all_in && self.bets[p] >= self.max_bet;
            if !skip_folded_or_allin && !skip_matched {
                return p;
            }
            p = (p + 1) % P;
            if p == from {
                return from;
            }
        }
    }

    pub fn needed_to_call(&self, player: usize) -> Chips {
        (self.max_bet - self.bets[player]).max(0)
    }

    pub fn can_fold(&self) -> bool {
        self.in_progress && self.acting != Self::CHANCE && self.needed_to_call(self.acting) > 0
    }
    pub fn can_check_call(&self) -> bool {
        self.in_progress
            && self.acting != Self::CHANCE
            && self.needed_to_call(self.acting) < self.stack[self.acting]
    }
    pub fn can_bet(&self, total_bet: Chips) -> bool {
        if !self.in_progress || self.acting == Self::CHANCE || self.pot_good == 0 {
            return false;
        }
        let additional = total_bet - self.bets[self.acting];
        total_bet > self.max_bet
            && (total_bet - self.max_bet) >= self.min_raise
            && additional < self.stack[self.acting]
    }
    pub fn can_all_in(&self) -> bool {
        self.in_progress && self.acting != Self::CHANCE && self.stack[self.acting] > 0
    }

    pub fn round(&self) -> Round {
        self.round
    }
    pub fn acting_player(&self) -> usize {
        self.acting
    }
    pub fn in_progress(&self) -> bool {
        self.in_progress
    }
    pub fn pot(&self) -> Chips {
        self.pot
    }
    pub fn stack(&self, p: usize) -> Chips {
        self.stack[p]
    }
    pub fn bet(&self, p: usize) -> Chips {
        self.bets[p]
    }
    pub fn min_raise(&self) -> Chips {
        self.min_raise
    }
    pub fn max_bet(&self) -> Chips {
        self.max_bet
    }
    pub fn is_folded(&self, p: usize) -> bool {
        self.folded[p]
    }
    pub fn players_left(&self) -> usize {
        self.players_left
    }
    pub fn cycled(&self) -> usize {
        self.cycled
    }
    pub fn pot_good(&self) -> usize {
        self.pot_good
    }
    pub fn no_raise(&self) -> usize {
        self.no_raise
    }
    pub fn button(&self) -> usize {
        self.button
    }

    pub fn is_legal(&self, action: Action) -> bool {
        match action {
            Action::Fold => self.can_fold(),
            Action::CheckCall => self.can_check_call(),
            Action::Bet(size) => self.can_bet(size),
            Action::AllIn => self.can_all_in(),
        }
    }

    pub fn apply(&mut self, action: Action) -> Result<()> {
        if !self.in_progress || self.acting == Self::CHANCE {
            return Err(SolverError::InvalidPhase("Apply called at a chance node".into()));
        }
        match action {
            Action::Fold => self.do_fold()?,
            Action::CheckCall => self.do_check_call()?,
            Action::Bet(size) => self.do_bet(size)?,
            Action::AllIn => self.do_all_in(),
        }
        self.cycle();
        Ok(())
    }

    fn do_fold(&mut self) -> Result<()> {
        if !self.can_fold() {
            return Err(SolverError::InvalidMove("Fold when nothing to call".into()));
        }
        self.folded[self.acting] = true;
        self.players_left -= 1;
        Ok(())
    }

    fn do_check_call(&mut self) -> Result<()> {
        if !self.can_check_call() {
            return Err(SolverError::InvalidMove("CheckCall not legal here".into()));
        }
        let amount = self.needed_to_call(self.acting);
        self.bets[self.acting] += amount;
        self.stack[self.acting] -= amount;
        self.pot += amount;
        Ok(())
    }

    fn do_bet(&mut self, total_bet: Chips) -> Result<()> {
        if !self.can_bet(total_bet) {
            return Err(SolverError::InvalidMove(format!("illegal bet size {total_bet}")));
        }
        let additional = total_bet - self.bets[self.acting];
        self.pot += additional;
        self.min_raise = total_bet - self.max_bet;
        self.max_bet = total_bet;
        self.bets[self.acting] = total_bet;
        self.stack[self.acting] -= additional;
        self.pot_good = P;
        self.no_raise = 0;
        Ok(())
    }

    fn do_all_in(&mut self) {
        let additional = self.stack[self.acting];
        let total_bet = self.bets[self.acting] + additional;
        self.pot += additional;
        self.bets[self.acting] = total_bet;
        self.stack[self.acting] = 0;
        self.players_all_in += 1;

        if total_bet <= self.max_bet {
            // pure call, no raise-state change
        } else if total_bet < self.max_bet + self.min_raise {
            // sub-min raise: reopens action only for players who haven't acted
            let already_acted = P - self.pot_good;
            self.no_raise = already_acted;
            self.max_bet = total_bet;
        } else {
            self.min_raise = total_bet - self.max_bet;
            self.max_bet = total_bet;
            self.pot_good = P;
            self.no_raise = 0;
        }
    }

    /// shared cycling engine behind both `Apply` (always burns one
    /// pot_good/no_raise tick before checking) and `ProceedPlay` (checks the
    /// freshly-seated actor first, only burning ticks if they must be
    /// skipped) — mirrors the donor's single `CyclePlayers(bool)`.
    fn cycle_players(&mut self, cycle_before_check: bool) {
        let mut advance_first = cycle_before_check;
        loop {
            if advance_first {
                if self.pot_good > 0 {
                    self.pot_good -= 1;
                } else if self.no_raise > 0 {
                    self.no_raise -= 1;
                }
                self.cycled += 1;
                self.acting = (self.acting + 1) % P;
            }
            advance_first = true;

            if self.pot_good + self.no_raise == 0 {
                break;
            }
            let all_but_one_all_in = self.players_left - self.players_all_in <= 1;
            let skip = self.folded[self.acting]
                || self.stack[self.acting] == 0
                || (all_but_one_all_in && self.bets[self.acting] == self.max_bet);
            if !skip {
                break;
            }
        }

        if self.players_left == 1 {
            self.in_progress = false;
            return;
        }
        if self.pot_good + self.no_raise == 0 {
            self.advance_round();
        }
    }

    fn cycle(&mut self) {
        self.cycle_players(true);
    }

    fn advance_round(&mut self) {
        match self.round.next() {
            Some(next) => {
                self.round = next;
                self.acting = Self::CHANCE;
            }
            None => {
                self.in_progress = false;
            }
        }
    }

    /// deals the next round's board cards and resumes play; call this when
    /// `acting_player() == Node::CHANCE`.
    pub fn proceed_play(&mut self) -> Result<()> {
        if self.acting != Self::CHANCE {
            return Err(SolverError::InvalidPhase("ProceedPlay called while not at chance node".into()));
        }
        if self.deck.state() != DeckState::Manual {
            let from = Deck::<P>::HOLE_CARDS + self.round.cards_visible() - self.round.cards_dealt();
            self.deck.deal(from, self.round.cards_dealt());
        }
        self.pot_good = P;
        self.no_raise = 0;
        self.min_raise = self.big_blind;
        self.acting = self.next_eligible(self.button);
        self.cycle_players(false);
        Ok(())
    }

    /// reseeds the deck's own RNG, independent of any Strategy RNG the
    /// caller keeps for action sampling (spec's "Random." seed discipline).
    pub fn seed_node_rng(&mut self, seed: u64) {
        self.deck.seed_rng(seed);
    }

    pub fn set_hole(&mut self, player: usize, cards: [Card; 2]) {
        self.deck.set_hole(player, cards);
    }
    pub fn set_board(&mut self, cards: &[Card]) {
        self.deck.set_board(cards);
    }
    pub fn reset_deck(&mut self) -> Result<()> {
        if self.round != Round::PreFlop || self.pot != 0 {
            return Err(SolverError::InvalidPhase(
                "ResetDeck only legal preflop or between hands".into(),
            ));
        }
        self.deck.reset();
        Ok(())
    }

    /// the player's hole cards plus board cards revealed through the
    /// current round; the only card accessor exposed downstream.
    pub fn player_cards(&self, player: usize) -> Vec<Card> {
        let mut cards: Vec<Card> = self.deck.hole(player).into_iter().flatten().collect();
        cards.extend(self.deck.board().iter().flatten().copied());
        cards
    }

    pub fn new_hand(&mut self, stacks: [Chips; P]) -> Result<()> {
        if self.pot != 0 {
            return Err(SolverError::InvalidPhase("NewHand called with non-zero pot".into()));
        }
        self.button = (self.button + 1) % P;
        self.in_progress = true;
        self.round = Round::PreFlop;
        self.cycled = 0;
        self.folded = [false; P];
        self.players_left = P;
        self.players_all_in = 0;
        self.bets = [0; P];
        self.stack = stacks;
        self.max_bet = 0;
        self.deck.reset();
        self.post_opening_chips();
        self.pot = self.bets.iter().sum();
        self.pot_good = P;
        self.no_raise = 0;
        self.acting = self.first_to_act_preflop();
        self.deck.deal(0, Deck::<P>::HOLE_CARDS);
        Ok(())
    }

    fn rake_and_net_pot(&self) -> (Chips, Chips) {
        let skip_rake = self.no_flop_no_drop && self.round == Round::PreFlop;
        let rake = if skip_rake { 0 } else { pot::rake_chips(self.pot, self.rake, self.rake_cap) };
        (rake, self.pot - rake)
    }

    /// the simplest pot award: assumes equal starting stacks and no rake,
    /// divides evenly among the rank-maximizing non-folded players
    pub fn award_pot_same_stack<R>(&mut self, ranker: R) -> Result<[Chips; P]>
    where
        R: Fn(&[Card]) -> crate::evaluation::Strength,
    {
        if self.in_progress {
            return Err(SolverError::InvalidPhase("AwardPot while still in progress".into()));
        }
        let contenders: Vec<usize> = (0..P).filter(|&i| !self.folded[i]).collect();
        let winners = self.best_players(&contenders, &ranker);
        let share = self.pot as f64 / winners.len() as f64;
        let exact: Vec<f64> = (0..P)
            .map(|i| if winners.contains(&i) { share } else { 0.0 })
            .collect();
        let awarded = pot::hamilton_apportion(&exact, self.pot)?;
        let mut out = [0; P];
        for i in 0..P {
            self.stack[i] += awarded[i];
            out[i] = awarded[i];
        }
        self.pot = 0;
        self.bets = [0; P];
        Ok(out)
    }

    /// the general single-board case: peels side pots smallest-stake-first
    pub fn award_pot_single_run<R>(&mut self, ranker: R) -> Result<[Chips; P]>
    where
        R: Fn(&[Card]) -> crate::evaluation::Strength,
    {
        if self.in_progress {
            return Err(SolverError::InvalidPhase("AwardPot while still in progress".into()));
        }
        let live: Vec<usize> = (0..P).filter(|&i| !self.folded[i]).collect();
        let (rake, net_pot) = self.rake_and_net_pot();
        let scale = if self.pot == 0 { 1.0 } else { net_pot as f64 / self.pot as f64 };

        if live.len() == 1 {
            let winner = live[0];
            let mut out = [0; P];
            out[winner] = net_pot;
            self.stack[winner] += net_pot;
            self.pot = 0;
            self.bets = [0; P];
            return Ok(out);
        }

        let mut remaining = self.bets;
        let mut processed = [false; P];
        let mut exact = [0.0f64; P];
        loop {
            let stake = (0..P)
                .filter(|&i| !processed[i] && remaining[i] > 0)
                .map(|i| remaining[i])
                .min();
            let Some(m) = stake else { break };
            let side_pot: Chips = (0..P).map(|i| remaining[i].min(m)).sum();
            let eligible: Vec<usize> = live.iter().copied().filter(|&i| remaining[i] > 0).collect();
            let winners = self.best_players(&eligible, &ranker);
            let share = (side_pot as f64 * scale) / winners.len() as f64;
            for &w in &winners {
                exact[w] += share;
            }
            for i in 0..P {
                remaining[i] -= remaining[i].min(m);
                if remaining[i] == 0 {
                    processed[i] = true;
                }
            }
        }

        let awarded = pot::hamilton_apportion(&exact, net_pot)?;
        let mut out = [0; P];
        for i in 0..P {
            self.stack[i] += awarded[i];
            out[i] = awarded[i];
        }
        let _ = rake;
        self.pot = 0;
        self.bets = [0; P];
        Ok(out)
    }

    /// runs the same side-pot loop once per supplied board, dividing each
    /// by `boards.len()`, accumulating exact awards before one final
    /// apportionment
    pub fn award_pot_multi_run<R>(&mut self, boards: &[Vec<Card>], ranker: R) -> Result<[Chips; P]>
    where
        R: Fn(&[Card]) -> crate::evaluation::Strength,
    {
        if self.in_progress {
            return Err(SolverError::InvalidPhase("AwardPot while still in progress".into()));
        }
        let k = boards.len().max(1) as f64;
        let live: Vec<usize> = (0..P).filter(|&i| !self.folded[i]).collect();
        let (rake, net_pot) = self.rake_and_net_pot();
        let scale = if self.pot == 0 { 1.0 } else { net_pot as f64 / self.pot as f64 };

        let mut exact = [0.0f64; P];
        for board in boards {
            let mut remaining = self.bets;
            let mut processed = [false; P];
            loop {
                let stake = (0..P)
                    .filter(|&i| !processed[i] && remaining[i] > 0)
                    .map(|i| remaining[i])
                    .min();
                let Some(m) = stake else { break };
                let side_pot: Chips = (0..P).map(|i| remaining[i].min(m)).sum();
                let eligible: Vec<usize> = live.iter().copied().filter(|&i| remaining[i] > 0).collect();
                let winners = self.best_players_with_board(&eligible, board, &ranker);
                let share = (side_pot as f64 * scale) / (winners.len() as f64 * k);
                for &w in &winners {
                    exact[w] += share;
                }
                for i in 0..P {
                    remaining[i] -= remaining[i].min(m);
                    if remaining[i] == 0 {
                        processed[i] = true;
                    }
                }
            }
        }

        let awarded = pot::hamilton_apportion(&exact, net_pot)?;
        let mut out = [0; P];
        for i in 0..P {
            self.stack[i] += awarded[i];
            out[i] = awarded[i];
        }
        let _ = rake;
        self.pot = 0;
        self.bets = [0; P];
        Ok(out)
    }

    fn best_players<R>(&self, among: &[usize], ranker: &R) -> Vec<usize>
    where
        R: Fn(&[Card]) -> crate::evaluation::Strength,
    {
        let scored: Vec<(usize, crate::evaluation::Strength)> =
            among.iter().map(|&i| (i, ranker(&self.player_cards(i)))).collect();
        let best = scored.iter().map(|(_, s)| *s).max().expect("at least one contender");
        scored.into_iter().filter(|(_, s)| *s == best).map(|(i, _)| i).collect()
    }

    fn best_players_with_board<R>(&self, among: &[usize], board: &[Card], ranker: &R) -> Vec<usize>
    where
        R: Fn(&[Card]) -> crate::evaluation::Strength,
    {
        let scored: Vec<(usize, crate::evaluation::Strength)> = among
            .iter()
            .map(|&i| {
                let mut cards: Vec<Card> = self.deck.hole(i).into_iter().flatten().collect();
                cards.extend_from_slice(board);
                (i, ranker(&cards))
            })
            .collect();
        let best = scored.iter().map(|(_, s)| *s).max().expect("at least one contender");
        scored.into_iter().filter(|(_, s)| *s == best).map(|(i, _)| i).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::rank::Rank;
    use crate::cards::suit::Suit;
    use crate::evaluation::evaluate;

    fn node_2p(stacks: [Chips; 2]) -> Node<2> {
        Node::new(stacks, 0, 4, 2, 2, true, true, 0.0, 0, false, 1)
    }

    #[test]
    fn pot_equals_sum_of_bets_after_blinds() {
        let n = node_2p([100, 100]);
        assert_eq!(n.pot(), n.bet(0) + n.bet(1));
    }

    /// all players are already all-in: no further decisions are possible, so
    /// each remaining street's chance node just burns its own pot_good and
    /// falls straight through to the next, one `proceed_play` per street.
    fn run_out_remaining_streets<const Q: usize>(n: &mut Node<Q>) {
        while n.in_progress() {
            n.proceed_play().unwrap();
        }
    }

    #[test]
    fn heads_up_bb_ante_blind_before_ante_scenario() {
        // spec scenario 2: stacks 100/100, bb=4, sb=2, ante=2
        let mut n = node_2p([100, 100]);
        // button (seat 0) is SB in heads-up; SB shoves all-in
        assert_eq!(n.acting_player(), 0);
        n.apply(Action::AllIn).unwrap();
        assert_eq!(n.acting_player(), 1);
        n.apply(Action::AllIn).unwrap();
        run_out_remaining_streets(&mut n);
        assert!(!n.in_progress());

        n.set_hole(0, [Card::new(Rank::Seven, Suit::Club), Card::new(Rank::Two, Suit::Heart)]);
        n.set_hole(1, [Card::new(Rank::Ace, Suit::Heart), Card::new(Rank::Ace, Suit::Spade)]);
        n.set_board(&[
            Card::new(Rank::Nine, Suit::Club),
            Card::new(Rank::Six, Suit::Club),
            Card::new(Rank::King, Suit::Spade),
            Card::new(Rank::Five, Suit::Club),
            Card::new(Rank::Four, Suit::Diamond),
        ]);
        let out = n.award_pot_single_run(evaluate).unwrap();
        assert_eq!(n.stack(0), 4);
        assert_eq!(n.stack(1), 196);
        assert_eq!(out, [4, 196]);
    }

    #[test]
    fn hamilton_apportionment_keeps_total_conserved() {
        let mut n = node_2p([100, 100]);
        n.apply(Action::AllIn).unwrap();
        n.apply(Action::AllIn).unwrap();
        run_out_remaining_streets(&mut n);
        n.set_hole(0, [Card::new(Rank::King, Suit::Club), Card::new(Rank::King, Suit::Heart)]);
        n.set_hole(1, [Card::new(Rank::Queen, Suit::Club), Card::new(Rank::Queen, Suit::Heart)]);
        n.set_board(&[
            Card::new(Rank::Two, Suit::Spade),
            Card::new(Rank::Five, Suit::Diamond),
            Card::new(Rank::Nine, Suit::Club),
            Card::new(Rank::Jack, Suit::Heart),
            Card::new(Rank::Three, Suit::Spade),
        ]);
        let before: Chips = (0..2).map(|i| n.stack(i)).sum::<Chips>() + n.pot();
        n.award_pot_single_run(evaluate).unwrap();
        let after: Chips = (0..2).map(|i| n.stack(i)).sum();
        assert_eq!(before, after);
    }
}
