use crate::cards::card::Card;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// how the deck's positions are being populated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckState {
    /// caller sets hole/board cards explicitly via `set_hand`/`set_board`
    Manual,
    /// `deal` will populate remaining positions on demand
    Auto,
    /// `deal` already populated this round's positions; next `proceed_play`
    /// either stays `Auto` if this round still needs dealing, or drops to
    /// `Manual` once all positions used by the abstraction are filled
    AutoDealt,
}

/// positions `0..2*players` hold hole cards (player i at `2i..2i+2`),
/// followed by 5 board positions. `None` marks an unrevealed slot.
#[derive(Clone)]
pub struct Deck<const P: usize> {
    positions: [Option<Card>; 52],
    n_positions: usize,
    state: DeckState,
    rng: SmallRng,
}

impl<const P: usize> Deck<P> {
    pub const HOLE_CARDS: usize = 2 * P;
    pub const N_POSITIONS: usize = 2 * P + 5;

    pub fn new(seed: u64) -> Self {
        assert!(Self::N_POSITIONS <= 52, "too many players to deal a single deck");
        Self {
            positions: [None; 52],
            n_positions: Self::N_POSITIONS,
            state: DeckState::Auto,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    pub fn state(&self) -> DeckState {
        self.state
    }

    pub fn set_manual(&mut self) {
        self.state = DeckState::Manual;
    }

    pub fn hole(&self, player: usize) -> [Option<Card>; 2] {
        [self.positions[2 * player], self.positions[2 * player + 1]]
    }

    pub fn board(&self) -> &[Option<Card>] {
        &self.positions[Self::HOLE_CARDS..self.n_positions]
    }

    pub fn set_hole(&mut self, player: usize, cards: [Card; 2]) {
        self.positions[2 * player] = Some(cards[0]);
        self.positions[2 * player + 1] = Some(cards[1]);
        self.state = DeckState::Manual;
    }

    pub fn set_board(&mut self, cards: &[Card]) {
        for (i, c) in cards.iter().enumerate() {
            self.positions[Self::HOLE_CARDS + i] = Some(*c);
        }
        self.state = DeckState::Manual;
    }

    /// restores an empty, unshuffled deck; legal only at a preflop chance
    /// node or between hands, enforced by the caller (Node)
    pub fn reset(&mut self) {
        self.positions = [None; 52];
        self.state = DeckState::Auto;
    }

    /// partial Fisher-Yates: deal `count` fresh cards into the next unfilled
    /// positions starting at `from`, drawing from cards not already placed
    pub fn deal(&mut self, from: usize, count: usize) {
        let mut remaining: Vec<Card> = (0..52u8)
            .map(Card::from)
            .filter(|c| !self.positions[..self.n_positions].iter().flatten().any(|p| p == c))
            .collect();
        for slot in from..from + count {
            let i = self.rng.random_range(0..remaining.len());
            self.positions[slot] = Some(remaining.swap_remove(i));
        }
        self.state = DeckState::AutoDealt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deals_distinct_cards() {
        let mut deck: Deck<2> = Deck::new(7);
        deck.deal(0, Deck::<2>::HOLE_CARDS);
        let mut seen = std::collections::HashSet::new();
        for p in 0..2 {
            for c in deck.hole(p).into_iter().flatten() {
                assert!(seen.insert(u8::from(c)), "duplicate card dealt");
            }
        }
    }

    #[test]
    fn reset_clears_all_positions() {
        let mut deck: Deck<2> = Deck::new(1);
        deck.deal(0, Deck::<2>::HOLE_CARDS);
        deck.reset();
        assert!(deck.hole(0).iter().all(|c| c.is_none()));
        assert_eq!(deck.state(), DeckState::Auto);
    }
}
