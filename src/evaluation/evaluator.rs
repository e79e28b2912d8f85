//! A reference seven-card evaluator.
//!
//! Spec treats the indexer/evaluator as an external collaborator (C2):
//! Node never hardcodes a ranking algorithm, it takes one as a
//! [`HandRanker`] function. This module is one concrete, correct-but-
//! unoptimized implementation of that collaborator, enough to drive the
//! concrete test scenarios and a real `Commander`/`Matchmaker` without
//! depending on an external crate that doesn't exist in the donor's
//! dependency graph.

use super::strength::Strength;
use crate::cards::card::Card;
use crate::cards::rank::Rank;

/// evaluates a player's best five-card hand out of any 5-7 cards
pub fn evaluate(cards: &[Card]) -> Strength {
    assert!(cards.len() >= 5, "need at least 5 cards to rank a hand");
    combinations(cards, 5)
        .iter()
        .map(|five| best_five(five))
        .max()
        .expect("at least one combination of 5")
}

/// a function injectable into Node/Matchmaker in place of a real indexer
pub trait HandRanker: Fn(&[Card]) -> Strength {}
impl<F: Fn(&[Card]) -> Strength> HandRanker for F {}

fn combinations(cards: &[Card], k: usize) -> Vec<Vec<Card>> {
    if k == 0 {
        return vec![vec![]];
    }
    if cards.len() < k {
        return vec![];
    }
    let mut out = Vec::new();
    for i in 0..=(cards.len() - k) {
        for mut rest in combinations(&cards[i + 1..], k - 1) {
            rest.insert(0, cards[i]);
            out.push(rest);
        }
    }
    out
}

fn best_five(five: &[Card]) -> Strength {
    let mut ranks: Vec<Rank> = five.iter().map(|c| c.rank()).collect();
    ranks.sort_by(|a, b| b.cmp(a));
    let flush = five.iter().all(|c| c.suit() == five[0].suit());
    let straight_high = straight_high_card(&ranks);

    if flush {
        if let Some(high) = straight_high {
            return Strength::StraightFlush(high);
        }
    }

    let mut counts: Vec<(Rank, usize)> = Vec::new();
    for r in &ranks {
        if let Some(entry) = counts.iter_mut().find(|(rr, _)| rr == r) {
            entry.1 += 1;
        } else {
            counts.push((*r, 1));
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

    match counts.as_slice() {
        [(r, 4), ..] => Strength::FourOfAKind(*r),
        [(r3, 3), (r2, 2), ..] => Strength::FullHouse(*r3, *r2),
        _ if flush => Strength::Flush(ranks[0]),
        _ if straight_high.is_some() => Strength::Straight(straight_high.unwrap()),
        [(r, 3), ..] => Strength::ThreeOfAKind(*r),
        [(hi, 2), (lo, 2), ..] => Strength::TwoPair((*hi).max(*lo), (*hi).min(*lo)),
        [(r, 2), ..] => Strength::OnePair(*r),
        _ => Strength::HighCard(ranks[0]),
    }
}

/// returns the high rank of a straight within five descending-sorted,
/// distinct ranks, treating the wheel (A-2-3-4-5) as ace-low
fn straight_high_card(sorted_desc: &[Rank]) -> Option<Rank> {
    let mut values: Vec<i8> = sorted_desc.iter().map(|r| *r as i8).collect();
    values.dedup();
    if values.len() != 5 {
        return None;
    }
    if values[0] - values[4] == 4 {
        return Some(sorted_desc[0]);
    }
    // wheel: A,5,4,3,2 sorted desc as values [12,3,2,1,0]
    if values == [12, 3, 2, 1, 0] {
        return Some(Rank::Five);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::suit::Suit;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[test]
    fn recognizes_a_flush_over_a_straight() {
        let hand = vec![
            card(Rank::Two, Suit::Club),
            card(Rank::Five, Suit::Club),
            card(Rank::Nine, Suit::Club),
            card(Rank::Jack, Suit::Club),
            card(Rank::Ace, Suit::Club),
            card(Rank::Three, Suit::Heart),
            card(Rank::Four, Suit::Spade),
        ];
        assert!(matches!(evaluate(&hand), Strength::Flush(Rank::Ace)));
    }

    #[test]
    fn recognizes_the_wheel_straight() {
        let hand = vec![
            card(Rank::Ace, Suit::Club),
            card(Rank::Two, Suit::Heart),
            card(Rank::Three, Suit::Spade),
            card(Rank::Four, Suit::Diamond),
            card(Rank::Five, Suit::Club),
            card(Rank::King, Suit::Heart),
            card(Rank::Nine, Suit::Spade),
        ];
        assert!(matches!(evaluate(&hand), Strength::Straight(Rank::Five)));
    }

    #[test]
    fn aces_beat_seven_deuce() {
        let mut board = vec![
            card(Rank::King, Suit::Diamond),
            card(Rank::Queen, Suit::Heart),
            card(Rank::Four, Suit::Club),
            card(Rank::Nine, Suit::Spade),
            card(Rank::Two, Suit::Diamond),
        ];
        let mut aces = board.clone();
        aces.push(card(Rank::Ace, Suit::Heart));
        aces.push(card(Rank::Ace, Suit::Spade));
        board.push(card(Rank::Seven, Suit::Club));
        board.push(card(Rank::Two, Suit::Club));
        assert!(evaluate(&aces) > evaluate(&board));
    }
}
