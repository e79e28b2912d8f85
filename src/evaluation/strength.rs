use crate::cards::rank::Rank;
use std::cmp::Ordering;
use std::fmt::Display;

/// the rank category plus enough kicker information to order any two
/// five-card hands unambiguously. Higher variant, then higher contained
/// `Rank`s, beats lower.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Strength {
    HighCard(Rank),
    OnePair(Rank),
    TwoPair(Rank, Rank),
    ThreeOfAKind(Rank),
    Straight(Rank),
    Flush(Rank),
    FullHouse(Rank, Rank),
    FourOfAKind(Rank),
    StraightFlush(Rank),
}

impl Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strength::HighCard(r) => write!(f, "high card {r}"),
            Strength::OnePair(r) => write!(f, "pair of {r}s"),
            Strength::TwoPair(hi, lo) => write!(f, "two pair, {hi}s and {lo}s"),
            Strength::ThreeOfAKind(r) => write!(f, "trip {r}s"),
            Strength::Straight(r) => write!(f, "straight to {r}"),
            Strength::Flush(r) => write!(f, "flush, {r} high"),
            Strength::FullHouse(trips, pair) => write!(f, "full house, {trips}s over {pair}s"),
            Strength::FourOfAKind(r) => write!(f, "quad {r}s"),
            Strength::StraightFlush(r) => write!(f, "straight flush to {r}"),
        }
    }
}

impl Strength {
    fn category(&self) -> u8 {
        match self {
            Strength::HighCard(_) => 0,
            Strength::OnePair(_) => 1,
            Strength::TwoPair(..) => 2,
            Strength::ThreeOfAKind(_) => 3,
            Strength::Straight(_) => 4,
            Strength::Flush(_) => 5,
            Strength::FullHouse(..) => 6,
            Strength::FourOfAKind(_) => 7,
            Strength::StraightFlush(_) => 8,
        }
    }
}

impl Ord for Strength {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.category().cmp(&other.category()) {
            Ordering::Equal => match (self, other) {
                (Strength::StraightFlush(a), Strength::StraightFlush(b))
                | (Strength::FourOfAKind(a), Strength::FourOfAKind(b))
                | (Strength::Flush(a), Strength::Flush(b))
                | (Strength::Straight(a), Strength::Straight(b))
                | (Strength::ThreeOfAKind(a), Strength::ThreeOfAKind(b))
                | (Strength::OnePair(a), Strength::OnePair(b))
                | (Strength::HighCard(a), Strength::HighCard(b)) => a.cmp(b),
                (Strength::TwoPair(a1, a2), Strength::TwoPair(b1, b2))
                | (Strength::FullHouse(a1, a2), Strength::FullHouse(b1, b2)) => {
                    a1.cmp(b1).then(a2.cmp(b2))
                }
                _ => unreachable!("same category implies same variant shape"),
            },
            other => other,
        }
    }
}

impl PartialOrd for Strength {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_beats_straight() {
        assert!(Strength::Flush(Rank::Two) > Strength::Straight(Rank::Ace));
    }

    #[test]
    fn kicker_breaks_tie_within_category() {
        assert!(Strength::OnePair(Rank::Ace) > Strength::OnePair(Rank::King));
    }

    #[test]
    fn full_house_compares_trips_before_pair() {
        assert!(Strength::FullHouse(Rank::Two, Rank::Ace) > Strength::FullHouse(Rank::King, Rank::King));
    }
}
