use crate::error::{Result, SolverError};
use crate::Chips;

/// floor each fractional award, then hand the leftover chips one at a time
/// to the players with the largest fractional remainder, largest first.
/// Guarantees `sum(output) == floor(sum(input)).max(pot)`-exact distribution
/// of `pot` when `exact_awards` sums to `pot` as a float.
pub fn hamilton_apportion(exact_awards: &[f64], pot: Chips) -> Result<Vec<Chips>> {
    let mut floors: Vec<Chips> = exact_awards.iter().map(|a| a.floor() as Chips).collect();
    let distributed: Chips = floors.iter().sum();
    let mut residue = pot - distributed;
    if residue < 0 {
        return Err(SolverError::Internal(format!(
            "hamilton apportionment over-awarded: floors sum to {distributed} but pot is {pot}"
        )));
    }
    let mut order: Vec<usize> = (0..exact_awards.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact_awards[a].fract();
        let fb = exact_awards[b].fract();
        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal)
    });
    for &i in order.iter() {
        if residue == 0 {
            break;
        }
        floors[i] += 1;
        residue -= 1;
    }
    if residue != 0 {
        return Err(SolverError::Internal(format!(
            "hamilton apportionment left {residue} chips undistributed"
        )));
    }
    Ok(floors)
}

/// `min(cap, round(pot*rate))`, `cap == 0` meaning uncapped
pub fn rake_chips(pot: Chips, rate: f64, cap: Chips) -> Chips {
    if rate <= 0.0 {
        return 0;
    }
    let raw = (pot as f64 * rate).round() as Chips;
    if cap > 0 {
        raw.min(cap)
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apportionment_sums_to_pot() {
        let awards = [33.333, 33.333, 33.334];
        let out = hamilton_apportion(&awards, 100).unwrap();
        assert_eq!(out.iter().sum::<Chips>(), 100);
    }

    #[test]
    fn largest_remainder_gets_priority() {
        // 100 split 3 ways: 33,33,33 floors, 1 leftover goes to the largest
        // fractional part, which here is the third entry.
        let awards = [33.2, 33.3, 33.5];
        let out = hamilton_apportion(&awards, 100).unwrap();
        assert_eq!(out, vec![33, 33, 34]);
    }

    #[test]
    fn rake_respects_cap() {
        assert_eq!(rake_chips(10_000, 0.05, 100), 100);
        assert_eq!(rake_chips(100, 0.05, 100), 5);
        assert_eq!(rake_chips(100, 0.0, 0), 0);
    }
}
