use crate::{Probability, Regret};

/// `p_i ∝ max(0,regret_i)`, uniform over `regrets.len()` when the positive
/// sum is zero (or `regrets` is empty, which callers must not pass).
pub fn regret_match(regrets: &[Regret]) -> Vec<Probability> {
    let positive: Vec<f64> = regrets.iter().map(|&r| r.max(0) as f64).collect();
    let sum: f64 = positive.iter().sum();
    if sum > 0.0 {
        positive.iter().map(|&p| (p / sum) as Probability).collect()
    } else {
        vec![1.0 / regrets.len() as Probability; regrets.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_when_all_non_positive() {
        let probs = regret_match(&[-5, 0, -100]);
        assert!(probs.iter().all(|&p| (p - 1.0 / 3.0).abs() < 1e-6));
    }

    #[test]
    fn proportional_to_positive_regret() {
        let probs = regret_match(&[30, 10, 0]);
        assert!((probs[0] - 0.75).abs() < 1e-6);
        assert!((probs[1] - 0.25).abs() < 1e-6);
        assert_eq!(probs[2], 0.0);
    }

    #[test]
    fn sums_to_one() {
        let probs = regret_match(&[4, 4, 4, 4]);
        let total: f32 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
