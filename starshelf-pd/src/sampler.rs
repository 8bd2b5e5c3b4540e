//! Weighted sampler
//!
//! Roulette selection over (identifier, weight) pairs. Candidates with a
//! non-positive (or non-finite) weight are dropped before totals are taken,
//! so they can never be drawn and cannot skew the total.
//!
//! Iteration is in input order; equal weights are resolved by position.

use rand::Rng;

/// Identifier with its selection weight
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    pub id: T,
    pub weight: f64,
}

fn is_eligible(weight: f64) -> bool {
    weight > 0.0 && weight.is_finite()
}

/// Sum of eligible weights
pub fn total_weight<T>(candidates: &[Candidate<T>]) -> f64 {
    candidates
        .iter()
        .filter(|c| is_eligible(c.weight))
        .map(|c| c.weight)
        .sum()
}

/// Index of one weighted draw, or `None` if nothing is eligible
fn draw_index<T, R: Rng + ?Sized>(candidates: &[Candidate<T>], rng: &mut R) -> Option<usize> {
    let total = total_weight(candidates);
    if !(total > 0.0 && total.is_finite()) {
        return None;
    }

    let target = rng.gen_range(0.0..total);
    let mut cumulative = 0.0;
    let mut last_eligible = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if !is_eligible(candidate.weight) {
            continue;
        }
        cumulative += candidate.weight;
        last_eligible = Some(i);
        if cumulative >= target {
            return Some(i);
        }
    }
    // Float rounding can leave the running sum just short of target
    last_eligible
}

/// Draw one identifier with probability proportional to its weight
pub fn draw_one<'a, T, R: Rng + ?Sized>(candidates: &'a [Candidate<T>], rng: &mut R) -> Option<&'a T> {
    draw_index(candidates, rng).map(|i| &candidates[i].id)
}

/// Draw up to `k` distinct identifiers, removing each one after it is drawn
///
/// Stops early when no positive weight remains. Result is in draw order.
pub fn draw_many<T, R: Rng + ?Sized>(candidates: Vec<Candidate<T>>, k: usize, rng: &mut R) -> Vec<T> {
    let mut remaining: Vec<Candidate<T>> = candidates
        .into_iter()
        .filter(|c| is_eligible(c.weight))
        .collect();
    let mut drawn = Vec::with_capacity(k.min(remaining.len()));

    while drawn.len() < k {
        let Some(i) = draw_index(&remaining, rng) else {
            break;
        };
        drawn.push(remaining.remove(i).id);
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn candidates(weights: &[f64]) -> Vec<Candidate<usize>> {
        weights
            .iter()
            .enumerate()
            .map(|(id, &weight)| Candidate { id, weight })
            .collect()
    }

    #[test]
    fn test_zero_weight_never_drawn() {
        let pool = candidates(&[1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let drawn = *draw_one(&pool, &mut rng).unwrap();
            assert_ne!(drawn, 5);
        }
    }

    #[test]
    fn test_single_candidate_always_drawn() {
        let pool = candidates(&[0.5]);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(draw_one(&pool, &mut rng), Some(&0));
        }
    }

    #[test]
    fn test_no_selection_without_positive_weight() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(draw_one::<usize, _>(&[], &mut rng), None);
        assert_eq!(draw_one(&candidates(&[0.0, -2.0]), &mut rng), None);
        assert_eq!(draw_one(&candidates(&[f64::NAN]), &mut rng), None);
        assert!(draw_many(candidates(&[0.0, 0.0]), 3, &mut rng).is_empty());
    }

    #[test]
    fn test_negative_weight_does_not_poison_total() {
        let pool = candidates(&[-100.0, 2.0]);
        assert_eq!(total_weight(&pool), 2.0);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..1000 {
            assert_eq!(draw_one(&pool, &mut rng), Some(&1));
        }
    }

    #[test]
    fn test_draws_follow_weights() {
        let pool = candidates(&[1.0, 3.0]);
        let mut rng = StdRng::seed_from_u64(42);
        let heavy = (0..20_000)
            .filter(|_| *draw_one(&pool, &mut rng).unwrap() == 1)
            .count();
        // Expect ~15,000
        assert!((14_000..16_000).contains(&heavy), "heavy drawn {} times", heavy);
    }

    #[test]
    fn test_draw_many_is_distinct_and_bounded() {
        let mut rng = StdRng::seed_from_u64(5);
        let drawn = draw_many(candidates(&[1.0, 2.0, 0.0, 4.0, 0.5]), 3, &mut rng);
        assert_eq!(drawn.len(), 3);
        let unique: HashSet<_> = drawn.iter().collect();
        assert_eq!(unique.len(), 3);
        assert!(!drawn.contains(&2));

        // Asking for more than exist returns every positive-weight id
        let drawn = draw_many(candidates(&[1.0, 0.0, 1.0]), 10, &mut rng);
        let unique: HashSet<_> = drawn.into_iter().collect();
        assert_eq!(unique, HashSet::from([0, 2]));
    }

    #[test]
    fn test_draw_many_zero_k() {
        let mut rng = StdRng::seed_from_u64(9);
        assert!(draw_many(candidates(&[1.0]), 0, &mut rng).is_empty());
    }
}
