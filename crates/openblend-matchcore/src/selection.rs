//! Weighted outcome selection.
//!
//! ```text
//!   pool [(60, A), (40, B)],  r in [0, 100)
//!
//!   sum:  60        100
//!         |--- A ---|--- B ---|
//!   r=10 -> A   r=59 -> A   r=60 -> B   r=70 -> B
//! ```
//!
//! The pool is walked in stored order accumulating weights; the first entry
//! whose running sum exceeds `r` wins. With weights summing to the odds
//! denominator, each entry is chosen with probability `weight / total`.

use openblend_types::{OutcomePool, TemplateId};

use crate::RandomnessProvider;

/// Pick the entry selected by `r`. `None` only if `r` is at or past the
/// pool's total weight.
#[must_use]
pub fn select_outcome(pool: &OutcomePool, r: u64) -> Option<TemplateId> {
    let mut sum: u64 = 0;
    for entry in pool.entries() {
        sum += u64::from(entry.weight);
        if sum > r {
            return Some(entry.template);
        }
    }
    None
}

/// Reduce delivered bytes to a draw in `[0, total_odds)` and select.
#[must_use]
pub fn resolve_pool(pool: &OutcomePool, seed: [u8; 32], total_odds: u32) -> Option<TemplateId> {
    let r = RandomnessProvider::new(seed).get_rand(u64::from(total_odds));
    let selected = select_outcome(pool, r);
    tracing::debug!(r, outcome = ?selected, "Outcome selected");
    selected
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use openblend_types::OutcomeEntry;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;

    const A: TemplateId = TemplateId(1);
    const B: TemplateId = TemplateId(2);

    fn sixty_forty() -> OutcomePool {
        OutcomePool::new(vec![OutcomeEntry::new(60, A), OutcomeEntry::new(40, B)])
    }

    #[test]
    fn worked_examples() {
        let pool = sixty_forty();
        assert_eq!(select_outcome(&pool, 70), Some(B));
        assert_eq!(select_outcome(&pool, 10), Some(A));
    }

    #[test]
    fn boundaries() {
        let pool = sixty_forty();
        assert_eq!(select_outcome(&pool, 0), Some(A));
        assert_eq!(select_outcome(&pool, 59), Some(A));
        assert_eq!(select_outcome(&pool, 60), Some(B));
        assert_eq!(select_outcome(&pool, 99), Some(B));
        assert_eq!(select_outcome(&pool, 100), None);
    }

    #[test]
    fn resolve_uses_reduced_draw() {
        // First word is 170; 170 % 100 = 70 -> B.
        let mut seed = [0u8; 32];
        seed[7] = 170;
        assert_eq!(resolve_pool(&sixty_forty(), seed, 100), Some(B));
        seed[7] = 110;
        assert_eq!(resolve_pool(&sixty_forty(), seed, 100), Some(A));
    }

    #[test]
    fn frequencies_converge_to_weights() {
        let pool = OutcomePool::new(vec![
            OutcomeEntry::new(50, TemplateId(1)),
            OutcomeEntry::new(30, TemplateId(2)),
            OutcomeEntry::new(20, TemplateId(3)),
        ]);
        let mut rng = StdRng::seed_from_u64(0x0B1E_0D);
        let draws = 20_000u32;
        let mut counts: HashMap<TemplateId, u32> = HashMap::new();
        for _ in 0..draws {
            let seed: [u8; 32] = rng.r#gen();
            if let Some(t) = resolve_pool(&pool, seed, 100) {
                *counts.entry(t).or_default() += 1;
            }
        }
        for entry in pool.entries() {
            let observed = f64::from(counts[&entry.template]) / f64::from(draws);
            let expected = f64::from(entry.weight) / 100.0;
            assert!(
                (observed - expected).abs() < 0.02,
                "{}: observed {observed:.3}, expected {expected:.3}",
                entry.template
            );
        }
    }
}
