use std::collections::HashSet;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use super::error::{ScoringError, ScoringResult};
use crate::draw::CandidateSet;

/// Attempts per requested candidate before generation gives up.
const ATTEMPTS_PER_CANDIDATE: usize = 50;

/// Upper bound on up-front allocation; larger requests grow on demand.
const MAX_PREALLOCATED: usize = 4096;

/// Deterministic weighted sampler for candidate sets.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    rng: ChaCha8Rng,
}

impl CandidateGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draws up to `draw_size` distinct numbers, weighted by `probabilities` (index `n - 1`).
    ///
    /// Once every remaining weight is zero the rest are picked uniformly.
    fn sample_set(&mut self, probabilities: &[f32], draw_size: usize) -> Vec<u32> {
        let mut weights = probabilities.to_vec();
        let mut picked = Vec::with_capacity(draw_size);

        for _ in 0..draw_size {
            let idx = match WeightedIndex::new(&weights) {
                Ok(dist) => dist.sample(&mut self.rng),
                Err(_) => {
                    let remaining: Vec<usize> = (0..weights.len())
                        .filter(|i| !picked.contains(&(*i as u32 + 1)))
                        .collect();
                    match remaining.choose(&mut self.rng) {
                        Some(&i) => i,
                        None => break,
                    }
                }
            };

            picked.push(idx as u32 + 1);
            weights[idx] = 0.0;
        }

        picked
    }

    /// Generates up to `count` distinct candidate sets.
    ///
    /// Returns fewer when the pool holds fewer than `count` distinct sets, or when
    /// `count * 50` attempts do not find them.
    pub fn generate(
        &mut self,
        probabilities: &[f32],
        draw_size: usize,
        count: usize,
    ) -> ScoringResult<Vec<CandidateSet>> {
        let num_numbers = probabilities.len();
        if draw_size == 0 || draw_size > num_numbers {
            return Err(ScoringError::InvalidInput {
                reason: format!("draw_size must be between 1 and {num_numbers}, got {draw_size}"),
            });
        }
        if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ScoringError::InvalidInput {
                reason: "probabilities must be finite and non-negative".to_string(),
            });
        }

        let target = count.min(binomial(num_numbers, draw_size));
        let mut seen: HashSet<[u8; 32]> = HashSet::with_capacity(target.min(MAX_PREALLOCATED));
        let mut candidates = Vec::with_capacity(target.min(MAX_PREALLOCATED));
        let max_attempts = target.saturating_mul(ATTEMPTS_PER_CANDIDATE);
        let mut attempts = 0;

        while candidates.len() < target && attempts < max_attempts {
            attempts += 1;
            let numbers = self.sample_set(probabilities, draw_size);
            let set = CandidateSet::new(numbers, num_numbers as u32)?;
            if seen.insert(set.hash()) {
                candidates.push(set);
            }
        }

        if candidates.len() < count {
            warn!(
                requested = count,
                generated = candidates.len(),
                attempts,
                "Candidate generation stopped early"
            );
        } else {
            debug!(generated = candidates.len(), attempts, "Generated candidates");
        }

        Ok(candidates)
    }
}

/// `C(n, k)`, saturating at `usize::MAX`.
fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = match result.checked_mul((n - i) as u128) {
            Some(v) => v / (i as u128 + 1),
            None => return usize::MAX,
        };
    }
    usize::try_from(result).unwrap_or(usize::MAX)
}
