//! Traditional probabilities with five-element modifiers.
//!
//! Number frequencies come from the draw history. Each number's weight is
//! `(count + smoothing) · m(n)` where `m(n) = n mod 5` and multiples of five map to `5`;
//! weights are normalised to a distribution. The scorer can fold temporal weights and
//! model marginals into that distribution, and scores candidate sets by spread, sum
//! balance, frequency and recent activity.

use std::collections::HashSet;

use tracing::debug;

use super::error::{ScoringError, ScoringResult};
use super::types::{SetComponents, SetEvaluation, SetWeights};
use crate::constants::element_modifier;
use crate::draw::{CandidateSet, History};

#[derive(Debug, Clone)]
pub struct IChingScorer {
    num_numbers: u32,
    smoothing: f32,
    frequencies: Vec<u32>,
    probabilities: Vec<f32>,
}

impl IChingScorer {
    /// Counts occurrences across `draws` (numbers outside `1..=num_numbers` are ignored).
    pub fn new<'a, I>(num_numbers: u32, draws: I, smoothing: f32) -> ScoringResult<Self>
    where
        I: IntoIterator<Item = &'a [u32]>,
    {
        if num_numbers == 0 {
            return Err(ScoringError::InvalidInput {
                reason: "num_numbers must be at least 1".to_string(),
            });
        }
        if !smoothing.is_finite() || smoothing < 0.0 {
            return Err(ScoringError::InvalidInput {
                reason: format!("smoothing must be finite and >= 0, got {smoothing}"),
            });
        }

        let mut frequencies = vec![0u32; num_numbers as usize];
        for draw in draws {
            for &n in draw {
                if (1..=num_numbers).contains(&n) {
                    frequencies[n as usize - 1] += 1;
                }
            }
        }

        let mut scorer = Self {
            num_numbers,
            smoothing,
            frequencies,
            probabilities: vec![],
        };
        scorer.calculate_probabilities(None);
        Ok(scorer)
    }

    pub fn from_history(history: &History, smoothing: f32) -> ScoringResult<Self> {
        Self::new(
            history.num_numbers(),
            history.draws().iter().map(|d| d.numbers()),
            smoothing,
        )
    }

    /// Recomputes and stores probabilities, using the scorer's smoothing when `None`.
    ///
    /// Falls back to uniform when every weight is zero (no history and zero smoothing).
    pub fn calculate_probabilities(&mut self, smoothing: Option<f32>) -> &[f32] {
        let smoothing = smoothing.unwrap_or(self.smoothing);

        let weighted: Vec<f32> = (1..=self.num_numbers)
            .map(|n| {
                let count = self.frequencies[n as usize - 1] as f32;
                (count + smoothing) * element_modifier(n) as f32
            })
            .collect();

        self.probabilities = normalize(weighted);
        &self.probabilities
    }

    #[inline]
    pub fn num_numbers(&self) -> u32 {
        self.num_numbers
    }

    /// Raw counts, index `n - 1` for number `n`.
    #[inline]
    pub fn frequencies(&self) -> &[u32] {
        &self.frequencies
    }

    #[inline]
    pub fn frequency(&self, number: u32) -> Option<u32> {
        index_of(number, self.num_numbers).map(|i| self.frequencies[i])
    }

    /// Probabilities, index `n - 1` for number `n`; sums to 1.
    #[inline]
    pub fn probabilities(&self) -> &[f32] {
        &self.probabilities
    }

    #[inline]
    pub fn probability(&self, number: u32) -> Option<f32> {
        index_of(number, self.num_numbers).map(|i| self.probabilities[i])
    }

    /// Multiplies stored probabilities by optional per-number weights and renormalises.
    ///
    /// Missing entries (a shorter slice) count as `1.0`.
    pub fn ensemble_probabilities(
        &self,
        temporal_weights: Option<&[f32]>,
        ml_predictions: Option<&[f32]>,
    ) -> Vec<f32> {
        let combined: Vec<f32> = self
            .probabilities
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let temporal = temporal_weights
                    .and_then(|w| w.get(i).copied())
                    .unwrap_or(1.0);
                let ml = ml_predictions
                    .and_then(|w| w.get(i).copied())
                    .unwrap_or(1.0);
                p * temporal * ml
            })
            .collect();

        normalize(combined)
    }

    /// Mean probability of the numbers in `numbers`.
    pub fn score(&self, numbers: &[u32]) -> ScoringResult<f32> {
        if numbers.is_empty() {
            return Err(ScoringError::InvalidInput {
                reason: "cannot score an empty set".to_string(),
            });
        }

        let mut total = 0.0f32;
        for &n in numbers {
            total += self.probability(n).ok_or_else(|| ScoringError::InvalidInput {
                reason: format!("number {n} is outside the pool 1..={}", self.num_numbers),
            })?;
        }
        Ok(total / numbers.len() as f32)
    }

    /// Evaluates one set against the recently drawn numbers.
    pub fn evaluate_set(
        &self,
        set: &CandidateSet,
        recent_numbers: &HashSet<u32>,
        weights: &SetWeights,
    ) -> ScoringResult<SetEvaluation> {
        let k = set.len();
        if k == 0 {
            return Err(ScoringError::InvalidInput {
                reason: "cannot score an empty set".to_string(),
            });
        }

        let max_number = self.num_numbers as f32;
        let expected_sum = (max_number + 1.0) / 2.0 * k as f32;

        let spread = if k > 1 {
            set.spread() as f32 / max_number
        } else {
            0.0
        };
        let sum = 1.0 - (set.sum() as f32 - expected_sum).abs() / expected_sum;
        let frequency = self.score(set.numbers())?;
        let recent = if recent_numbers.is_empty() {
            1.0
        } else {
            let overlap = set
                .numbers()
                .iter()
                .filter(|n| recent_numbers.contains(n))
                .count();
            1.0 - overlap as f32 / k as f32
        };

        let score = weights.spread * spread
            + weights.sum * sum
            + weights.frequency * frequency
            + weights.recent * recent;

        Ok(SetEvaluation {
            set: set.clone(),
            score,
            components: SetComponents {
                spread,
                sum,
                frequency,
                recent,
            },
        })
    }

    /// Evaluates every set by spread, sum balance, frequency and recency.
    pub fn score_prediction_sets<'a, I>(
        &self,
        candidate_sets: &[CandidateSet],
        recent_draws: I,
        weights: Option<&SetWeights>,
    ) -> ScoringResult<Vec<SetEvaluation>>
    where
        I: IntoIterator<Item = &'a [u32]>,
    {
        let default_weights = SetWeights::default();
        let weights = weights.unwrap_or(&default_weights);
        let recent_numbers = collect_numbers(recent_draws);

        debug!(
            num_sets = candidate_sets.len(),
            recent_numbers = recent_numbers.len(),
            "Scoring prediction sets"
        );

        candidate_sets
            .iter()
            .map(|set| self.evaluate_set(set, &recent_numbers, weights))
            .collect()
    }
}

pub(crate) fn collect_numbers<'a, I>(draws: I) -> HashSet<u32>
where
    I: IntoIterator<Item = &'a [u32]>,
{
    draws.into_iter().flatten().copied().collect()
}

#[inline]
fn index_of(number: u32, num_numbers: u32) -> Option<usize> {
    (1..=num_numbers)
        .contains(&number)
        .then(|| number as usize - 1)
}

fn normalize(values: Vec<f32>) -> Vec<f32> {
    let total: f32 = values.iter().sum();
    if total > 0.0 && total.is_finite() {
        values.into_iter().map(|v| v / total).collect()
    } else {
        let uniform = 1.0 / values.len().max(1) as f32;
        vec![uniform; values.len()]
    }
}
