use serde::Serialize;

use super::error::{ScoringError, ScoringResult};
use crate::draw::CandidateSet;

/// Weights for the heuristic components of [`IChingScorer::score_prediction_sets`](super::IChingScorer::score_prediction_sets).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SetWeights {
    pub spread: f32,
    pub sum: f32,
    pub frequency: f32,
    pub recent: f32,
}

impl Default for SetWeights {
    fn default() -> Self {
        Self {
            spread: 0.25,
            sum: 0.25,
            frequency: 0.25,
            recent: 0.25,
        }
    }
}

/// Heuristic components for one candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SetComponents {
    /// `(highest - lowest) / N`, `0` for single-number sets.
    pub spread: f32,
    /// `1 - |sum - E| / E` with `E = (N + 1) / 2 · k`.
    pub sum: f32,
    /// Mean I-Ching probability of the members.
    pub frequency: f32,
    /// `1 - overlap / k` against recently drawn numbers.
    pub recent: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A candidate set evaluated by the I-Ching heuristics.
pub struct SetEvaluation {
    pub set: CandidateSet,
    pub score: f32,
    pub components: SetComponents,
}

/// Weights for combining the three scorers into a final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    /// Batch-normalised CVAE likelihood.
    pub likelihood: f32,
    /// Temporal recency score.
    pub temporal: f32,
    /// I-Ching heuristic score.
    pub iching: f32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            likelihood: 0.5,
            temporal: 0.25,
            iching: 0.25,
        }
    }
}

impl ScoringWeights {
    pub fn new(likelihood: f32, temporal: f32, iching: f32) -> ScoringResult<Self> {
        let weights = Self {
            likelihood,
            temporal,
            iching,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> ScoringResult<()> {
        let all = [self.likelihood, self.temporal, self.iching];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ScoringError::InvalidInput {
                reason: format!("weights must be finite and non-negative, got {:?}", self),
            });
        }
        if self.total() <= 0.0 {
            return Err(ScoringError::InvalidInput {
                reason: "at least one weight must be positive".to_string(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn total(&self) -> f32 {
        self.likelihood + self.temporal + self.iching
    }
}

#[derive(Debug, Clone, Serialize)]
/// Candidate annotated with every component score.
pub struct ScoredCandidate {
    pub set: CandidateSet,
    /// Weighted final score.
    pub score: f32,
    /// Raw CVAE log-likelihood.
    pub log_likelihood: f32,
    /// Log-likelihood min–max normalised across the batch.
    pub likelihood: f32,
    pub temporal: f32,
    pub iching: f32,
    pub iching_components: SetComponents,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub candidates: usize,
    pub cache_hits: usize,
    pub model_passes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredBatch {
    pub candidates: Vec<ScoredCandidate>,
    pub stats: BatchStats,
}

impl ScoredBatch {
    pub fn empty() -> Self {
        Self {
            candidates: vec![],
            stats: BatchStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn top(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }
}

#[derive(Debug, Clone, Serialize)]
/// Output of one end-to-end run.
pub struct ScoringReport {
    pub model_loaded: bool,
    pub history_draws: usize,
    pub elapsed_micros: u128,
    pub stats: BatchStats,
    pub ranked: Vec<ScoredCandidate>,
}
