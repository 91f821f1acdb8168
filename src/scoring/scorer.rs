use tracing::{debug, info};

use super::context::ScoringContext;
use super::error::{ScoringError, ScoringResult};
use super::types::{BatchStats, ScoredBatch, ScoredCandidate, ScoringWeights};
use crate::cache::LikelihoodCache;
use crate::draw::CandidateSet;
use crate::model::LikelihoodModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassMode {
    Batched,
    PerCandidate,
}

/// Combines CVAE likelihood, temporal and I-Ching scores for a set of candidates.
#[derive(Debug)]
pub struct CandidateScorer {
    model: LikelihoodModel,
    weights: ScoringWeights,
    cache: Option<LikelihoodCache>,
}

impl CandidateScorer {
    pub fn new(
        model: LikelihoodModel,
        weights: ScoringWeights,
        cache: Option<LikelihoodCache>,
    ) -> ScoringResult<Self> {
        weights.validate()?;
        Ok(Self {
            model,
            weights,
            cache,
        })
    }

    pub fn stub(num_numbers: usize) -> ScoringResult<Self> {
        Self::new(
            LikelihoodModel::stub(num_numbers)?,
            ScoringWeights::default(),
            None,
        )
    }

    pub fn model(&self) -> &LikelihoodModel {
        &self.model
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn cache(&self) -> Option<&LikelihoodCache> {
        self.cache.as_ref()
    }

    /// Scores every candidate with one batched likelihood pass, results in input order.
    pub fn score_batch(
        &self,
        candidates: &[CandidateSet],
        ctx: &ScoringContext,
    ) -> ScoringResult<ScoredBatch> {
        self.score_with(candidates, ctx, PassMode::Batched)
    }

    /// Scores candidates with one likelihood pass per candidate, results in input order.
    pub fn score_sequential(
        &self,
        candidates: &[CandidateSet],
        ctx: &ScoringContext,
    ) -> ScoringResult<ScoredBatch> {
        self.score_with(candidates, ctx, PassMode::PerCandidate)
    }

    /// [`Self::score_batch`], sorted by descending score and truncated to `top_n`.
    ///
    /// Ties are broken by ascending set order.
    pub fn rank(
        &self,
        candidates: &[CandidateSet],
        ctx: &ScoringContext,
        top_n: usize,
    ) -> ScoringResult<ScoredBatch> {
        let mut batch = self.score_batch(candidates, ctx)?;

        sort_by_score(&mut batch.candidates);
        batch.candidates.truncate(top_n);

        if let Some(top) = batch.top() {
            info!(
                top_set = %top.set,
                top_score = top.score,
                candidates = batch.stats.candidates,
                kept = batch.len(),
                "Ranking complete"
            );
        }

        Ok(batch)
    }

    fn score_with(
        &self,
        candidates: &[CandidateSet],
        ctx: &ScoringContext,
        mode: PassMode,
    ) -> ScoringResult<ScoredBatch> {
        if candidates.is_empty() {
            debug!("No candidates provided for scoring");
            return Ok(ScoredBatch::empty());
        }

        if ctx.num_numbers() as usize != self.model.num_numbers() {
            return Err(ScoringError::InvalidInput {
                reason: format!(
                    "context pool of {} numbers does not match model pool of {}",
                    ctx.num_numbers(),
                    self.model.num_numbers()
                ),
            });
        }

        let (log_likelihoods, stats) = self.resolve_likelihoods(candidates, ctx.condition(), mode)?;
        let normalized = min_max_normalize(&log_likelihoods);
        let total_weight = self.weights.total();

        let scored = candidates
            .iter()
            .zip(log_likelihoods.iter().zip(normalized))
            .map(|(set, (&log_likelihood, likelihood))| {
                let temporal = ctx.temporal().score(set.numbers())?;
                let evaluation =
                    ctx.iching()
                        .evaluate_set(set, ctx.recent_numbers(), ctx.set_weights())?;

                let score = (self.weights.likelihood * likelihood
                    + self.weights.temporal * temporal
                    + self.weights.iching * evaluation.score)
                    / total_weight;

                Ok(ScoredCandidate {
                    set: set.clone(),
                    score,
                    log_likelihood,
                    likelihood,
                    temporal,
                    iching: evaluation.score,
                    iching_components: evaluation.components,
                })
            })
            .collect::<ScoringResult<Vec<_>>>()?;

        debug!(
            mode = ?mode,
            candidates = stats.candidates,
            cache_hits = stats.cache_hits,
            model_passes = stats.model_passes,
            "Scored candidates"
        );

        Ok(ScoredBatch {
            candidates: scored,
            stats,
        })
    }

    /// Cache lookups first; misses go to the model in one batch or one-by-one.
    fn resolve_likelihoods(
        &self,
        candidates: &[CandidateSet],
        condition: &[f32],
        mode: PassMode,
    ) -> ScoringResult<(Vec<f32>, BatchStats)> {
        let mut resolved: Vec<Option<f32>> = match &self.cache {
            Some(cache) => candidates
                .iter()
                .map(|c| cache.get(condition, c))
                .collect(),
            None => vec![None; candidates.len()],
        };

        let misses: Vec<usize> = resolved
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
            .collect();
        let cache_hits = candidates.len() - misses.len();

        let model_passes = if misses.is_empty() {
            0
        } else {
            match mode {
                PassMode::Batched => {
                    let fresh = if misses.len() == candidates.len() {
                        self.model.log_likelihood_batch(candidates, condition)?
                    } else {
                        let miss_sets: Vec<CandidateSet> =
                            misses.iter().map(|&i| candidates[i].clone()).collect();
                        self.model.log_likelihood_batch(&miss_sets, condition)?
                    };
                    for (&i, value) in misses.iter().zip(fresh) {
                        resolved[i] = Some(value);
                    }
                    misses.len().div_ceil(self.model.max_batch_size())
                }
                PassMode::PerCandidate => {
                    for &i in &misses {
                        resolved[i] = Some(self.model.log_likelihood(&candidates[i], condition)?);
                    }
                    misses.len()
                }
            }
        };

        if let Some(cache) = &self.cache {
            for &i in &misses {
                if let Some(value) = resolved[i] {
                    cache.insert(condition, &candidates[i], value);
                }
            }
        }

        let log_likelihoods = resolved
            .into_iter()
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| ScoringError::ComputationFailed {
                reason: "model returned fewer likelihoods than candidates".to_string(),
            })?;

        Ok((
            log_likelihoods,
            BatchStats {
                candidates: candidates.len(),
                cache_hits,
                model_passes,
            },
        ))
    }
}

/// Descending score under IEEE total order (NaN first), then ascending set.
pub(crate) fn sort_by_score(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.set.cmp(&b.set)));
}

/// Scales to `[0, 1]` across the finite values of the batch.
///
/// Non-finite values map to `0.0`. Finite values equal to within rounding all map to `1.0`.
pub(crate) fn min_max_normalize(values: &[f32]) -> Vec<f32> {
    let finite = || values.iter().copied().filter(|v| v.is_finite());
    let min = finite().fold(f32::INFINITY, f32::min);
    let max = finite().fold(f32::NEG_INFINITY, f32::max);
    if min > max {
        return vec![0.0; values.len()];
    }

    let range = max - min;
    let tolerance = f32::EPSILON * min.abs().max(max.abs()).max(1.0) * 4.0;
    let degenerate = !range.is_finite() || range <= tolerance;

    values
        .iter()
        .map(|&v| match (v.is_finite(), degenerate) {
            (false, _) => 0.0,
            (true, true) => 1.0,
            (true, false) => (v - min) / range,
        })
        .collect()
}
