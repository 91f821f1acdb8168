use std::collections::HashSet;

use tracing::debug;

use super::error::ScoringResult;
use super::iching::{IChingScorer, collect_numbers};
use super::temporal::TemporalScorer;
use super::types::SetWeights;
use crate::config::Config;
use crate::constants::{
    DEFAULT_CONDITION_WINDOW, DEFAULT_HALF_LIFE, DEFAULT_RECENT_WINDOW, DEFAULT_SMOOTHING,
};
use crate::draw::History;
use crate::model::LikelihoodModel;

#[derive(Debug, Clone)]
/// History-derived settings for a [`ScoringContext`].
pub struct ContextConfig {
    pub condition_window: usize,
    pub recent_window: usize,
    pub smoothing: f32,
    pub half_life: f32,
    pub set_weights: SetWeights,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            condition_window: DEFAULT_CONDITION_WINDOW,
            recent_window: DEFAULT_RECENT_WINDOW,
            smoothing: DEFAULT_SMOOTHING,
            half_life: DEFAULT_HALF_LIFE,
            set_weights: SetWeights::default(),
        }
    }
}

impl From<&Config> for ContextConfig {
    fn from(config: &Config) -> Self {
        Self {
            condition_window: config.condition_window,
            recent_window: config.recent_window,
            smoothing: config.smoothing,
            half_life: config.half_life,
            set_weights: SetWeights::default(),
        }
    }
}

/// Everything the scorers need from the history, computed once per run.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    num_numbers: u32,
    condition: Vec<f32>,
    iching: IChingScorer,
    temporal: TemporalScorer,
    recent_numbers: HashSet<u32>,
    set_weights: SetWeights,
}

impl ScoringContext {
    pub fn from_history(history: &History, config: &ContextConfig) -> ScoringResult<Self> {
        let condition = history.condition_vector(config.condition_window);
        let iching = IChingScorer::from_history(history, config.smoothing)?;
        let temporal = TemporalScorer::new(history, config.half_life)?;
        let recent_numbers = collect_numbers(
            history
                .recent(config.recent_window)
                .iter()
                .map(|d| d.numbers()),
        );

        debug!(
            draws = history.len(),
            num_numbers = history.num_numbers(),
            recent_numbers = recent_numbers.len(),
            clock = ?temporal.clock(),
            "Built scoring context"
        );

        Ok(Self {
            num_numbers: history.num_numbers(),
            condition,
            iching,
            temporal,
            recent_numbers,
            set_weights: config.set_weights,
        })
    }

    #[inline]
    pub fn num_numbers(&self) -> u32 {
        self.num_numbers
    }

    /// CVAE condition vector (index `n - 1` for number `n`).
    #[inline]
    pub fn condition(&self) -> &[f32] {
        &self.condition
    }

    #[inline]
    pub fn iching(&self) -> &IChingScorer {
        &self.iching
    }

    #[inline]
    pub fn temporal(&self) -> &TemporalScorer {
        &self.temporal
    }

    #[inline]
    pub fn recent_numbers(&self) -> &HashSet<u32> {
        &self.recent_numbers
    }

    #[inline]
    pub fn set_weights(&self) -> &SetWeights {
        &self.set_weights
    }

    /// I-Ching probabilities combined with temporal weights and the model's marginals.
    pub fn ensemble_probabilities(&self, model: &LikelihoodModel) -> ScoringResult<Vec<f32>> {
        let temporal = self.temporal.temporal_weights();
        let marginals = model.marginals(&self.condition)?;
        Ok(self
            .iching
            .ensemble_probabilities(Some(temporal.as_slice()), Some(marginals.as_slice())))
    }
}
