//! Recency-weighted number activity.
//!
//! Each occurrence contributes `0.5^(age / half_life)`. Age is measured in days from the
//! latest draw when every draw is dated, otherwise in draws (`0` = newest).
//! Ensemble weights add a small floor so undrawn numbers are never excluded.

use serde::Serialize;

use super::error::{ScoringError, ScoringResult};
use crate::constants::TEMPORAL_WEIGHT_FLOOR;
use crate::draw::History;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecayClock {
    Draws,
    Days,
}

#[derive(Debug, Clone)]
pub struct TemporalScorer {
    num_numbers: u32,
    half_life: f32,
    clock: DecayClock,
    raw: Vec<f32>,
    max_raw: f32,
}

impl TemporalScorer {
    pub fn new(history: &History, half_life: f32) -> ScoringResult<Self> {
        if !half_life.is_finite() || half_life <= 0.0 {
            return Err(ScoringError::InvalidInput {
                reason: format!("half_life must be finite and > 0, got {half_life}"),
            });
        }

        let num_numbers = history.num_numbers();
        let draws = history.draws();
        let clock = if history.fully_dated() {
            DecayClock::Days
        } else {
            DecayClock::Draws
        };

        let latest = draws.iter().filter_map(|d| d.drawn_on()).max();
        let mut raw = vec![0.0f32; num_numbers as usize];

        for (idx, draw) in draws.iter().enumerate() {
            let age = match (clock, latest, draw.drawn_on()) {
                (DecayClock::Days, Some(latest), Some(date)) => {
                    (latest - date).num_days().max(0) as f32
                }
                _ => (draws.len() - 1 - idx) as f32,
            };
            let weight = 0.5f32.powf(age / half_life);

            for &n in draw.numbers() {
                raw[n as usize - 1] += weight;
            }
        }

        let max_raw = raw.iter().copied().fold(0.0f32, f32::max);

        Ok(Self {
            num_numbers,
            half_life,
            clock,
            raw,
            max_raw,
        })
    }

    #[inline]
    pub fn clock(&self) -> DecayClock {
        self.clock
    }

    #[inline]
    pub fn half_life(&self) -> f32 {
        self.half_life
    }

    /// Accumulated decayed occurrences, index `n - 1` for number `n`.
    #[inline]
    pub fn raw_weights(&self) -> &[f32] {
        &self.raw
    }

    /// `raw + TEMPORAL_WEIGHT_FLOOR` scaled to mean `1.0`; all `1.0` for an empty history.
    ///
    /// Every weight is strictly positive.
    pub fn temporal_weights(&self) -> Vec<f32> {
        let total: f32 = self.raw.iter().sum();
        if total <= 0.0 {
            return vec![1.0; self.raw.len()];
        }
        let smoothed: Vec<f32> = self.raw.iter().map(|w| w + TEMPORAL_WEIGHT_FLOOR).collect();
        let mean = smoothed.iter().sum::<f32>() / smoothed.len() as f32;
        smoothed.into_iter().map(|w| w / mean).collect()
    }

    /// Mean of `raw / max_raw` over the set, in `[0, 1]`.
    pub fn score(&self, numbers: &[u32]) -> ScoringResult<f32> {
        if numbers.is_empty() {
            return Err(ScoringError::InvalidInput {
                reason: "cannot score an empty set".to_string(),
            });
        }
        if let Some(&n) = numbers
            .iter()
            .find(|&&n| n == 0 || n > self.num_numbers)
        {
            return Err(ScoringError::InvalidInput {
                reason: format!("number {n} is outside the pool 1..={}", self.num_numbers),
            });
        }
        if self.max_raw <= 0.0 {
            return Ok(0.0);
        }

        let total: f32 = numbers
            .iter()
            .map(|&n| self.raw[n as usize - 1] / self.max_raw)
            .sum();
        Ok(total / numbers.len() as f32)
    }
}
