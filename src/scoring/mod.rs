//! Candidate scoring: batched CVAE likelihood plus per-candidate auxiliary scorers.
//!
//! [`CandidateScorer::score_batch`] computes generative likelihoods for every uncached
//! candidate in one model pass. The [`TemporalScorer`] and [`IChingScorer`] stay
//! per-candidate; they are cheap closed-form lookups over a [`ScoringContext`] built
//! once from the draw history.
//!
//! # Normalisation
//!
//! Log-likelihoods are min–max scaled across the batch before weighting, so the
//! likelihood component of a candidate's score depends on the other candidates scored
//! with it. Rankings within one batch are unaffected; scores from different batches are
//! not comparable.

pub mod context;
pub mod error;
pub mod generator;
pub mod iching;
pub mod scorer;
pub mod temporal;
pub mod types;


pub use context::{ContextConfig, ScoringContext};
pub use error::{ScoringError, ScoringResult};
pub use generator::CandidateGenerator;
pub use iching::IChingScorer;
pub use scorer::CandidateScorer;
pub use temporal::{DecayClock, TemporalScorer};
pub use types::{
    BatchStats, ScoredBatch, ScoredCandidate, ScoringReport, ScoringWeights, SetComponents,
    SetEvaluation, SetWeights,
};
