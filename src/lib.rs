//! Augur library crate (used by the binary, benches and integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Config`], [`ConfigError`] - Run configuration
//! - [`History`], [`Draw`], [`CandidateSet`] - Draw history and candidates
//!
//! ## Model
//! - [`LikelihoodModel`], [`ModelConfig`] - CVAE likelihood (or stub baseline)
//! - [`LikelihoodCache`] - Per-candidate log-likelihood cache
//!
//! ## Scoring
//! - [`CandidateScorer`] - Batched likelihood plus per-candidate auxiliary scores
//! - [`ScoringContext`] - History-derived state shared across a batch
//! - [`IChingScorer`], [`TemporalScorer`] - Auxiliary scorers
//! - [`CandidateGenerator`] - Weighted candidate sampling
//!
//! ## Utilities
//! - Hashing functions for cache keys and history fingerprints

pub mod cache;
pub mod config;
pub mod constants;
pub mod draw;
pub mod hashing;
pub mod model;
pub mod scoring;

pub use cache::LikelihoodCache;
pub use config::{Config, ConfigError};
pub use draw::{CandidateSet, Draw, DrawError, DrawResult, History, load_candidates};
pub use hashing::{hash_draws, hash_likelihood_key, hash_numbers};
pub use model::{CvaeArchitecture, LikelihoodModel, ModelConfig, ModelError};
pub use scoring::{
    BatchStats, CandidateGenerator, CandidateScorer, ContextConfig, IChingScorer, ScoredBatch,
    ScoredCandidate, ScoringContext, ScoringError, ScoringReport, ScoringResult, ScoringWeights,
    TemporalScorer,
};
