//! Likelihood cache (in-memory).
//!
//! Keys are a BLAKE3 hash of the condition vector and the candidate's sorted numbers, so a
//! cached value is only reused while the history-derived condition is unchanged.


use moka::sync::Cache;

use crate::draw::CandidateSet;
use crate::hashing::hash_likelihood_key;

/// Candidate log-likelihoods keyed by `(condition, candidate)`.
pub struct LikelihoodCache {
    entries: Cache<[u8; 32], f32>,
}

impl std::fmt::Debug for LikelihoodCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikelihoodCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl LikelihoodCache {
    const DEFAULT_CAPACITY: u64 = crate::constants::DEFAULT_CACHE_CAPACITY;

    /// Creates a cache with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a cache with a max entry capacity.
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    #[inline]
    pub fn key(condition: &[f32], candidate: &CandidateSet) -> [u8; 32] {
        hash_likelihood_key(condition, candidate.numbers())
    }

    #[inline]
    pub fn get(&self, condition: &[f32], candidate: &CandidateSet) -> Option<f32> {
        self.get_by_key(&Self::key(condition, candidate))
    }

    #[inline]
    pub fn get_by_key(&self, key: &[u8; 32]) -> Option<f32> {
        self.entries.get(key)
    }

    /// Inserts a log-likelihood and returns the computed key.
    #[inline]
    pub fn insert(&self, condition: &[f32], candidate: &CandidateSet, value: f32) -> [u8; 32] {
        let key = Self::key(condition, candidate);
        self.entries.insert(key, value);
        key
    }

    #[inline]
    pub fn insert_by_key(&self, key: [u8; 32], value: f32) {
        self.entries.insert(key, value);
    }

    /// Returns the number of cached entries.
    ///
    /// Moka updates its count lazily; call [`Self::run_pending_tasks`] first for an exact value.
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for LikelihoodCache {
    fn default() -> Self {
        Self::new()
    }
}
