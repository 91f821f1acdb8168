use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::{DrawError, DrawResult};
use crate::hashing::hash_numbers;

/// Sorted set of distinct numbers from `1..=num_numbers`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CandidateSet {
    numbers: Vec<u32>,
}

impl CandidateSet {
    /// Validates and sorts `numbers`.
    pub fn new(numbers: impl Into<Vec<u32>>, num_numbers: u32) -> DrawResult<Self> {
        let numbers = validate_numbers(numbers.into(), num_numbers)?;
        Ok(Self { numbers })
    }

    #[inline]
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Smallest member.
    #[inline]
    pub fn lowest(&self) -> u32 {
        self.numbers.first().copied().unwrap_or(0)
    }

    /// Largest member.
    #[inline]
    pub fn highest(&self) -> u32 {
        self.numbers.last().copied().unwrap_or(0)
    }

    pub fn sum(&self) -> u64 {
        self.numbers.iter().map(|&n| u64::from(n)).sum()
    }

    /// `highest - lowest`; `0` for single-number sets.
    pub fn spread(&self) -> u32 {
        self.highest() - self.lowest()
    }

    /// Length-`num_numbers` 0/1 vector, index `n - 1` set for each member `n`.
    ///
    /// Members above `num_numbers` are ignored; [`CandidateSet::new`] already rejects them.
    pub fn to_multi_hot(&self, num_numbers: u32) -> Vec<f32> {
        let mut encoded = vec![0.0f32; num_numbers as usize];
        for &n in &self.numbers {
            if let Some(slot) = encoded.get_mut(n as usize - 1) {
                *slot = 1.0;
            }
        }
        encoded
    }

    /// 32-byte BLAKE3 key of the sorted numbers.
    pub fn hash(&self) -> [u8; 32] {
        hash_numbers(&self.numbers)
    }
}

impl fmt::Display for CandidateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.numbers.iter().map(u32::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

pub(crate) fn validate_numbers(mut numbers: Vec<u32>, num_numbers: u32) -> DrawResult<Vec<u32>> {
    if num_numbers == 0 {
        return Err(DrawError::InvalidPoolSize { num_numbers });
    }
    if numbers.is_empty() {
        return Err(DrawError::EmptySet);
    }

    numbers.sort_unstable();

    for window in numbers.windows(2) {
        if window[0] == window[1] {
            return Err(DrawError::DuplicateNumber { number: window[0] });
        }
    }

    if let Some(&number) = numbers.iter().find(|&&n| n == 0 || n > num_numbers) {
        return Err(DrawError::NumberOutOfRange {
            number,
            max: num_numbers,
        });
    }

    Ok(numbers)
}

/// Loads a JSON array of number arrays as validated candidate sets.
///
/// Repeated sets keep their first occurrence only.
pub fn load_candidates(path: &Path, num_numbers: u32) -> DrawResult<Vec<CandidateSet>> {
    let content = std::fs::read_to_string(path).map_err(|e| DrawError::LoadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let raw: Vec<Vec<u32>> =
        serde_json::from_str(&content).map_err(|e| DrawError::LoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let total = raw.len();
    let mut seen = HashSet::with_capacity(total);
    let mut candidates = Vec::with_capacity(total);
    for numbers in raw {
        let set = CandidateSet::new(numbers, num_numbers)?;
        if seen.insert(set.hash()) {
            candidates.push(set);
        }
    }

    let dropped = total - candidates.len();
    if dropped > 0 {
        warn!(path = %path.display(), dropped, "Dropped duplicate candidate sets");
    }
    debug!(path = %path.display(), candidates = candidates.len(), "Loaded candidates");

    Ok(candidates)
}
