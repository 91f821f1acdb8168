use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::candidate::validate_numbers;
use super::error::{DrawError, DrawResult};
use crate::hashing::hash_draws;

/// One historical draw. Numbers are sorted and distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Draw {
    numbers: Vec<u32>,
    drawn_on: Option<NaiveDate>,
}

impl Draw {
    pub fn new(numbers: impl Into<Vec<u32>>, num_numbers: u32) -> DrawResult<Self> {
        Ok(Self {
            numbers: validate_numbers(numbers.into(), num_numbers)?,
            drawn_on: None,
        })
    }

    pub fn dated(
        numbers: impl Into<Vec<u32>>,
        drawn_on: NaiveDate,
        num_numbers: u32,
    ) -> DrawResult<Self> {
        let mut draw = Self::new(numbers, num_numbers)?;
        draw.drawn_on = Some(drawn_on);
        Ok(draw)
    }

    #[inline]
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    #[inline]
    pub fn drawn_on(&self) -> Option<NaiveDate> {
        self.drawn_on
    }
}

#[derive(Debug, Deserialize)]
struct DrawRecord {
    numbers: Vec<u32>,
    #[serde(default)]
    drawn_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryFile {
    Bare(Vec<Vec<u32>>),
    Records { draws: Vec<DrawRecord> },
}

/// Draw history, ordered oldest to newest.
#[derive(Debug, Clone)]
pub struct History {
    num_numbers: u32,
    draws: Vec<Draw>,
}

impl History {
    pub fn new(num_numbers: u32, draws: Vec<Draw>) -> DrawResult<Self> {
        if num_numbers == 0 {
            return Err(DrawError::InvalidPoolSize { num_numbers });
        }
        if let Some(&number) = draws
            .iter()
            .flat_map(|d| d.numbers.iter())
            .find(|&&n| n > num_numbers)
        {
            return Err(DrawError::NumberOutOfRange {
                number,
                max: num_numbers,
            });
        }
        Ok(Self { num_numbers, draws })
    }

    /// Builds a history from bare number lists (oldest first).
    pub fn from_numbers<I, D>(num_numbers: u32, draws: I) -> DrawResult<Self>
    where
        I: IntoIterator<Item = D>,
        D: Into<Vec<u32>>,
    {
        let draws = draws
            .into_iter()
            .map(|numbers| Draw::new(numbers, num_numbers))
            .collect::<DrawResult<Vec<_>>>()?;
        Self::new(num_numbers, draws)
    }

    /// Loads a JSON history file.
    ///
    /// Accepts either `[[1, 2, 3], ...]` or
    /// `{"draws": [{"numbers": [1, 2, 3], "drawn_on": "2024-01-06"}, ...]}`.
    pub fn load(path: &Path, num_numbers: u32) -> DrawResult<Self> {
        let load_failed = |reason: String| DrawError::LoadFailed {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let file: HistoryFile =
            serde_json::from_str(&content).map_err(|e| load_failed(e.to_string()))?;

        let draws = match file {
            HistoryFile::Bare(draws) => draws
                .into_iter()
                .map(|numbers| Draw::new(numbers, num_numbers))
                .collect::<DrawResult<Vec<_>>>()?,
            HistoryFile::Records { draws } => draws
                .into_iter()
                .map(|record| {
                    let mut draw = Draw::new(record.numbers, num_numbers)?;
                    draw.drawn_on = record.drawn_on;
                    Ok(draw)
                })
                .collect::<DrawResult<Vec<_>>>()?,
        };

        info!(
            path = %path.display(),
            draws = draws.len(),
            num_numbers,
            "Loaded draw history"
        );

        Self::new(num_numbers, draws)
    }

    #[inline]
    pub fn num_numbers(&self) -> u32 {
        self.num_numbers
    }

    #[inline]
    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// The last `n` draws, newest last.
    pub fn recent(&self, n: usize) -> &[Draw] {
        let start = self.draws.len().saturating_sub(n);
        &self.draws[start..]
    }

    /// Occurrence counts, index `n - 1` for number `n`.
    pub fn frequencies(&self) -> Vec<u32> {
        count_occurrences(&self.draws, self.num_numbers)
    }

    /// Per-number occurrence rate over the last `window` draws, in `[0, 1]`.
    ///
    /// All zeros when the window is empty.
    pub fn condition_vector(&self, window: usize) -> Vec<f32> {
        let recent = self.recent(window);
        let counts = count_occurrences(recent, self.num_numbers);
        if recent.is_empty() {
            return vec![0.0; self.num_numbers as usize];
        }

        let denom = recent.len() as f32;
        let condition: Vec<f32> = counts.into_iter().map(|c| c as f32 / denom).collect();

        debug!(window, draws_used = recent.len(), "Built condition vector");
        condition
    }

    /// Returns `true` if every draw carries a date (and there is at least one draw).
    pub fn fully_dated(&self) -> bool {
        !self.draws.is_empty() && self.draws.iter().all(|d| d.drawn_on.is_some())
    }

    /// 64-bit fingerprint over the draw numbers.
    pub fn fingerprint(&self) -> u64 {
        hash_draws(self.draws.iter().map(|d| d.numbers.as_slice()))
    }
}

fn count_occurrences(draws: &[Draw], num_numbers: u32) -> Vec<u32> {
    let mut counts = vec![0u32; num_numbers as usize];
    for draw in draws {
        for &n in &draw.numbers {
            counts[n as usize - 1] += 1;
        }
    }
    counts
}
