//! Test fixtures for integration tests.

use std::path::{Path, PathBuf};

use augur::draw::{CandidateSet, History};

pub const POOL: u32 = 20;

pub const DRAW_SIZE: usize = 5;

pub const FIRST_DRAW_DATE: &str = "2024-01-06";

#[derive(Default)]
pub struct HistoryBuilder {
    draws: Vec<Vec<u32>>,
    dates: Vec<String>,
    num_numbers: Option<u32>,
}

impl HistoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_numbers(mut self, n: u32) -> Self {
        self.num_numbers = Some(n);
        self
    }

    pub fn draw(mut self, numbers: &[u32]) -> Self {
        self.draws.push(numbers.to_vec());
        self
    }

    pub fn dated_draw(mut self, numbers: &[u32], date: &str) -> Self {
        self.draws.push(numbers.to_vec());
        self.dates.push(date.to_string());
        self
    }

    /// Appends `count` deterministic draws rotating through the pool.
    pub fn with_rotating_draws(mut self, count: usize) -> Self {
        let pool = self.num_numbers.unwrap_or(POOL);
        for i in 0..count {
            let mut numbers: Vec<u32> = (0..DRAW_SIZE as u32)
                .map(|j| ((i as u32 * 3 + j * 4) % pool) + 1)
                .collect();
            numbers.sort_unstable();
            numbers.dedup();
            self.draws.push(numbers);
        }
        self
    }

    pub fn build(self) -> History {
        History::from_numbers(self.num_numbers.unwrap_or(POOL), self.draws).unwrap()
    }

    /// Bare `[[..], ..]` JSON, or the record form when every draw is dated.
    pub fn to_json(&self) -> String {
        if !self.dates.is_empty() && self.dates.len() == self.draws.len() {
            let records: Vec<serde_json::Value> = self
                .draws
                .iter()
                .zip(&self.dates)
                .map(|(numbers, date)| serde_json::json!({ "numbers": numbers, "drawn_on": date }))
                .collect();
            serde_json::json!({ "draws": records }).to_string()
        } else {
            serde_json::to_string(&self.draws).unwrap()
        }
    }

    pub fn write_to(&self, dir: &Path) -> PathBuf {
        let path = dir.join("history.json");
        std::fs::write(&path, self.to_json()).unwrap();
        path
    }
}

pub fn write_candidates(dir: &Path, candidates: &[Vec<u32>]) -> PathBuf {
    let path = dir.join("candidates.json");
    std::fs::write(&path, serde_json::to_string(candidates).unwrap()).unwrap();
    path
}

pub fn candidate(numbers: &[u32]) -> CandidateSet {
    CandidateSet::new(numbers.to_vec(), POOL).unwrap()
}

pub fn sample_candidates() -> Vec<CandidateSet> {
    vec![
        candidate(&[1, 2, 3, 4, 5]),
        candidate(&[4, 8, 12, 16, 20]),
        candidate(&[3, 7, 11, 15, 19]),
        candidate(&[2, 9, 10, 17, 18]),
        candidate(&[5, 6, 13, 14, 20]),
        candidate(&[1, 7, 13, 19, 20]),
    ]
}
