use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrawError {
    #[error("number {number} is outside the pool 1..={max}")]
    NumberOutOfRange { number: u32, max: u32 },

    #[error("number {number} appears more than once")]
    DuplicateNumber { number: u32 },

    #[error("a draw or candidate must contain at least one number")]
    EmptySet,

    #[error("invalid pool size {num_numbers}: must be at least 1")]
    InvalidPoolSize { num_numbers: u32 },

    #[error("failed to load {path}: {reason}")]
    LoadFailed { path: PathBuf, reason: String },
}

pub type DrawResult<T> = Result<T, DrawError>;
