//! Draw history and candidate sets.
//!
//! Numbers are 1-based (`1..=num_numbers`). Dense per-number vectors (frequencies,
//! condition vectors, multi-hot encodings) store number `n` at index `n - 1`.

pub mod candidate;
pub mod error;
pub mod history;


pub use candidate::{CandidateSet, load_candidates};
pub use error::{DrawError, DrawResult};
pub use history::{Draw, History};
