//! Cross-cutting, shared constants.
//!
//! The pool size and draw size defaults describe a classic 6-of-49 game. Everything that
//! depends on the pool size (condition vectors, multi-hot encodings, model input width)
//! takes it at runtime; these values are only the defaults.

pub const DEFAULT_NUM_NUMBERS: u32 = 49;

pub const DEFAULT_DRAW_SIZE: usize = 6;

/// Additive smoothing applied to I-Ching frequency counts.
pub const DEFAULT_SMOOTHING: f32 = 1.0;

/// Number of most recent draws whose numbers count as "recent".
pub const DEFAULT_RECENT_WINDOW: usize = 3;

/// Number of most recent draws folded into the CVAE condition vector.
pub const DEFAULT_CONDITION_WINDOW: usize = 10;

/// Temporal decay half-life (draws, or days when every draw is dated).
pub const DEFAULT_HALF_LIFE: f32 = 10.0;

pub const DEFAULT_NUM_CANDIDATES: usize = 200;

pub const DEFAULT_TOP_N: usize = 10;

/// Largest candidate batch sent through the model in a single forward pass.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 256;

pub const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Smoothing used by the stub likelihood so no number has probability 0 or 1.
pub const DEFAULT_PRIOR_SMOOTHING: f32 = 0.05;

/// Added to every raw temporal weight before normalisation, so numbers absent from the
/// history keep a non-zero ensemble weight.
pub const TEMPORAL_WEIGHT_FLOOR: f32 = 0.1;

pub const DEFAULT_LATENT_DIM: usize = 16;

pub const DEFAULT_HIDDEN_DIM: usize = 64;

/// Five-element modifier: `i % 5`, with multiples of five mapped to `5`.
#[inline]
pub fn element_modifier(number: u32) -> u32 {
    match number % 5 {
        0 => 5,
        m => m,
    }
}
