//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `AUGUR_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CONDITION_WINDOW, DEFAULT_DRAW_SIZE, DEFAULT_HALF_LIFE,
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_NUM_CANDIDATES, DEFAULT_NUM_NUMBERS, DEFAULT_RECENT_WINDOW,
    DEFAULT_SMOOTHING, DEFAULT_TOP_N,
};

/// Run configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `AUGUR_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Draw history JSON file. Required by the binary.
    pub history_path: Option<PathBuf>,

    /// Optional candidate list JSON file. When unset, candidates are generated.
    pub candidates_path: Option<PathBuf>,

    /// CVAE model directory (`config.json` + `model.safetensors`). Unset runs the stub.
    pub model_path: Option<PathBuf>,

    /// Size of the number pool (`1..=num_numbers`). Default: `49`.
    pub num_numbers: u32,

    /// Numbers per generated candidate. Default: `6`.
    pub draw_size: usize,

    /// Additive smoothing for I-Ching probabilities. Default: `1.0`.
    pub smoothing: f32,

    /// Draws whose numbers count as "recent". Default: `3`.
    pub recent_window: usize,

    /// Draws folded into the condition vector. Default: `10`.
    pub condition_window: usize,

    /// Temporal decay half-life. Default: `10.0`.
    pub half_life: f32,

    /// Candidates to generate when no candidate file is given. Default: `200`.
    pub num_candidates: usize,

    /// Candidates kept in the final ranking. Default: `10`.
    pub top_n: usize,

    /// Largest batch per model forward pass. Default: `256`.
    pub max_batch_size: usize,

    /// Likelihood cache entries; `0` disables the cache. Default: `10_000`.
    pub cache_capacity: u64,

    /// Generator seed; `0` derives one from the history fingerprint.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_path: None,
            candidates_path: None,
            model_path: None,
            num_numbers: DEFAULT_NUM_NUMBERS,
            draw_size: DEFAULT_DRAW_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            recent_window: DEFAULT_RECENT_WINDOW,
            condition_window: DEFAULT_CONDITION_WINDOW,
            half_life: DEFAULT_HALF_LIFE,
            num_candidates: DEFAULT_NUM_CANDIDATES,
            top_n: DEFAULT_TOP_N,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            seed: 0,
        }
    }
}

impl Config {
    const ENV_HISTORY_PATH: &'static str = "AUGUR_HISTORY_PATH";
    const ENV_CANDIDATES_PATH: &'static str = "AUGUR_CANDIDATES_PATH";
    const ENV_MODEL_PATH: &'static str = "AUGUR_MODEL_PATH";
    const ENV_NUM_NUMBERS: &'static str = "AUGUR_NUM_NUMBERS";
    const ENV_DRAW_SIZE: &'static str = "AUGUR_DRAW_SIZE";
    const ENV_SMOOTHING: &'static str = "AUGUR_SMOOTHING";
    const ENV_RECENT_WINDOW: &'static str = "AUGUR_RECENT_WINDOW";
    const ENV_CONDITION_WINDOW: &'static str = "AUGUR_CONDITION_WINDOW";
    const ENV_HALF_LIFE: &'static str = "AUGUR_HALF_LIFE";
    const ENV_NUM_CANDIDATES: &'static str = "AUGUR_NUM_CANDIDATES";
    const ENV_TOP_N: &'static str = "AUGUR_TOP_N";
    const ENV_MAX_BATCH_SIZE: &'static str = "AUGUR_MAX_BATCH_SIZE";
    const ENV_CACHE_CAPACITY: &'static str = "AUGUR_CACHE_CAPACITY";
    const ENV_SEED: &'static str = "AUGUR_SEED";

    /// Loads configuration from environment variables (falling back to defaults).
    ///
    /// Numeric settings that are present but malformed are an error, not a silent default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            history_path: Self::parse_optional_path_from_env(Self::ENV_HISTORY_PATH),
            candidates_path: Self::parse_optional_path_from_env(Self::ENV_CANDIDATES_PATH),
            model_path: Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH),
            num_numbers: Self::parse_from_env(Self::ENV_NUM_NUMBERS, defaults.num_numbers)?,
            draw_size: Self::parse_from_env(Self::ENV_DRAW_SIZE, defaults.draw_size)?,
            smoothing: Self::parse_from_env(Self::ENV_SMOOTHING, defaults.smoothing)?,
            recent_window: Self::parse_from_env(Self::ENV_RECENT_WINDOW, defaults.recent_window)?,
            condition_window: Self::parse_from_env(
                Self::ENV_CONDITION_WINDOW,
                defaults.condition_window,
            )?,
            half_life: Self::parse_from_env(Self::ENV_HALF_LIFE, defaults.half_life)?,
            num_candidates: Self::parse_from_env(
                Self::ENV_NUM_CANDIDATES,
                defaults.num_candidates,
            )?,
            top_n: Self::parse_from_env(Self::ENV_TOP_N, defaults.top_n)?,
            max_batch_size: Self::parse_from_env(
                Self::ENV_MAX_BATCH_SIZE,
                defaults.max_batch_size,
            )?,
            cache_capacity: Self::parse_from_env(
                Self::ENV_CACHE_CAPACITY,
                defaults.cache_capacity,
            )?,
            seed: Self::parse_from_env(Self::ENV_SEED, defaults.seed)?,
        })
    }

    /// Validates paths and value ranges (does not read any files).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_numbers < 2 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_NUM_NUMBERS,
                reason: format!("pool must hold at least 2 numbers, got {}", self.num_numbers),
            });
        }

        if self.draw_size == 0 || self.draw_size > self.num_numbers as usize {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_DRAW_SIZE,
                reason: format!(
                    "must be between 1 and {}, got {}",
                    self.num_numbers, self.draw_size
                ),
            });
        }

        if !self.smoothing.is_finite() || self.smoothing < 0.0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_SMOOTHING,
                reason: format!("must be finite and >= 0, got {}", self.smoothing),
            });
        }

        if !self.half_life.is_finite() || self.half_life <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_HALF_LIFE,
                reason: format!("must be finite and > 0, got {}", self.half_life),
            });
        }

        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_MAX_BATCH_SIZE,
                reason: "must be at least 1".to_string(),
            });
        }

        if self.top_n == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_TOP_N,
                reason: "must be at least 1".to_string(),
            });
        }

        for path in [&self.history_path, &self.candidates_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Returns the history path or [`ConfigError::MissingEnvVar`].
    pub fn require_history_path(&self) -> Result<&PathBuf, ConfigError> {
        self.history_path
            .as_ref()
            .ok_or(ConfigError::MissingEnvVar {
                name: Self::ENV_HISTORY_PATH,
            })
    }

    /// Returns `true` if the likelihood cache should be built.
    pub fn cache_enabled(&self) -> bool {
        self.cache_capacity > 0
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Ok(default);
                }
                trimmed.parse().map_err(|e: T::Err| ConfigError::ParseError {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => Ok(default),
        }
    }
}
