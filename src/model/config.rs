use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::ModelError;
use crate::constants::{
    DEFAULT_HIDDEN_DIM, DEFAULT_LATENT_DIM, DEFAULT_MAX_BATCH_SIZE, DEFAULT_NUM_NUMBERS,
    DEFAULT_PRIOR_SMOOTHING,
};

/// Weights file expected inside a model directory.
pub const WEIGHTS_FILENAME: &str = "model.safetensors";

/// Architecture file expected inside a model directory.
pub const ARCHITECTURE_FILENAME: &str = "config.json";

/// Layer sizes of the CVAE, as stored in the model directory's `config.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvaeArchitecture {
    pub num_numbers: usize,
    pub latent_dim: usize,
    pub hidden_dim: usize,
}

impl CvaeArchitecture {
    pub fn new(num_numbers: usize) -> Self {
        Self {
            num_numbers,
            latent_dim: DEFAULT_LATENT_DIM,
            hidden_dim: DEFAULT_HIDDEN_DIM,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.num_numbers == 0 || self.latent_dim == 0 || self.hidden_dim == 0 {
            return Err(ModelError::InvalidConfig {
                reason: format!("all layer sizes must be non-zero, got {:?}", self),
            });
        }
        Ok(())
    }
}

impl Default for CvaeArchitecture {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_NUMBERS as usize)
    }
}

#[derive(Debug, Clone)]
/// Configuration for [`LikelihoodModel`](super::LikelihoodModel).
pub struct ModelConfig {
    /// Model directory. `None` runs the independent-Bernoulli stub.
    pub model_path: Option<PathBuf>,
    /// Pool size; must match the model's input width.
    pub num_numbers: usize,
    /// Largest number of candidates per forward pass.
    pub max_batch_size: usize,
    /// Smoothing for the stub's per-number probabilities.
    pub prior_smoothing: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            num_numbers: DEFAULT_NUM_NUMBERS as usize,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            prior_smoothing: DEFAULT_PRIOR_SMOOTHING,
        }
    }
}

impl ModelConfig {
    pub const ENV_MODEL_PATH: &'static str = "AUGUR_MODEL_PATH";
    pub const ENV_MAX_BATCH_SIZE: &'static str = "AUGUR_MAX_BATCH_SIZE";

    pub fn new<P: Into<PathBuf>>(model_path: P, num_numbers: usize) -> Self {
        Self {
            model_path: Some(model_path.into()),
            num_numbers,
            ..Default::default()
        }
    }

    pub fn stub(num_numbers: usize) -> Self {
        Self {
            model_path: None,
            num_numbers,
            ..Default::default()
        }
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        assert!(max_batch_size > 0, "max_batch_size must be at least 1");
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn with_prior_smoothing(mut self, prior_smoothing: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&prior_smoothing),
            "prior_smoothing must be between 0.0 and 1.0"
        );
        self.prior_smoothing = prior_smoothing;
        self
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.num_numbers == 0 {
            return Err(ModelError::InvalidConfig {
                reason: "num_numbers must be at least 1".to_string(),
            });
        }

        if self.max_batch_size == 0 {
            return Err(ModelError::InvalidConfig {
                reason: "max_batch_size must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.prior_smoothing) {
            return Err(ModelError::InvalidConfig {
                reason: format!(
                    "prior_smoothing must be between 0.0 and 1.0, got {}",
                    self.prior_smoothing
                ),
            });
        }

        if let Some(ref path) = self.model_path
            && path.as_os_str().is_empty()
        {
            return Err(ModelError::InvalidConfig {
                reason: "model_path cannot be empty when provided".to_string(),
            });
        }

        Ok(())
    }

    /// Reads `AUGUR_MODEL_PATH` and `AUGUR_MAX_BATCH_SIZE` (malformed values fall back to defaults).
    pub fn from_env(num_numbers: usize) -> Self {
        let model_path = std::env::var(Self::ENV_MODEL_PATH)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let max_batch_size = std::env::var(Self::ENV_MAX_BATCH_SIZE)
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&v: &usize| v > 0)
            .unwrap_or(DEFAULT_MAX_BATCH_SIZE);

        Self {
            model_path,
            num_numbers,
            max_batch_size,
            ..Default::default()
        }
    }

    pub fn weights_path(&self) -> Option<PathBuf> {
        self.model_path.as_ref().map(|p| p.join(WEIGHTS_FILENAME))
    }

    pub fn architecture_path(&self) -> Option<PathBuf> {
        self.model_path
            .as_ref()
            .map(|p| p.join(ARCHITECTURE_FILENAME))
    }
}
