//! Generative likelihood model (CVAE) for candidate scoring.
//!
//! [`LikelihoodModel::log_likelihood_batch`] stacks every candidate into one `[B, N]`
//! tensor and runs a single forward pass per `max_batch_size` chunk. The per-candidate
//! [`LikelihoodModel::log_likelihood`] path runs one pass per call and exists for the
//! sequential scorer and for comparison.
//!
//! Without a model directory the model runs in stub mode: an independent-Bernoulli
//! baseline whose per-number probability is the smoothed condition vector. The stub goes
//! through the same tensor code, so batching behaves identically.

pub mod config;
pub mod cvae;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
pub mod error;

#[cfg(test)]
mod tests;

pub use config::{ARCHITECTURE_FILENAME, CvaeArchitecture, ModelConfig, WEIGHTS_FILENAME};
pub use cvae::Cvae;
pub use error::ModelError;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use tracing::{debug, info};

use crate::draw::CandidateSet;
use cvae::bernoulli_log_likelihood;
use device::select_device;

enum LikelihoodBackend {
    Cvae { model: Arc<Cvae> },
    Stub,
}

pub struct LikelihoodModel {
    backend: LikelihoodBackend,
    device: Device,
    config: ModelConfig,
    forward_passes: AtomicU64,
}

impl std::fmt::Debug for LikelihoodModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LikelihoodModel")
            .field(
                "backend",
                &match &self.backend {
                    LikelihoodBackend::Cvae { model } => {
                        format!("Cvae({:?})", model.architecture())
                    }
                    LikelihoodBackend::Stub => "Stub".to_string(),
                },
            )
            .field("device", &format!("{:?}", self.device))
            .field("config", &self.config)
            .finish()
    }
}

impl LikelihoodModel {
    pub fn load(config: ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;

        let device = select_device()?;
        debug!(?device, "Selected compute device for likelihood model");

        let Some(model_path) = config.model_path.clone() else {
            info!(
                num_numbers = config.num_numbers,
                "No CVAE model path configured, operating in stub mode"
            );
            return Ok(Self::create(LikelihoodBackend::Stub, device, config));
        };

        if !model_path.exists() {
            return Err(ModelError::ModelNotFound { path: model_path });
        }

        let arch_path = model_path.join(ARCHITECTURE_FILENAME);
        if !arch_path.exists() {
            return Err(ModelError::ModelLoadFailed {
                reason: format!("Missing {} in {}", ARCHITECTURE_FILENAME, model_path.display()),
            });
        }

        let weights_path = model_path.join(WEIGHTS_FILENAME);
        if !weights_path.exists() {
            return Err(ModelError::ModelLoadFailed {
                reason: format!("Missing {} in {}", WEIGHTS_FILENAME, model_path.display()),
            });
        }

        let arch_content = std::fs::read_to_string(&arch_path)?;
        let arch: CvaeArchitecture =
            serde_json::from_str(&arch_content).map_err(|e| ModelError::ModelLoadFailed {
                reason: format!("Failed to parse {}: {}", ARCHITECTURE_FILENAME, e),
            })?;

        info!(
            model_path = %model_path.display(),
            latent_dim = arch.latent_dim,
            hidden_dim = arch.hidden_dim,
            "Loading CVAE model"
        );

        // SAFETY: the weights file is treated as read-only for the lifetime of the mapping.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
        }
        .map_err(|e| ModelError::ModelLoadFailed {
            reason: format!("Failed to map weights: {}", e),
        })?;

        let model = Self::from_var_builder(vb, arch, config)?;
        info!("CVAE model loaded successfully");
        Ok(model)
    }

    /// Builds the CVAE from any `VarBuilder` (mmapped weights or a `VarMap`).
    pub fn from_var_builder(
        vb: VarBuilder,
        arch: CvaeArchitecture,
        config: ModelConfig,
    ) -> Result<Self, ModelError> {
        config.validate()?;
        arch.validate()?;

        if arch.num_numbers != config.num_numbers {
            return Err(ModelError::InvalidConfig {
                reason: format!(
                    "model expects a pool of {} numbers, configured pool is {}",
                    arch.num_numbers, config.num_numbers
                ),
            });
        }

        let device = vb.device().clone();
        let cvae = Cvae::load(vb, arch).map_err(|e| ModelError::ModelLoadFailed {
            reason: format!("Failed to build CVAE: {}", e),
        })?;

        Ok(Self::create(
            LikelihoodBackend::Cvae {
                model: Arc::new(cvae),
            },
            device,
            config,
        ))
    }

    pub fn stub(num_numbers: usize) -> Result<Self, ModelError> {
        Self::load(ModelConfig::stub(num_numbers))
    }

    fn create(backend: LikelihoodBackend, device: Device, config: ModelConfig) -> Self {
        Self {
            backend,
            device,
            config,
            forward_passes: AtomicU64::new(0),
        }
    }

    /// Log-likelihood of one candidate (one forward pass).
    pub fn log_likelihood(
        &self,
        candidate: &CandidateSet,
        condition: &[f32],
    ) -> Result<f32, ModelError> {
        let scores = self.forward_chunk(std::slice::from_ref(candidate), condition)?;
        scores
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InferenceFailed {
                reason: "forward pass returned no score".to_string(),
            })
    }

    /// Log-likelihoods for all candidates, in input order.
    ///
    /// One forward pass per `max_batch_size` chunk; an empty slice runs no pass.
    pub fn log_likelihood_batch(
        &self,
        candidates: &[CandidateSet],
        condition: &[f32],
    ) -> Result<Vec<f32>, ModelError> {
        if candidates.is_empty() {
            return Ok(vec![]);
        }

        self.check_condition(condition)?;

        debug!(
            num_candidates = candidates.len(),
            max_batch_size = self.config.max_batch_size,
            "Scoring candidate batch"
        );

        let mut scores = Vec::with_capacity(candidates.len());
        for chunk in candidates.chunks(self.config.max_batch_size) {
            scores.extend(self.forward_chunk(chunk, condition)?);
        }
        Ok(scores)
    }

    /// Per-number probabilities under `condition` (index `n - 1` for number `n`).
    pub fn marginals(&self, condition: &[f32]) -> Result<Vec<f32>, ModelError> {
        self.check_condition(condition)?;

        match &self.backend {
            LikelihoodBackend::Cvae { model } => {
                let c = self.condition_tensor(condition, 1)?;
                let probs = model.prior_marginals(&c)?;
                Ok(probs.flatten_all()?.to_vec1::<f32>()?)
            }
            LikelihoodBackend::Stub => Ok(self.stub_probabilities(condition)),
        }
    }

    fn forward_chunk(
        &self,
        chunk: &[CandidateSet],
        condition: &[f32],
    ) -> Result<Vec<f32>, ModelError> {
        self.check_condition(condition)?;

        let n = self.config.num_numbers;
        let batch = chunk.len();

        let mut data = Vec::with_capacity(batch * n);
        for candidate in chunk {
            if let Some(&number) = candidate.numbers().iter().find(|&&v| v as usize > n) {
                return Err(ModelError::DimensionMismatch {
                    expected: n,
                    actual: number as usize,
                });
            }
            data.extend(candidate.to_multi_hot(n as u32));
        }
        let x = Tensor::from_vec(data, (batch, n), &self.device)?;

        let scores = match &self.backend {
            LikelihoodBackend::Cvae { model } => {
                let c = self.condition_tensor(condition, batch)?;
                model.elbo(&x, &c)?
            }
            LikelihoodBackend::Stub => {
                let logits: Vec<f32> = self
                    .stub_probabilities(condition)
                    .into_iter()
                    .map(|p| (p / (1.0 - p)).ln())
                    .collect();
                let logits = Tensor::from_vec(logits, (1, n), &self.device)?
                    .broadcast_as((batch, n))?
                    .contiguous()?;
                bernoulli_log_likelihood(&x, &logits)?
            }
        };

        self.forward_passes.fetch_add(1, Ordering::Relaxed);
        Ok(scores.to_vec1::<f32>()?)
    }

    fn condition_tensor(&self, condition: &[f32], batch: usize) -> Result<Tensor, ModelError> {
        let n = self.config.num_numbers;
        Ok(Tensor::from_slice(condition, (1, n), &self.device)?
            .broadcast_as((batch, n))?
            .contiguous()?)
    }

    fn check_condition(&self, condition: &[f32]) -> Result<(), ModelError> {
        if condition.len() != self.config.num_numbers {
            return Err(ModelError::DimensionMismatch {
                expected: self.config.num_numbers,
                actual: condition.len(),
            });
        }
        Ok(())
    }

    /// `(c + s) / (1 + 2s)`, strictly inside `(0, 1)` for `s > 0`.
    fn stub_probabilities(&self, condition: &[f32]) -> Vec<f32> {
        let s = self.config.prior_smoothing.max(f32::EPSILON);
        condition
            .iter()
            .map(|&c| (c.clamp(0.0, 1.0) + s) / (1.0 + 2.0 * s))
            .collect()
    }

    pub fn is_model_loaded(&self) -> bool {
        matches!(self.backend, LikelihoodBackend::Cvae { .. })
    }

    pub fn num_numbers(&self) -> usize {
        self.config.num_numbers
    }

    pub fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Total forward passes run since construction.
    pub fn forward_passes(&self) -> u64 {
        self.forward_passes.load(Ordering::Relaxed)
    }
}
