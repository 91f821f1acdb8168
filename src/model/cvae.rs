use candle_core::{DType, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder, linear};

use super::config::CvaeArchitecture;

/// Conditional VAE over multi-hot candidate encodings.
///
/// Encoder: `[x ‖ c] → hidden (ReLU) → (μ, log σ²)`.
/// Decoder: `[z ‖ c] → hidden (ReLU) → logits`.
pub struct Cvae {
    encoder_fc: Linear,
    encoder_mu: Linear,
    encoder_logvar: Linear,
    decoder_fc: Linear,
    decoder_out: Linear,
    arch: CvaeArchitecture,
}

impl Cvae {
    pub fn load(vb: VarBuilder, arch: CvaeArchitecture) -> Result<Self> {
        let n = arch.num_numbers;
        let encoder_fc = linear(2 * n, arch.hidden_dim, vb.pp("encoder.fc"))?;
        let encoder_mu = linear(arch.hidden_dim, arch.latent_dim, vb.pp("encoder.mu"))?;
        let encoder_logvar = linear(arch.hidden_dim, arch.latent_dim, vb.pp("encoder.logvar"))?;
        let decoder_fc = linear(arch.latent_dim + n, arch.hidden_dim, vb.pp("decoder.fc"))?;
        let decoder_out = linear(arch.hidden_dim, n, vb.pp("decoder.out"))?;

        Ok(Self {
            encoder_fc,
            encoder_mu,
            encoder_logvar,
            decoder_fc,
            decoder_out,
            arch,
        })
    }

    pub fn architecture(&self) -> &CvaeArchitecture {
        &self.arch
    }

    /// `x`, `c`: `[B, N]`. Returns `(μ, log σ²)`, each `[B, latent]`.
    pub fn encode(&self, x: &Tensor, c: &Tensor) -> Result<(Tensor, Tensor)> {
        let input = Tensor::cat(&[x, c], 1)?;
        let hidden = self.encoder_fc.forward(&input)?.relu()?;
        let mu = self.encoder_mu.forward(&hidden)?;
        let logvar = self.encoder_logvar.forward(&hidden)?;
        Ok((mu, logvar))
    }

    /// `z`: `[B, latent]`, `c`: `[B, N]`. Returns logits `[B, N]`.
    pub fn decode(&self, z: &Tensor, c: &Tensor) -> Result<Tensor> {
        let input = Tensor::cat(&[z, c], 1)?;
        let hidden = self.decoder_fc.forward(&input)?.relu()?;
        self.decoder_out.forward(&hidden)
    }

    /// Deterministic ELBO per row (`z = μ`): `log p(x|z,c) − KL(q(z|x,c) ‖ N(0, I))`.
    ///
    /// Returns `[B]`.
    pub fn elbo(&self, x: &Tensor, c: &Tensor) -> Result<Tensor> {
        let (mu, logvar) = self.encode(x, c)?;
        let logits = self.decode(&mu, c)?;
        let reconstruction = bernoulli_log_likelihood(x, &logits)?;
        let kl = gaussian_kl(&mu, &logvar)?;
        reconstruction.sub(&kl)
    }

    /// Per-number probabilities decoded at the prior mean (`z = 0`). Returns `[B, N]`.
    pub fn prior_marginals(&self, c: &Tensor) -> Result<Tensor> {
        let batch = c.dim(0)?;
        let z = Tensor::zeros((batch, self.arch.latent_dim), DType::F32, c.device())?;
        let logits = self.decode(&z, c)?;
        candle_nn::ops::sigmoid(&logits)
    }
}

/// `Σ_j x_j·ℓ_j − softplus(ℓ_j)` per row, with `softplus(ℓ) = max(ℓ, 0) + ln(1 + e^{−|ℓ|})`.
pub(crate) fn bernoulli_log_likelihood(x: &Tensor, logits: &Tensor) -> Result<Tensor> {
    let softplus = logits
        .relu()?
        .add(&logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?)?;
    x.mul(logits)?.sub(&softplus)?.sum(1)
}

/// `−½ Σ (1 + log σ² − μ² − σ²)` per row.
pub(crate) fn gaussian_kl(mu: &Tensor, logvar: &Tensor) -> Result<Tensor> {
    logvar
        .affine(1.0, 1.0)?
        .sub(&mu.sqr()?)?
        .sub(&logvar.exp()?)?
        .sum(1)?
        .affine(-0.5, 0.0)
}
