use candle_core::Device;

#[cfg(any(feature = "metal", feature = "cuda"))]
use tracing::{info, warn};

#[cfg(not(any(feature = "metal", feature = "cuda")))]
use tracing::debug;

use super::error::ModelError;

/// Selects the compute device based on enabled features (falls back to CPU).
pub fn select_device() -> Result<Device, ModelError> {
    #[cfg(any(feature = "metal", feature = "cuda"))]
    {
        let mut failures: Vec<String> = Vec::new();

        #[cfg(feature = "metal")]
        match Device::new_metal(0) {
            Ok(device) => {
                info!("Using Metal GPU for likelihood scoring");
                return Ok(device);
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(error = %msg, "Metal device unavailable");
                failures.push(format!("metal failed: {msg}"));
            }
        }

        #[cfg(feature = "cuda")]
        match Device::new_cuda(0) {
            Ok(device) => {
                info!("Using CUDA GPU for likelihood scoring");
                return Ok(device);
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(error = %msg, "CUDA device unavailable");
                failures.push(format!("cuda failed: {msg}"));
            }
        }

        let reason = if failures.is_empty() {
            "no GPU device available".to_string()
        } else {
            failures.join("; ")
        };
        warn!(reason = %reason, "Falling back to CPU device");
    }

    #[cfg(not(any(feature = "metal", feature = "cuda")))]
    debug!("No GPU backend compiled, using CPU device");

    Ok(Device::Cpu)
}
