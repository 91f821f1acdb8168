use thiserror::Error;

use crate::draw::DrawError;
use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("likelihood model error: {0}")]
    Model(#[from] ModelError),

    #[error("draw error: {0}")]
    Draw(#[from] DrawError),

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("scoring computation failed: {reason}")]
    ComputationFailed { reason: String },
}

pub type ScoringResult<T> = Result<T, ScoringError>;
