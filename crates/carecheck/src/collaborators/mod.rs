//! Adapters for the external capabilities the screening dialogue consumes:
//! a conversational response generator and pretrained label predictors.
//! Both are best-effort. Their failures are absorbed behind fallback values.

pub mod predictor;
pub mod responder;

/// Failure of an external collaborator. Never surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("collaborator timed out after {0} ms")]
    TimedOut(u128),
    #[error("collaborator returned an unusable payload: {0}")]
    InvalidResponse(String),
}

pub use predictor::{CentroidModel, FeatureVector, InvalidFeatures, LabelPredictor, ModelLoadError};
pub use responder::{
    OfflineGenerator, OllamaGenerator, Responder, ResponseGenerator, FALLBACK_REPLY,
};
