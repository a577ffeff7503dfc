use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure category, independent of the message carried by the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Usage,
    NotFound,
    Inference,
    Configuration,
}

/// Error type returned by the classification pipeline and its builder.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The process was invoked with the wrong arguments. No model is loaded.
    #[error("{0}")]
    Usage(String),

    /// The image path does not resolve to a readable file. No model is loaded.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Preprocessing or model execution failed for this one image.
    #[error("{0}")]
    Inference(String),

    /// The deployment is broken: bad config values, unloadable artifacts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The label vocabulary and the model output disagree on the class count.
    #[error(
        "class count mismatch: {source_name} has {vocabulary} labels but the model outputs {model} values"
    )]
    ClassCountMismatch {
        source_name: String,
        vocabulary: usize,
        model: usize,
    },
}

impl ClassifyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClassifyError::Usage(_) => FailureKind::Usage,
            ClassifyError::NotFound(_) => FailureKind::NotFound,
            ClassifyError::Inference(_) => FailureKind::Inference,
            ClassifyError::Configuration(_) | ClassifyError::ClassCountMismatch { .. } => {
                FailureKind::Configuration
            }
        }
    }

    /// Wrap a model or tensor failure. The full `anyhow` context chain is kept
    /// in the message.
    pub fn inference(err: anyhow::Error) -> Self {
        ClassifyError::Inference(format!("{err:#}"))
    }

    pub fn configuration(err: anyhow::Error) -> Self {
        ClassifyError::Configuration(format!("{err:#}"))
    }
}
