use super::category::decide_category;
use super::gate::GateDecision;
use super::model::ImageClassificationModel;
use super::probabilities::Probabilities;
use super::result::{ClassificationResult, ResultFormatter};
use crate::core::config::{Flavor, GatePolicy};
use crate::core::ClassifyError;
use crate::models::preprocess::load_image;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// Failure together with how far the image got through the pipeline.
struct StageFailure {
    error: ClassifyError,
    gate_passed: bool,
}

impl StageFailure {
    fn before_gate(error: ClassifyError) -> Self {
        Self {
            error,
            gate_passed: false,
        }
    }

    fn after_gate(error: ClassifyError) -> Self {
        Self {
            error,
            gate_passed: true,
        }
    }
}

/// Two-stage mushroom classification: Gate Decision, then Category Decision.
///
/// The pipeline holds only read-only handles and can be shared between
/// threads; every call works on its own image.
pub struct MushroomClassificationPipeline {
    pub(crate) flavor: Flavor,
    pub(crate) classifier: Arc<dyn ImageClassificationModel>,
    pub(crate) gate: Box<dyn GateDecision>,
}

impl MushroomClassificationPipeline {
    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn gate_policy(&self) -> GatePolicy {
        self.gate.policy()
    }

    pub fn formatter(&self) -> ResultFormatter {
        ResultFormatter::new(self.flavor)
    }

    /// Classify the image at `path`.
    ///
    /// A missing file is reported as [`ClassifyError::NotFound`] before any
    /// model runs. Decoding and inference failures come back as
    /// [`ClassifyError::Inference`]; no retries are attempted.
    pub fn classify(&self, path: &Path) -> Result<ClassificationResult, ClassifyError> {
        self.classify_path(path).map_err(|failure| failure.error)
    }

    /// Like [`classify`](Self::classify), but inference failures are folded
    /// into the [`ClassificationResult::Error`] variant. Not-found and
    /// configuration failures are still returned as errors.
    pub fn classify_or_report(&self, path: &Path) -> Result<ClassificationResult, ClassifyError> {
        match self.classify_path(path) {
            Ok(result) => Ok(result),
            Err(StageFailure { error, gate_passed }) => match error {
                ClassifyError::Inference(_) => {
                    tracing::warn!(error = %error, gate_passed, "classification failed");
                    Ok(ClassificationResult::from_error(&error, gate_passed))
                }
                other => Err(other),
            },
        }
    }

    /// Classify an already decoded image.
    pub fn classify_image(&self, image: &DynamicImage) -> Result<ClassificationResult, ClassifyError> {
        self.run(image).map_err(|failure| failure.error)
    }

    fn classify_path(&self, path: &Path) -> Result<ClassificationResult, StageFailure> {
        ensure_readable(path).map_err(StageFailure::before_gate)?;
        let image = load_image(path)
            .map_err(|e| StageFailure::before_gate(ClassifyError::inference(e)))?;
        self.run(&image)
    }

    fn run(&self, image: &DynamicImage) -> Result<ClassificationResult, StageFailure> {
        let outcome = self
            .gate
            .decide_gate(image, self.classifier.as_ref())
            .map_err(StageFailure::before_gate)?;

        tracing::debug!(
            policy = ?self.gate.policy(),
            is_mushroom = outcome.is_mushroom,
            confidence = outcome.confidence,
            "gate decided"
        );

        if !outcome.is_mushroom {
            return Ok(ClassificationResult::not_a_mushroom(
                self.flavor,
                outcome.confidence,
            ));
        }

        let probabilities = match outcome.probabilities {
            Some(probabilities) => probabilities,
            None => {
                let raw = self
                    .classifier
                    .predict(image)
                    .map_err(|e| StageFailure::after_gate(ClassifyError::inference(e)))?;
                Probabilities::new(raw).map_err(StageFailure::after_gate)?
            }
        };

        let result = decide_category(&probabilities, self.flavor).map_err(StageFailure::after_gate)?;
        tracing::info!(
            class = result.class(self.flavor),
            confidence = result.confidence(),
            "classified"
        );
        Ok(result)
    }
}

pub(crate) fn ensure_readable(path: &Path) -> Result<(), ClassifyError> {
    let readable = path.is_file() && std::fs::File::open(path).is_ok();
    if !readable {
        return Err(ClassifyError::NotFound(path.to_path_buf()));
    }
    Ok(())
}
