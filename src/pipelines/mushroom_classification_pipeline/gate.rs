//! Gate Decision: is there a mushroom in the image at all?
//!
//! Two interchangeable strategies sit behind [`GateDecision`]:
//!
//! - [`ThresholdGate`] runs the task-specific classifier and compares its
//!   highest probability with the configured threshold. The probabilities are
//!   handed on so Category Decision does not run the model a second time.
//! - [`KeywordGate`] runs a general-purpose labeler and looks for fungus
//!   keywords among its top-k labels. The reported confidence is the labeler's
//!   top-1 score, which says how sure it is about its best guess, not how
//!   likely the image is to show a mushroom.

use super::model::{ImageClassificationModel, ImageLabelingModel, LabelScore};
use super::probabilities::Probabilities;
use crate::core::config::GatePolicy;
use crate::core::ClassifyError;
use image::DynamicImage;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub is_mushroom: bool,
    pub confidence: f32,
    /// Classifier output already computed while gating, if any.
    pub probabilities: Option<Probabilities>,
}

impl GateOutcome {
    fn negative(confidence: f32) -> Self {
        Self {
            is_mushroom: false,
            confidence,
            probabilities: None,
        }
    }
}

pub trait GateDecision: Send + Sync {
    fn policy(&self) -> GatePolicy;

    fn decide_gate(
        &self,
        image: &DynamicImage,
        classifier: &dyn ImageClassificationModel,
    ) -> Result<GateOutcome, ClassifyError>;
}

/// Gate on the classifier's own maximum probability.
pub fn threshold_gate(probabilities: Probabilities, threshold: f32) -> GateOutcome {
    match probabilities.max() {
        None => GateOutcome::negative(0.0),
        Some(max) if max < threshold => GateOutcome::negative(max),
        Some(max) => GateOutcome {
            is_mushroom: true,
            confidence: max,
            probabilities: Some(probabilities),
        },
    }
}

/// Gate on case-insensitive substring matches between the predicted labels
/// and the keyword set. Keywords are expected in lower case.
pub fn keyword_gate(predictions: &[LabelScore], keywords: &[String]) -> GateOutcome {
    let is_mushroom = predictions.iter().any(|prediction| {
        let label = prediction.label.to_lowercase();
        keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && label.contains(keyword.as_str()))
    });

    let confidence = predictions
        .first()
        .map(|top| top.score)
        .filter(|score| score.is_finite())
        .map(|score| score.clamp(0.0, 1.0))
        .unwrap_or(0.0);

    GateOutcome {
        is_mushroom,
        confidence,
        probabilities: None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ThresholdGate {
    threshold: f32,
}

impl ThresholdGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl GateDecision for ThresholdGate {
    fn policy(&self) -> GatePolicy {
        GatePolicy::Threshold
    }

    fn decide_gate(
        &self,
        image: &DynamicImage,
        classifier: &dyn ImageClassificationModel,
    ) -> Result<GateOutcome, ClassifyError> {
        let raw = classifier.predict(image).map_err(ClassifyError::inference)?;
        let probabilities = Probabilities::new(raw)?;
        Ok(threshold_gate(probabilities, self.threshold))
    }
}

pub struct KeywordGate {
    labeler: Arc<dyn ImageLabelingModel>,
    keywords: Vec<String>,
    top_k: usize,
}

impl KeywordGate {
    pub fn new(
        labeler: Arc<dyn ImageLabelingModel>,
        keywords: impl IntoIterator<Item = impl AsRef<str>>,
        top_k: usize,
    ) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            labeler,
            keywords,
            top_k,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl GateDecision for KeywordGate {
    fn policy(&self) -> GatePolicy {
        GatePolicy::Keyword
    }

    fn decide_gate(
        &self,
        image: &DynamicImage,
        _classifier: &dyn ImageClassificationModel,
    ) -> Result<GateOutcome, ClassifyError> {
        let predictions = self
            .labeler
            .top_k(image, self.top_k)
            .map_err(ClassifyError::inference)?;
        tracing::debug!(?predictions, "labeler top-k");

        // Guard against labelers that return more than asked for.
        let considered = &predictions[..predictions.len().min(self.top_k)];
        Ok(keyword_gate(considered, &self.keywords))
    }
}
