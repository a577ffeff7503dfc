//! Task-specific mushroom classifier backed by an ONNX artifact.
//!
//! The artifact is a Keras classifier exported to ONNX. Its single output is a
//! `[1, N]` vector with one value per vocabulary label.

use crate::core::config::{ModelSpec, OutputActivation};
use crate::core::ModelOptions;
use crate::models::preprocess::{image_to_tensor, InputSpec};
use crate::pipelines::mushroom_classification_pipeline::model::ImageClassificationModel;
use anyhow::Context;
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::*;

impl ModelOptions for ModelSpec {
    fn cache_key(&self) -> String {
        format!(
            "{}-{:?}-{}-{:?}-{:?}",
            self.artifact.describe(),
            self.input.layout,
            self.input.size,
            self.input.normalization,
            self.activation
        )
    }
}

#[derive(Clone)]
pub struct OnnxImageClassifier {
    plan: Arc<TypedRunnableModel<TypedModel>>,
    input: InputSpec,
    activation: OutputActivation,
    num_classes: usize,
}

impl OnnxImageClassifier {
    /// Load and optimize the model for a fixed `[1, ...]` input shape.
    pub fn load(path: &Path, spec: &ModelSpec) -> anyhow::Result<Self> {
        tracing::info!(path = %path.display(), "loading onnx model");

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to read onnx model {}", path.display()))?
            .with_input_fact(0, f32::fact(spec.input.shape()).into())?
            .into_optimized()
            .with_context(|| {
                format!(
                    "model {} does not accept input of shape {:?}",
                    path.display(),
                    spec.input.shape()
                )
            })?;

        let num_classes = model
            .output_fact(0)?
            .shape
            .as_concrete()
            .and_then(|shape| shape.last().copied())
            .ok_or_else(|| anyhow::anyhow!("model {} has no concrete output width", path.display()))?;

        let plan = model.into_runnable()?;

        tracing::debug!(num_classes, "onnx model ready");

        Ok(Self {
            plan: Arc::new(plan),
            input: spec.input,
            activation: spec.activation,
            num_classes,
        })
    }

    pub fn input_spec(&self) -> &InputSpec {
        &self.input
    }

    /// Raw values of the first output, before any activation.
    pub fn forward(&self, image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        let input = image_to_tensor(image, &self.input)?;
        let outputs = self.plan.run(tvec!(input.into_tvalue()))?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("model produced no output"))?
            .to_array_view::<f32>()?;

        let values: Vec<f32> = output.iter().copied().collect();
        if values.len() != self.num_classes {
            anyhow::bail!(
                "model produced {} values, expected {}",
                values.len(),
                self.num_classes
            );
        }
        Ok(values)
    }
}

impl ImageClassificationModel for OnnxImageClassifier {
    fn predict(&self, image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        let raw = self.forward(image)?;
        Ok(activate(raw, self.activation))
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }
}

fn activate(values: Vec<f32>, activation: OutputActivation) -> Vec<f32> {
    match activation {
        OutputActivation::Identity => values,
        OutputActivation::Softmax => softmax(&values),
    }
}

/// Numerically stable softmax. Non-finite inputs propagate as NaN so the
/// decision stage can reject them.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ArtifactSource;

    #[test]
    fn softmax_sums_to_one_and_keeps_order() {
        let probs = softmax(&[1.0, 3.0, 2.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[1] > probs[2] && probs[2] > probs[0]);
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert_eq!(probs, vec![0.5, 0.5]);
    }

    #[test]
    fn identity_leaves_values_untouched() {
        let values = vec![0.1, 0.75, 0.1, 0.05];
        assert_eq!(activate(values.clone(), OutputActivation::Identity), values);
    }

    #[test]
    fn cache_key_distinguishes_conventions() {
        let spec = ModelSpec {
            artifact: ArtifactSource::local("a.onnx"),
            input: InputSpec::default(),
            activation: OutputActivation::Identity,
        };
        let softmaxed = ModelSpec {
            activation: OutputActivation::Softmax,
            ..spec.clone()
        };
        assert_ne!(spec.cache_key(), softmaxed.cache_key());
    }

    #[test]
    fn missing_artifact_fails_to_load() {
        let spec = ModelSpec {
            artifact: ArtifactSource::local("missing.onnx"),
            input: InputSpec::default(),
            activation: OutputActivation::Identity,
        };
        assert!(OnnxImageClassifier::load(Path::new("/no/such/model.onnx"), &spec).is_err());
    }
}
