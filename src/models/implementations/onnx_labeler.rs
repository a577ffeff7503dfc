use super::onnx_classifier::OnnxImageClassifier;
use crate::core::config::LabelerSpec;
use crate::core::ClassifyError;
use crate::pipelines::mushroom_classification_pipeline::model::{
    ImageClassificationModel, ImageLabelingModel, LabelScore,
};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

/// General-purpose ImageNet labeler used as a mushroom pre-filter.
#[derive(Clone)]
pub struct OnnxImageLabeler {
    model: OnnxImageClassifier,
    labels: Arc<Vec<String>>,
}

impl OnnxImageLabeler {
    /// Load the model and check that its output width matches the label set.
    pub fn load(
        model_path: &Path,
        spec: &LabelerSpec,
        labels: Vec<String>,
    ) -> anyhow::Result<Self> {
        let model = OnnxImageClassifier::load(model_path, &spec.model)?;
        let width = model.num_classes();
        if width != labels.len() {
            return Err(ClassifyError::ClassCountMismatch {
                source_name: "labeler label set".to_string(),
                vocabulary: labels.len(),
                model: width,
            }
            .into());
        }

        Ok(Self {
            model,
            labels: Arc::new(labels),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl ImageLabelingModel for OnnxImageLabeler {
    fn top_k(&self, image: &DynamicImage, k: usize) -> anyhow::Result<Vec<LabelScore>> {
        let scores = self.model.predict(image)?;
        Ok(rank(&self.labels, &scores, k))
    }
}

/// Highest scores first; equal scores keep index order. NaN scores are dropped.
pub(crate) fn rank(labels: &[String], scores: &[f32], k: usize) -> Vec<LabelScore> {
    let mut indexed: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1));

    indexed
        .into_iter()
        .take(k)
        .filter_map(|(index, score)| {
            labels.get(index).map(|label| LabelScore {
                label: label.clone(),
                score,
            })
        })
        .collect()
}
