use image::DynamicImage;

/// One label of a general-purpose labeler with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Task-specific classifier over a fixed, ordered label vocabulary.
pub trait ImageClassificationModel: Send + Sync {
    /// Probabilities over the vocabulary, one value per output index.
    fn predict(&self, image: &DynamicImage) -> anyhow::Result<Vec<f32>>;

    /// Output width of the loaded model.
    fn num_classes(&self) -> usize;
}

/// Off-the-shelf labeler over a large generic label set.
pub trait ImageLabelingModel: Send + Sync {
    /// The `k` highest scoring labels, best first.
    fn top_k(&self, image: &DynamicImage, k: usize) -> anyhow::Result<Vec<LabelScore>>;
}
