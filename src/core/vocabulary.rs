//! Fixed, ordered label vocabularies of the task-specific classifiers.
//!
//! Position in the array is the model's output index. The order is a contract
//! with the trained artifact and must only change together with it.

use super::error::ClassifyError;

/// Labels of the sporocarp classifier (threshold-gated flavor).
pub const SPOROCARP_LABELS: [&str; 4] = [
    "edible_mushroom_sporocarp",
    "edible_sporocarp",
    "poisonous_mushroom_sporocarp",
    "poisonous_sporocarp",
];

/// Labels of the edibility classifier (keyword-gated flavor).
pub const EDIBILITY_LABELS: [&str; 4] = ["conditionally_edible", "deadly", "edible", "poisonous"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabulary {
    name: &'static str,
    labels: &'static [&'static str],
}

impl Vocabulary {
    pub const SPOROCARP: Vocabulary = Vocabulary {
        name: "sporocarp vocabulary",
        labels: &SPOROCARP_LABELS,
    };

    pub const EDIBILITY: Vocabulary = Vocabulary {
        name: "edibility vocabulary",
        labels: &EDIBILITY_LABELS,
    };

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.labels.get(index).copied()
    }

    /// Fails when the model's output width differs from the vocabulary size.
    pub fn ensure_width(&self, model_width: usize) -> Result<(), ClassifyError> {
        if model_width != self.len() {
            return Err(ClassifyError::ClassCountMismatch {
                source_name: self.name.to_string(),
                vocabulary: self.len(),
                model: model_width,
            });
        }
        Ok(())
    }
}
