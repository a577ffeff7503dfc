use super::probabilities::Probabilities;
use super::result::ClassificationResult;
use crate::core::config::Flavor;
use crate::core::{advisory_for, ClassifyError};

/// Category Decision: arg-max over the vocabulary, lowest index on ties.
///
/// The edibility flavor attaches the advisory text for the chosen label; the
/// sporocarp flavor reports class and confidence only.
pub fn decide_category(
    probabilities: &Probabilities,
    flavor: Flavor,
) -> Result<ClassificationResult, ClassifyError> {
    let vocabulary = flavor.vocabulary();
    vocabulary.ensure_width(probabilities.len())?;

    let index = probabilities.argmax().ok_or_else(|| {
        ClassifyError::Inference("classifier produced no valid probabilities".into())
    })?;
    let label = vocabulary
        .label(index)
        .ok_or_else(|| ClassifyError::ClassCountMismatch {
            source_name: vocabulary.name().to_string(),
            vocabulary: vocabulary.len(),
            model: index + 1,
        })?;
    let confidence = probabilities.values()[index];

    let details = match flavor {
        Flavor::Sporocarp => None,
        Flavor::Edibility => Some(advisory_for(label).to_string()),
    };

    Ok(ClassificationResult::Classified {
        class: label.to_string(),
        confidence,
        details,
    })
}
