use crate::core::ClassifyError;

/// A validated probability vector in [0, 1].
///
/// Percent-scaled output (maximum in `(1, 100]`) is rescaled on construction.
/// An empty or all-NaN vector is accepted but has no maximum; any other
/// non-finite or out-of-range value is an inference failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Probabilities {
    values: Vec<f32>,
}

impl Probabilities {
    pub fn new(mut values: Vec<f32>) -> Result<Self, ClassifyError> {
        if values.iter().all(|v| v.is_nan()) {
            return Ok(Self { values });
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ClassifyError::Inference(format!(
                "model output contains a non-finite value at index {index}"
            )));
        }
        if let Some(index) = values.iter().position(|v| *v < 0.0) {
            return Err(ClassifyError::Inference(format!(
                "model output contains a negative probability at index {index}"
            )));
        }

        let max = values.iter().copied().fold(0.0f32, f32::max);
        if max > 100.0 {
            return Err(ClassifyError::Inference(format!(
                "model output {max} is neither a probability nor a percentage"
            )));
        }
        if max > 1.0 {
            tracing::debug!(max, "rescaling percent-scaled model output");
            for value in values.iter_mut() {
                *value /= 100.0;
            }
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest value, or `None` when no valid maximum exists.
    pub fn max(&self) -> Option<f32> {
        self.argmax().map(|index| self.values[index])
    }

    /// Index of the largest value. Ties go to the lowest index.
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (index, value) in self.values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            match best {
                Some(current) if *value <= self.values[current] => {}
                _ => best = Some(index),
            }
        }
        best
    }
}
