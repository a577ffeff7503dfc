#![allow(dead_code)]

use image::DynamicImage;
use sporocarp::pipelines::mushroom_classification_pipeline::{
    ImageClassificationModel, ImageLabelingModel, LabelScore,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Classifier that always returns the same output and counts its calls.
pub struct FixedClassifier {
    probabilities: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn new(probabilities: &[f32]) -> Self {
        Self {
            probabilities: probabilities.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageClassificationModel for FixedClassifier {
    fn predict(&self, _image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probabilities.clone())
    }

    fn num_classes(&self) -> usize {
        self.probabilities.len()
    }
}

/// Classifier whose inference always fails.
pub struct FailingClassifier;

impl ImageClassificationModel for FailingClassifier {
    fn predict(&self, _image: &DynamicImage) -> anyhow::Result<Vec<f32>> {
        anyhow::bail!("incompatible tensor shape")
    }

    fn num_classes(&self) -> usize {
        4
    }
}

pub struct FixedLabeler(pub Vec<LabelScore>);

impl FixedLabeler {
    pub fn new(entries: &[(&str, f32)]) -> Self {
        Self(
            entries
                .iter()
                .map(|(label, score)| LabelScore::new(*label, *score))
                .collect(),
        )
    }
}

impl ImageLabelingModel for FixedLabeler {
    fn top_k(&self, _image: &DynamicImage, k: usize) -> anyhow::Result<Vec<LabelScore>> {
        Ok(self.0.iter().take(k).cloned().collect())
    }
}

pub fn woodland_labels() -> FixedLabeler {
    FixedLabeler::new(&[
        ("bolete", 0.41),
        ("agaric", 0.22),
        ("rock", 0.1),
        ("tree", 0.05),
        ("sky", 0.01),
    ])
}

pub fn pet_labels() -> FixedLabeler {
    FixedLabeler::new(&[
        ("dog", 0.92),
        ("cat", 0.03),
        ("car", 0.02),
        ("tree", 0.02),
        ("sky", 0.01),
    ])
}

/// Write a small solid-colour PNG and return its path.
pub fn write_png(dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    image::RgbImage::from_pixel(16, 12, image::Rgb([150, 110, 60])).save(&path)?;
    Ok(path)
}

/// Write a file with an image extension but undecodable contents.
pub fn write_corrupt(dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, b"definitely not a jpeg")?;
    Ok(path)
}
