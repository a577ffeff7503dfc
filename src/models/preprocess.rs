//! Image decoding and tensor preparation.
//!
//! The normalization must match what the loaded artifact was trained with.
//! A mismatch does not fail at runtime, it silently degrades predictions.

use anyhow::Context;
use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tract_onnx::prelude::*;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorLayout {
    /// `[1, H, W, 3]`, the Keras convention.
    #[default]
    Nhwc,
    /// `[1, 3, H, W]`, the PyTorch / ONNX model zoo convention.
    Nchw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputNormalization {
    /// `pixel / 255`, values in [0, 1].
    #[default]
    #[serde(rename = "unit_scale")]
    UnitScale,
    /// `pixel / 127.5 - 1`, values in [-1, 1].
    #[serde(rename = "mobilenet_v2")]
    MobileNetV2,
    /// `(pixel / 255 - mean) / std` with the ImageNet channel statistics.
    #[serde(rename = "imagenet")]
    ImageNet,
}

impl InputNormalization {
    pub fn apply(self, channel: usize, value: u8) -> f32 {
        let value = value as f32;
        match self {
            InputNormalization::UnitScale => value / 255.0,
            InputNormalization::MobileNetV2 => value / 127.5 - 1.0,
            InputNormalization::ImageNet => {
                (value / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel]
            }
        }
    }
}

/// Input convention of one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub layout: TensorLayout,
    /// Square spatial resolution in pixels.
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default)]
    pub normalization: InputNormalization,
}

fn default_size() -> u32 {
    224
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            layout: TensorLayout::Nhwc,
            size: default_size(),
            normalization: InputNormalization::UnitScale,
        }
    }
}

impl InputSpec {
    pub fn shape(&self) -> [usize; 4] {
        let size = self.size as usize;
        match self.layout {
            TensorLayout::Nhwc => [1, size, size, 3],
            TensorLayout::Nchw => [1, 3, size, size],
        }
    }
}

/// Decode an image file.
pub fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    image::open(path).with_context(|| format!("failed to decode image {}", path.display()))
}

/// Resize to the model's square input and lay the normalized RGB values out
/// as a batch of one.
pub fn image_to_tensor(image: &DynamicImage, spec: &InputSpec) -> anyhow::Result<Tensor> {
    if spec.size == 0 {
        anyhow::bail!("model input size must be positive");
    }

    // Exact resize with nearest-neighbour sampling, no aspect-preserving padding.
    let rgb = image
        .resize_exact(spec.size, spec.size, FilterType::Nearest)
        .to_rgb8();

    let [n, a, b, c] = spec.shape();
    let tensor = match spec.layout {
        TensorLayout::Nhwc => tract_ndarray::Array4::from_shape_fn((n, a, b, c), |(_, y, x, ch)| {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            spec.normalization.apply(ch, pixel[ch])
        }),
        TensorLayout::Nchw => tract_ndarray::Array4::from_shape_fn((n, a, b, c), |(_, ch, y, x)| {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            spec.normalization.apply(ch, pixel[ch])
        }),
    };

    Ok(tensor.into_tensor())
}
