//! Mushroom classification pipeline.
//!
//! Decides whether a photograph shows a mushroom and, if it does, which
//! edibility category it belongs to, with a confidence score and advisory
//! text.
//!
//! ## Main Types
//!
//! - [`MushroomClassificationPipeline`] - Gate Decision followed by Category Decision
//! - [`MushroomClassificationPipelineBuilder`] - Builder pattern for pipeline configuration
//! - [`GateDecision`] - Threshold and keyword gate strategies
//! - [`ClassificationResult`] / [`ResultFormatter`] - Result and its JSON shapes
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use sporocarp::pipelines::mushroom_classification_pipeline::*;
//!
//! let pipeline = MushroomClassificationPipelineBuilder::edibility().build()?;
//!
//! let result = pipeline.classify(std::path::Path::new("chanterelle.jpg"))?;
//! println!("{}", pipeline.formatter().format(&result).to_json()?);
//! # anyhow::Ok(())
//! ```

pub mod builder;
pub mod category;
pub mod gate;
pub mod model;
pub mod pipeline;
pub mod probabilities;
pub mod result;

pub use builder::MushroomClassificationPipelineBuilder;
pub use category::decide_category;
pub use gate::{keyword_gate, threshold_gate, GateDecision, GateOutcome, KeywordGate, ThresholdGate};
pub use model::{ImageClassificationModel, ImageLabelingModel, LabelScore};
pub use pipeline::MushroomClassificationPipeline;
pub use probabilities::Probabilities;
pub use result::{ClassificationResult, Payload, ResultFormatter};

pub use crate::core::config::{ClassifierConfig, Flavor, GatePolicy};
pub use crate::core::{ClassifyError, FailureKind};
