pub mod core;
pub mod invocation;
pub mod models;
pub mod pipelines;
pub mod utils;

// Re-export core types
pub use core::{ClassifierConfig, ClassifyError, FailureKind, Flavor, GatePolicy};

// Re-export the pipeline surface for easier access
pub use pipelines::mushroom_classification_pipeline::{
    ClassificationResult, MushroomClassificationPipeline, MushroomClassificationPipelineBuilder,
    ResultFormatter,
};
