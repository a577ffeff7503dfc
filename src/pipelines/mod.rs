// Pipeline modules organized by functionality
pub mod mushroom_classification_pipeline;

pub use mushroom_classification_pipeline::*;
