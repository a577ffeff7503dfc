pub mod implementations;
pub mod preprocess;

pub use implementations::{OnnxImageClassifier, OnnxImageLabeler};
pub use preprocess::{image_to_tensor, load_image, InputNormalization, InputSpec, TensorLayout};
