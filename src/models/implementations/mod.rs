pub mod onnx_classifier;
pub mod onnx_labeler;

pub use onnx_classifier::{softmax, OnnxImageClassifier};
pub use onnx_labeler::OnnxImageLabeler;
