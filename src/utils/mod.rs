pub mod loaders;

pub use loaders::{ArtifactLoader, HfLoader};
