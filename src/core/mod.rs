pub mod advisory;
pub mod cache;
pub mod config;
pub mod error;
pub mod vocabulary;

pub use advisory::{advisory_for, GENERIC_ADVISORY};
pub use cache::{global_cache, ModelCache, ModelOptions};
pub use config::{ArtifactSource, ClassifierConfig, Flavor, GatePolicy, ModelSpec};
pub use error::{ClassifyError, FailureKind};
pub use vocabulary::Vocabulary;
