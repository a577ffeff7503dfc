use super::error::ClassifyError;
use super::vocabulary::Vocabulary;
use crate::models::preprocess::{InputNormalization, InputSpec, TensorLayout};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SPOROCARP_CONFIG";
/// Environment variable overriding the installation directory.
pub const HOME_ENV: &str = "SPOROCARP_HOME";
/// Configuration file looked up in the installation directory.
pub const CONFIG_FILE_NAME: &str = "sporocarp.json";

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_FUNGUS_KEYWORDS: [&str; 6] = [
    "mushroom",
    "fungus",
    "agaric",
    "bolete",
    "earthstar",
    "stinkhorn",
];

/// Which of the two pipeline contracts to honor: label vocabulary, wire shape
/// and default gate all follow from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// Vocabulary A, threshold gate, `class: "unknown"` on errors.
    #[default]
    Sporocarp,
    /// Vocabulary B, keyword gate, advisory text and `is_mushroom` on every payload.
    Edibility,
}

impl Flavor {
    pub fn vocabulary(self) -> Vocabulary {
        match self {
            Flavor::Sporocarp => Vocabulary::SPOROCARP,
            Flavor::Edibility => Vocabulary::EDIBILITY,
        }
    }

    pub fn default_gate(self) -> GatePolicy {
        match self {
            Flavor::Sporocarp => GatePolicy::Threshold,
            Flavor::Edibility => GatePolicy::Keyword,
        }
    }

    fn default_classifier_file(self) -> &'static str {
        match self {
            Flavor::Sporocarp => "sporocarp_classifier.onnx",
            Flavor::Edibility => "mushroom_classifier.onnx",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GatePolicy {
    /// Max probability of the task-specific classifier against a threshold.
    Threshold,
    /// Top-k labels of the general labeler matched against fungus keywords.
    Keyword,
}

/// Where a model or label file comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ArtifactSource {
    /// A file path; relative paths resolve against the installation directory.
    Local { path: PathBuf },
    /// A file in a Hugging Face Hub model repository.
    HuggingFace { repo: String, filename: String },
}

impl ArtifactSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        ArtifactSource::Local { path: path.into() }
    }

    pub fn hugging_face(repo: &str, filename: &str) -> Self {
        ArtifactSource::HuggingFace {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ArtifactSource::Local { path } => path.display().to_string(),
            ArtifactSource::HuggingFace { repo, filename } => format!("hf://{repo}/{filename}"),
        }
    }
}

/// How the model's raw output is turned into probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputActivation {
    /// The model already ends in a softmax.
    #[default]
    Identity,
    /// The model emits logits.
    Softmax,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub artifact: ArtifactSource,
    #[serde(default)]
    pub input: InputSpec,
    #[serde(default)]
    pub activation: OutputActivation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFormat {
    /// A Hugging Face `config.json` carrying an `id2label` map.
    Id2Label,
    /// Plain text, one label per line, line number is the class index.
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelsSpec {
    pub artifact: ArtifactSource,
    pub format: LabelFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelerSpec {
    pub model: ModelSpec,
    pub labels: LabelsSpec,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for LabelerSpec {
    fn default() -> Self {
        const REPO: &str = "onnx-community/mobilenet_v2_1.0_224";
        Self {
            model: ModelSpec {
                artifact: ArtifactSource::hugging_face(REPO, "onnx/model.onnx"),
                input: InputSpec {
                    layout: TensorLayout::Nchw,
                    size: 224,
                    normalization: InputNormalization::MobileNetV2,
                },
                activation: OutputActivation::Softmax,
            },
            labels: LabelsSpec {
                artifact: ArtifactSource::hugging_face(REPO, "config.json"),
                format: LabelFormat::Id2Label,
            },
            top_k: DEFAULT_TOP_K,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_keywords() -> Vec<String> {
    DEFAULT_FUNGUS_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

/// Configuration of one classifier deployment. Every field has a default, so
/// a config file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub flavor: Flavor,
    /// Gate policy; falls back to the flavor's default when unset.
    pub gate: Option<GatePolicy>,
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f32,
    /// Task-specific classifier; falls back to the flavor's bundled artifact.
    pub classifier: Option<ModelSpec>,
    pub labeler: LabelerSpec,
    #[serde(default = "default_keywords")]
    pub fungus_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            flavor: Flavor::default(),
            gate: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            classifier: None,
            labeler: LabelerSpec::default(),
            fungus_keywords: default_keywords(),
        }
    }
}

impl ClassifierConfig {
    pub fn from_file(path: &Path) -> Result<Self, ClassifyError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClassifyError::Configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ClassifyError::Configuration(format!(
                "failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Load the configuration: an explicit path first, then `SPOROCARP_CONFIG`,
    /// then `sporocarp.json` in the installation directory, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ClassifyError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        if let Ok(dir) = install_dir() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        tracing::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ClassifyError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ClassifyError::Configuration(format!(
                "confidence_threshold must lie in [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.labeler.top_k == 0 {
            return Err(ClassifyError::Configuration(
                "labeler top_k must be at least 1".into(),
            ));
        }
        if self.gate_policy() == GatePolicy::Keyword
            && self.fungus_keywords.iter().all(|k| k.trim().is_empty())
        {
            return Err(ClassifyError::Configuration(
                "keyword gate needs at least one non-empty fungus keyword".into(),
            ));
        }
        Ok(())
    }

    pub fn gate_policy(&self) -> GatePolicy {
        self.gate.unwrap_or_else(|| self.flavor.default_gate())
    }

    pub fn classifier_spec(&self) -> ModelSpec {
        self.classifier.clone().unwrap_or_else(|| ModelSpec {
            artifact: ArtifactSource::local(self.flavor.default_classifier_file()),
            input: InputSpec::default(),
            activation: OutputActivation::Identity,
        })
    }
}

/// Directory that relative artifact paths resolve against: `SPOROCARP_HOME`
/// when set, otherwise the directory holding the running executable.
pub fn install_dir() -> anyhow::Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return Ok(PathBuf::from(home));
    }
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("executable path {} has no parent", exe.display()))
}
