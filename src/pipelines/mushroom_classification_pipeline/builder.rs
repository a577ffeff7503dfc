use super::gate::{GateDecision, KeywordGate, ThresholdGate};
use super::model::{ImageClassificationModel, ImageLabelingModel};
use super::pipeline::MushroomClassificationPipeline;
use crate::core::config::{install_dir, ClassifierConfig, Flavor, GatePolicy};
use crate::core::{global_cache, ClassifyError, ModelOptions};
use crate::models::{OnnxImageClassifier, OnnxImageLabeler};
use crate::utils::ArtifactLoader;
use std::path::PathBuf;
use std::sync::Arc;

pub struct MushroomClassificationPipelineBuilder {
    config: ClassifierConfig,
    install_dir: Option<PathBuf>,
    classifier: Option<Arc<dyn ImageClassificationModel>>,
    labeler: Option<Arc<dyn ImageLabelingModel>>,
}

impl MushroomClassificationPipelineBuilder {
    pub fn new(flavor: Flavor) -> Self {
        Self::from_config(ClassifierConfig {
            flavor,
            ..Default::default()
        })
    }

    pub fn from_config(config: ClassifierConfig) -> Self {
        Self {
            config,
            install_dir: None,
            classifier: None,
            labeler: None,
        }
    }

    /// Vocabulary A with the threshold gate.
    pub fn sporocarp() -> Self {
        Self::new(Flavor::Sporocarp)
    }

    /// Vocabulary B with the keyword gate.
    pub fn edibility() -> Self {
        Self::new(Flavor::Edibility)
    }

    pub fn gate(mut self, policy: GatePolicy) -> Self {
        self.config.gate = Some(policy);
        self
    }

    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    pub fn fungus_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fungus_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.labeler.top_k = top_k;
        self
    }

    /// Directory that relative artifact paths resolve against.
    pub fn install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    /// Use an already loaded task-specific classifier instead of the
    /// configured artifact.
    pub fn with_classifier(mut self, classifier: Arc<dyn ImageClassificationModel>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Use an already loaded general labeler instead of the configured one.
    pub fn with_labeler(mut self, labeler: Arc<dyn ImageLabelingModel>) -> Self {
        self.labeler = Some(labeler);
        self
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Load (or fetch from the process-wide cache) the models and check the
    /// classifier's output width against the flavor's vocabulary.
    ///
    /// Every failure here is a broken deployment and is reported as a
    /// configuration error.
    pub fn build(self) -> Result<MushroomClassificationPipeline, ClassifyError> {
        self.config.validate()?;

        let flavor = self.config.flavor;
        let policy = self.config.gate_policy();
        let loader = match &self.install_dir {
            Some(dir) => ArtifactLoader::new(dir.clone()),
            None => ArtifactLoader::new(install_dir().map_err(ClassifyError::configuration)?),
        };

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => load_classifier(&self.config, &loader)?,
        };
        flavor.vocabulary().ensure_width(classifier.num_classes())?;

        let gate: Box<dyn GateDecision> = match policy {
            GatePolicy::Threshold => Box::new(ThresholdGate::new(self.config.confidence_threshold)),
            GatePolicy::Keyword => {
                let labeler = match self.labeler {
                    Some(labeler) => labeler,
                    None => load_labeler(&self.config, &loader)?,
                };
                Box::new(KeywordGate::new(
                    labeler,
                    &self.config.fungus_keywords,
                    self.config.labeler.top_k,
                ))
            }
        };

        tracing::info!(?flavor, ?policy, "pipeline ready");

        Ok(MushroomClassificationPipeline {
            flavor,
            classifier,
            gate,
        })
    }
}

fn load_classifier(
    config: &ClassifierConfig,
    loader: &ArtifactLoader,
) -> Result<Arc<dyn ImageClassificationModel>, ClassifyError> {
    let spec = config.classifier_spec();
    let key = format!("{}@{}", spec.cache_key(), loader.install_dir().display());

    let model = global_cache()
        .get_or_create::<OnnxImageClassifier, _>(&key, || {
            let path = loader.resolve(&spec.artifact)?;
            OnnxImageClassifier::load(&path, &spec)
        })
        .map_err(into_configuration_error)?;

    Ok(Arc::new(model))
}

fn load_labeler(
    config: &ClassifierConfig,
    loader: &ArtifactLoader,
) -> Result<Arc<dyn ImageLabelingModel>, ClassifyError> {
    let spec = &config.labeler;
    let key = format!(
        "{}+{}@{}",
        spec.model.cache_key(),
        spec.labels.artifact.describe(),
        loader.install_dir().display()
    );

    let model = global_cache()
        .get_or_create::<OnnxImageLabeler, _>(&key, || {
            let labels = loader.load_labels(&spec.labels)?;
            let path = loader.resolve(&spec.model.artifact)?;
            OnnxImageLabeler::load(&path, spec, labels)
        })
        .map_err(into_configuration_error)?;

    Ok(Arc::new(model))
}

// Keep tagged mismatches intact; everything else during loading is a
// configuration failure.
fn into_configuration_error(err: anyhow::Error) -> ClassifyError {
    match err.downcast::<ClassifyError>() {
        Ok(err) => err,
        Err(err) => ClassifyError::configuration(err),
    }
}
