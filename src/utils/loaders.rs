use crate::core::config::{ArtifactSource, LabelFormat, LabelsSpec};
use anyhow::Context;
use hf_hub::api::sync::Api as HfApi;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    /// Download the file into the local hub cache, or reuse the cached copy.
    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = HfApi::new()?;
        let hf_api = hf_api.model(self.repo.clone());

        hf_api
            .get(self.filename.as_str())
            .with_context(|| format!("failed to fetch {} from {}", self.filename, self.repo))
    }
}

/// Turns artifact sources into readable local files.
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    install_dir: PathBuf,
}

impl ArtifactLoader {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn resolve(&self, source: &ArtifactSource) -> anyhow::Result<PathBuf> {
        match source {
            ArtifactSource::Local { path } => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.install_dir.join(path)
                };
                if !path.is_file() {
                    anyhow::bail!("model artifact not found at {}", path.display());
                }
                Ok(path)
            }
            ArtifactSource::HuggingFace { repo, filename } => HfLoader::new(repo, filename).load(),
        }
    }

    pub fn load_labels(&self, spec: &LabelsSpec) -> anyhow::Result<Vec<String>> {
        let path = self.resolve(&spec.artifact)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;
        parse_labels(&content, spec.format)
            .with_context(|| format!("failed to parse label file {}", path.display()))
    }
}

/// Parse a label file into an index-ordered list.
pub fn parse_labels(content: &str, format: LabelFormat) -> anyhow::Result<Vec<String>> {
    match format {
        LabelFormat::Lines => {
            let labels: Vec<String> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            if labels.is_empty() {
                anyhow::bail!("label file is empty");
            }
            Ok(labels)
        }
        LabelFormat::Id2Label => {
            #[derive(serde::Deserialize)]
            struct Id2LabelConfig {
                id2label: HashMap<String, String>,
            }
            let config: Id2LabelConfig = serde_json::from_str(content)?;

            let mut indexed = config
                .id2label
                .into_iter()
                .map(|(id, label)| {
                    id.parse::<usize>()
                        .map(|id| (id, label))
                        .with_context(|| format!("id2label key `{id}` is not an index"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            indexed.sort_by_key(|(id, _)| *id);

            // Indices must cover 0..n without gaps, or labels would shift.
            for (expected, (id, _)) in indexed.iter().enumerate() {
                if *id != expected {
                    anyhow::bail!("id2label is missing index {expected}");
                }
            }
            if indexed.is_empty() {
                anyhow::bail!("id2label is empty");
            }
            Ok(indexed.into_iter().map(|(_, label)| label).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id2label_is_ordered_by_index() {
        let labels = parse_labels(
            r#"{"id2label": {"2": "bolete", "0": "background", "1": "agaric"}, "num_labels": 3}"#,
            LabelFormat::Id2Label,
        )
        .unwrap();
        assert_eq!(labels, vec!["background", "agaric", "bolete"]);
    }

    #[test]
    fn id2label_with_gap_is_rejected() {
        let err = parse_labels(
            r#"{"id2label": {"0": "a", "2": "c"}}"#,
            LabelFormat::Id2Label,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing index 1"));
    }

    #[test]
    fn lines_skip_blank_lines() {
        let labels = parse_labels("tench\n\ngoldfish\n  stinkhorn  \n", LabelFormat::Lines).unwrap();
        assert_eq!(labels, vec!["tench", "goldfish", "stinkhorn"]);
    }

    #[test]
    fn relative_local_paths_resolve_against_install_dir() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("model.onnx"), b"onnx")?;

        let loader = ArtifactLoader::new(dir.path());
        let resolved = loader.resolve(&ArtifactSource::local("model.onnx"))?;
        assert_eq!(resolved, dir.path().join("model.onnx"));

        let missing = loader.resolve(&ArtifactSource::local("absent.onnx"));
        assert!(missing.is_err());
        Ok(())
    }
}
