//! Process boundary: one image path in, one JSON object and an exit code out.
//!
//! Usage and not-found failures are detected before any model is loaded.
//! Inference failures are reported through the result's error variant with a
//! successful exit code, so callers always get a parseable payload.

use crate::core::config::{ClassifierConfig, Flavor, GatePolicy};
use crate::core::{ClassifyError, FailureKind};
use crate::pipelines::mushroom_classification_pipeline::{
    MushroomClassificationPipeline, MushroomClassificationPipelineBuilder, Payload,
    ResultFormatter,
};
use crate::pipelines::mushroom_classification_pipeline::pipeline::ensure_readable;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

/// Environment variable selecting the flavor when `--flavor` is absent.
pub const FLAVOR_ENV: &str = "SPOROCARP_FLAVOR";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "sporocarp",
    version,
    about = "Classify a photograph as a mushroom edibility category, printing one JSON object"
)]
pub struct Cli {
    /// Path of the image to classify.
    pub image: Option<PathBuf>,

    /// Result contract to honor.
    #[arg(long, value_enum, env = "SPOROCARP_FLAVOR")]
    pub flavor: Option<Flavor>,

    /// Gate policy, overriding the flavor default.
    #[arg(long, value_enum)]
    pub gate: Option<GatePolicy>,

    /// Confidence threshold of the threshold gate, in [0, 1].
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Configuration file (JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub payload: Payload,
    pub exit_code: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A JSON payload for stdout.
    Respond(Response),
    /// `--help` or `--version` text.
    Info(String),
}

/// Parse `args` (including the program name) and run one classification with
/// the configured models.
pub fn run<I, T>(args: I) -> Outcome
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return Outcome::Info(err.to_string());
        }
        Err(err) => {
            tracing::debug!(error = %err, "invalid arguments");
            let error = ClassifyError::Usage(err.to_string());
            return Outcome::Respond(failure(flavor_hint(&args), &error));
        }
    };

    Outcome::Respond(execute(cli, |config| {
        MushroomClassificationPipelineBuilder::from_config(config).build()
    }))
}

/// Run one invocation with a caller-supplied pipeline constructor. The
/// constructor is only called once the arguments and the image path have
/// been checked.
pub fn execute<F>(cli: Cli, build: F) -> Response
where
    F: FnOnce(ClassifierConfig) -> Result<MushroomClassificationPipeline, ClassifyError>,
{
    let loaded = ClassifierConfig::load(cli.config.as_deref());
    let flavor = cli
        .flavor
        .or_else(|| loaded.as_ref().ok().map(|config| config.flavor))
        .unwrap_or_default();

    // Usage and not-found take precedence over a broken config file.
    let Some(image) = cli.image.as_deref() else {
        return failure(flavor, &ClassifyError::Usage("No image path provided".into()));
    };
    if let Err(err) = ensure_readable(image) {
        return failure(flavor, &err);
    }

    let config = match loaded {
        Ok(config) => apply_overrides(config, &cli),
        Err(err) => return failure(flavor, &err),
    };

    let pipeline = match build(config) {
        Ok(pipeline) => pipeline,
        Err(err) => {
            tracing::error!(error = %err, "failed to build pipeline");
            return failure(flavor, &err);
        }
    };

    classify(&pipeline, image)
}

/// Classify one image with an existing pipeline.
pub fn classify(pipeline: &MushroomClassificationPipeline, image: &Path) -> Response {
    let formatter = pipeline.formatter();
    match pipeline.classify_or_report(image) {
        Ok(result) => Response {
            payload: formatter.format(&result),
            exit_code: EXIT_SUCCESS,
        },
        Err(err) => failure(pipeline.flavor(), &err),
    }
}

/// Flavor for a command line clap rejected: an explicit `--flavor` if one
/// can be read, then `SPOROCARP_FLAVOR`, then the config file.
fn flavor_hint(args: &[OsString]) -> Flavor {
    let mut explicit = None;
    let mut rest = args.iter().skip(1).filter_map(|arg| arg.to_str());
    while let Some(arg) = rest.next() {
        if arg == "--" {
            break;
        }
        let value = match arg.strip_prefix("--flavor") {
            Some("") => rest.next(),
            Some(inline) => inline.strip_prefix('='),
            None => None,
        };
        if let Some(flavor) = value.and_then(|v| Flavor::from_str(v, true).ok()) {
            explicit = Some(flavor);
        }
    }

    explicit
        .or_else(|| {
            std::env::var(FLAVOR_ENV)
                .ok()
                .and_then(|v| Flavor::from_str(&v, true).ok())
        })
        .or_else(|| ClassifierConfig::load(None).ok().map(|config| config.flavor))
        .unwrap_or_default()
}

fn apply_overrides(mut config: ClassifierConfig, cli: &Cli) -> ClassifierConfig {
    if let Some(flavor) = cli.flavor {
        config.flavor = flavor;
    }
    if let Some(gate) = cli.gate {
        config.gate = Some(gate);
    }
    if let Some(threshold) = cli.threshold {
        config.confidence_threshold = threshold;
    }
    config
}

fn failure(flavor: Flavor, err: &ClassifyError) -> Response {
    let exit_code = match err.kind() {
        FailureKind::Inference => EXIT_SUCCESS,
        FailureKind::Usage | FailureKind::NotFound | FailureKind::Configuration => EXIT_FAILURE,
    };
    Response {
        payload: ResultFormatter::new(flavor).format_failure(err),
        exit_code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence_over_config() {
        let cli = Cli::try_parse_from([
            "sporocarp",
            "--flavor",
            "edibility",
            "--gate",
            "threshold",
            "--threshold",
            "0.8",
            "cap.jpg",
        ])
        .unwrap();
        let config = apply_overrides(ClassifierConfig::default(), &cli);
        assert_eq!(config.flavor, Flavor::Edibility);
        assert_eq!(config.gate_policy(), GatePolicy::Threshold);
        assert_eq!(config.confidence_threshold, 0.8);
        assert_eq!(cli.image, Some(PathBuf::from("cap.jpg")));
    }

    #[test]
    fn extra_positional_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["sporocarp", "a.jpg", "b.jpg"]).is_err());
    }

    #[test]
    fn flavor_hint_reads_rejected_command_lines() {
        let args = |items: &[&str]| items.iter().map(OsString::from).collect::<Vec<_>>();
        assert_eq!(
            flavor_hint(&args(&["sporocarp", "--flavor", "edibility", "a.jpg", "b.jpg"])),
            Flavor::Edibility
        );
        assert_eq!(
            flavor_hint(&args(&["sporocarp", "--flavor=edibility", "--bogus"])),
            Flavor::Edibility
        );
        assert_eq!(
            flavor_hint(&args(&["sporocarp", "--", "--flavor=edibility"])),
            flavor_hint(&args(&["sporocarp"]))
        );
    }

    #[test]
    fn help_is_informational() {
        assert!(matches!(run(["sporocarp", "--help"]), Outcome::Info(_)));
    }
}
