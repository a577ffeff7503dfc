// Process-boundary tests: argument handling, payload shapes and exit codes.

mod common;

use clap::Parser;
use common::*;
use serde_json::{json, Value};
use sporocarp::invocation::{self, execute, Cli, Outcome, Response, EXIT_FAILURE, EXIT_SUCCESS};
use sporocarp::pipelines::mushroom_classification_pipeline::*;
use std::sync::Arc;

fn payload_json(response: &Response) -> anyhow::Result<Value> {
    Ok(serde_json::from_str(&response.payload.to_json()?)?)
}

fn respond(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Respond(response) => response,
        Outcome::Info(text) => panic!("expected a payload, got info text: {text}"),
    }
}

#[test]
fn missing_argument_is_usage_failure() -> anyhow::Result<()> {
    let response = respond(invocation::run(["sporocarp"]));
    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(
        payload_json(&response)?,
        json!({
            "error": "No image path provided",
            "class": "unknown",
            "confidence": 0.0,
        })
    );
    Ok(())
}

#[test]
fn missing_argument_edibility_shape() -> anyhow::Result<()> {
    let response = respond(invocation::run(["sporocarp", "--flavor", "edibility"]));
    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(
        payload_json(&response)?,
        json!({
            "class": "error",
            "confidence": 0.0,
            "details": "Invalid usage. Please provide an image path.",
        })
    );
    Ok(())
}

#[test]
fn unknown_flag_is_usage_failure() -> anyhow::Result<()> {
    let response = respond(invocation::run(["sporocarp", "--bogus", "cap.jpg"]));
    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(response.payload.class(), "unknown");
    Ok(())
}

#[test]
fn rejected_arguments_keep_the_requested_flavor() -> anyhow::Result<()> {
    let response = respond(invocation::run([
        "sporocarp",
        "--flavor",
        "edibility",
        "a.jpg",
        "b.jpg",
    ]));
    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(
        payload_json(&response)?,
        json!({
            "class": "error",
            "confidence": 0.0,
            "details": "Invalid usage. Please provide an image path.",
        })
    );
    Ok(())
}

#[test]
fn missing_argument_wins_over_broken_config() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("broken.json").display().to_string();
    std::fs::write(&config_path, "{ not json")?;

    let cli = Cli::try_parse_from(["sporocarp", "--config", config_path.as_str()])?;
    let response = execute(cli, |_| panic!("no image, no models"));

    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(
        payload_json(&response)?["error"],
        json!("No image path provided")
    );
    Ok(())
}

#[test]
fn unreadable_path_is_reported_before_loading_models() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().display().to_string();

    let cli = Cli::try_parse_from(["sporocarp", path.as_str()])?;
    let response = execute(cli, |_| panic!("models must not be loaded for an unreadable path"));

    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(
        payload_json(&response)?["error"],
        json!(format!("File not found: {path}"))
    );
    Ok(())
}

#[test]
fn missing_file_is_reported_before_loading_models() -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(["sporocarp", "--flavor", "edibility", "/no/such/cap.jpg"])?;
    let response = execute(cli, |_| panic!("models must not be loaded for a missing file"));

    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(
        payload_json(&response)?,
        json!({
            "class": "error",
            "confidence": 0.0,
            "details": "File not found: /no/such/cap.jpg",
        })
    );
    Ok(())
}

#[test]
fn successful_classification_exits_zero() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let image = write_png(dir.path(), "cap.png")?.display().to_string();

    let cli = Cli::try_parse_from(["sporocarp", image.as_str()])?;
    let response = execute(cli, |config| {
        MushroomClassificationPipelineBuilder::from_config(config)
            .with_classifier(Arc::new(FixedClassifier::new(&[0.1, 0.75, 0.1, 0.05])))
            .build()
    });

    assert_eq!(response.exit_code, EXIT_SUCCESS);
    assert_eq!(
        payload_json(&response)?,
        json!({ "class": "edible_sporocarp", "confidence": 0.75 })
    );
    Ok(())
}

#[test]
fn cli_overrides_reach_the_builder() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let image = write_png(dir.path(), "cap.png")?.display().to_string();

    let cli = Cli::try_parse_from([
        "sporocarp",
        "--flavor",
        "edibility",
        "--gate",
        "threshold",
        "--threshold",
        "0.9",
        image.as_str(),
    ])?;
    let response = execute(cli, |config| {
        assert_eq!(config.gate_policy(), GatePolicy::Threshold);
        MushroomClassificationPipelineBuilder::from_config(config)
            .with_classifier(Arc::new(FixedClassifier::new(&[0.1, 0.75, 0.1, 0.05])))
            .build()
    });

    assert_eq!(response.exit_code, EXIT_SUCCESS);
    let json = payload_json(&response)?;
    assert_eq!(json["class"], json!("not_a_mushroom"));
    assert_eq!(json["is_mushroom"], json!(false));
    Ok(())
}

#[test]
fn corrupt_image_exits_zero_with_error_payload() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let image = write_corrupt(dir.path(), "broken.jpg")?.display().to_string();

    let cli = Cli::try_parse_from(["sporocarp", image.as_str()])?;
    let response = execute(cli, |config| {
        MushroomClassificationPipelineBuilder::from_config(config)
            .with_classifier(Arc::new(FixedClassifier::new(&[0.25; 4])))
            .build()
    });

    assert_eq!(response.exit_code, EXIT_SUCCESS);
    let json = payload_json(&response)?;
    assert_eq!(json["class"], json!("unknown"));
    assert_eq!(json["confidence"], json!(0.0));
    assert!(json["error"].is_string());
    Ok(())
}

#[test]
fn broken_deployment_exits_one() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let image = write_png(dir.path(), "cap.png")?.display().to_string();
    let empty_install = tempfile::tempdir()?;

    let cli = Cli::try_parse_from(["sporocarp", image.as_str()])?;
    let response = execute(cli, |config| {
        MushroomClassificationPipelineBuilder::from_config(config)
            .install_dir(empty_install.path())
            .build()
    });

    assert_eq!(response.exit_code, EXIT_FAILURE);
    let json = payload_json(&response)?;
    assert_eq!(json["class"], json!("unknown"));
    assert!(json["error"]
        .as_str()
        .is_some_and(|m| m.starts_with("configuration error")));
    Ok(())
}

#[test]
fn config_file_selects_flavor() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("sporocarp.json").display().to_string();
    std::fs::write(&config_path, r#"{ "flavor": "edibility" }"#)?;

    let cli = Cli::try_parse_from([
        "sporocarp",
        "--config",
        config_path.as_str(),
    ])?;
    let response = execute(cli, |_| panic!("no image, no models"));

    assert_eq!(response.exit_code, EXIT_FAILURE);
    assert_eq!(
        payload_json(&response)?["details"],
        json!("Invalid usage. Please provide an image path.")
    );
    Ok(())
}

#[test]
fn version_is_informational() {
    assert!(matches!(
        invocation::run(["sporocarp", "--version"]),
        Outcome::Info(_)
    ));
}
