use sporocarp::invocation::{self, Outcome, EXIT_FAILURE};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries nothing but the JSON payload.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SPOROCARP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match invocation::run(std::env::args_os()) {
        Outcome::Info(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Outcome::Respond(response) => match response.payload.to_json() {
            Ok(json) => {
                println!("{json}");
                ExitCode::from(response.exit_code)
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize result");
                ExitCode::from(EXIT_FAILURE)
            }
        },
    }
}
