//! healthrisk: diabetes and cardiovascular risk scoring.
//!
//! Reads one intake record as JSON (from a file argument or stdin), prints
//! the report or error body to stdout and exits 0 (200), 2 (422) or 1.

use std::io::Read;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use healthrisk::adapters::artifacts::ModelBundle;
use healthrisk::adapters::sanitize::SanitizingMakeWriter;
use healthrisk::application::{self, endpoint, AssessmentService};
use healthrisk::config::{LogMode, Settings};

fn main() -> ExitCode {
    match run() {
        Ok(status) if status == endpoint::STATUS_OK => ExitCode::SUCCESS,
        Ok(status) if status == endpoint::STATUS_UNPROCESSABLE => ExitCode::from(2),
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("healthrisk: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<u16> {
    let settings = Settings::from_env().context("Invalid configuration")?;

    // stdout carries the response body, so logs never go there.
    let (writer, _guard) = match &settings.log_mode {
        LogMode::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {path:?}"))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer, settings.sanitize_max_bytes)),
        )
        .init();

    tracing::info!("Starting healthrisk...");

    let bundle = ModelBundle::from_settings(&settings)
        .with_context(|| format!("Failed to load model artifacts from {:?}", settings.model_dir))?;
    let service = AssessmentService::from_bundle(bundle);

    let body = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read request {path}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    let response = application::handle(&service, &body);
    println!("{}", response.body);

    tracing::info!("Request finished with status {}", response.status);
    Ok(response.status)
}
