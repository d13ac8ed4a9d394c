//! Vitalrisk: heart and diabetes risk scoring
//!
//! Main entry point. Loads every artifact once, then either answers
//! JSON-lines assessment requests from stdin (`predict`, the default) or
//! prints the loaded models (`health`).

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitalrisk::adapters::sanitize::SanitizingMakeWriter;
use vitalrisk::adapters::{DirectoryArtifactSource, JsonArtifactDecoder};
use vitalrisk::config::{LogMode, Settings};
use vitalrisk::{AssessmentRequest, AssessmentService, ModelRegistry, VitalriskError};

enum Mode {
    Predict,
    Health,
}

fn usage() -> &'static str {
    "Usage: vitalrisk [predict|health]"
}

fn parse_mode() -> Result<Mode> {
    let mut args = std::env::args().skip(1);
    let mode = match args.next().as_deref() {
        None | Some("predict") => Mode::Predict,
        Some("health") => Mode::Health,
        Some(_) => bail!(usage()),
    };
    if args.next().is_some() {
        bail!(usage());
    }
    Ok(mode)
}

fn main() -> Result<()> {
    let mode = parse_mode()?;
    let settings = Settings::from_env()?;

    // Stdout carries responses, so logs go to stderr or a file.
    let (writer, _guard) = match settings.log_mode {
        LogMode::File => {
            if let Some(parent) = settings.log_file.parent() {
                // Best-effort: open() reports the real problem.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&settings.log_file)
                .with_context(|| format!("opening log file {:?}", settings.log_file))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    tracing::info!("Starting Vitalrisk...");

    let source = DirectoryArtifactSource::from_settings(&settings)?;
    let registry = ModelRegistry::load(&source, &JsonArtifactDecoder::new())
        .context("model registry failed to load")?;
    let service = AssessmentService::new(Arc::new(registry));

    match mode {
        Mode::Health => {
            println!("{}", serde_json::to_string_pretty(&service.health())?);
        }
        Mode::Predict => serve(&service)?,
    }

    tracing::info!("Vitalrisk shutdown complete.");
    Ok(())
}

/// Answer one JSON request per stdin line with one JSON line on stdout.
fn serve(service: &AssessmentService) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<AssessmentRequest>(&line) {
            Ok(request) => match service.assess(&request) {
                Ok(assessment) => serde_json::to_value(&assessment)?,
                Err(VitalriskError::MissingFeatures(fields)) => json!({
                    "error": "missing or invalid features",
                    "missing_fields": fields,
                }),
                Err(e) => json!({ "error": e.to_string() }),
            },
            Err(e) => {
                tracing::warn!("Malformed request: {}", e);
                json!({ "error": format!("malformed request: {e}") })
            }
        };

        serde_json::to_writer(&mut out, &response)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }
    Ok(())
}
