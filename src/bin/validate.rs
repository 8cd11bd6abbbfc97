//! Validate every language in a manifest against the default strings.
//!
//! Usage:
//!   validate [MANIFEST]
//!
//! The manifest path defaults to STRINGS_MANIFEST. Exits with status 1 if any
//! dataset fails to load or has shape errors; warnings are printed but do not
//! fail the run.

use anyhow::{Context, Result};
use localized_strings::config::Manifest;
use localized_strings::i18n::{
    unwrap_module_default, DatasetSource, TranslationValidator, ValidationReport,
};
use std::path::PathBuf;
use tracing::{error, info};

fn print_report(code: &str, report: &ValidationReport) {
    if report.is_clean() {
        println!("{}: ok", code);
        return;
    }
    println!(
        "{}: {} error(s), {} warning(s)",
        code,
        report.errors.len(),
        report.warnings.len()
    );
    for message in &report.errors {
        println!("  error: {}", message);
    }
    for message in &report.warnings {
        println!("  warning: {}", message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("localized_strings=info".parse()?),
        )
        .init();

    let manifest_path: PathBuf = match std::env::args().nth(1) {
        Some(path) => path.into(),
        None => std::env::var("STRINGS_MANIFEST")
            .context("Pass a manifest path or set STRINGS_MANIFEST")?
            .into(),
    };

    let manifest = Manifest::from_file(&manifest_path)?;
    let config = manifest.into_config(&reqwest::Client::new()).await?;
    let schema = config.strings.schema.value();
    info!(
        "Validating {} language(s) against '{}'",
        config.languages.len(),
        config.strings.code
    );

    let mut failed = false;
    for (code, language) in &config.languages {
        let dataset = match &language.source {
            DatasetSource::Inline(data) => Ok(data.clone()),
            DatasetSource::Loader(loader) => loader.load().await,
        };

        match dataset {
            Ok(dataset) => {
                let report = TranslationValidator::validate(schema, &unwrap_module_default(dataset));
                failed |= report.has_errors();
                print_report(code, &report);
            }
            Err(e) => {
                error!("Failed to load '{}': {:#}", code, e);
                println!("{}: failed to load", code);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
