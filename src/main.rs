//! Print localized strings from a manifest.
//!
//! Usage:
//!   localized-strings [--lang CODE] KEY [KEY...]
//!
//! Keys are dotted paths into the default strings (`menu.open`). Arguments of
//! the form `name=value` become template variables. With `--lang`, the
//! session switches to CODE before printing.
//!
//! Required environment variables:
//! - STRINGS_MANIFEST
//!
//! Optional:
//! - STRINGS_MODE (development | production)
//! - STRINGS_LOCALE (locks the session to one language)
//! - STRINGS_PREFERENCE_DIR (persist the chosen language)
//! - STRINGS_FADE_MS

use anyhow::{Context, Result};
use localized_strings::config::{Manifest, Settings};
use localized_strings::i18n::{SessionBuilder, SwitchOutcome, Vars};
use localized_strings::locale::EnvLocale;
use localized_strings::storage::FileStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

struct Args {
    language: Option<String>,
    keys: Vec<String>,
    vars: Vars,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut language = None;
    let mut keys = Vec::new();
    let mut vars = Vars::new();

    while let Some(arg) = args.next() {
        if arg == "--lang" {
            language = Some(args.next().context("--lang needs a language code")?);
        } else if let Some((name, value)) = arg.split_once('=') {
            vars.insert(name.to_string(), Value::String(value.to_string()));
        } else {
            keys.push(arg);
        }
    }

    Ok(Args {
        language,
        keys,
        vars,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("localized_strings=info".parse()?),
        )
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    let settings = Settings::from_env()?;

    info!("Loading manifest {}", settings.manifest_path.display());
    let manifest = Manifest::from_file(&settings.manifest_path)?;
    let client = reqwest::Client::new();
    let config = settings.apply(manifest.into_config(&client).await?);

    let mut builder = SessionBuilder::new(config).locales(Arc::new(EnvLocale));
    if let Some(dir) = &settings.preference_dir {
        builder = builder.store(Arc::new(FileStore::new(dir)));
    }
    if let Some(code) = &settings.locale {
        builder = builder.lock_language(code.clone());
    }

    let session = builder.start().await?;
    session.settled().await;

    if let Some(code) = &args.language {
        match session.change_language(code).await? {
            SwitchOutcome::Locked => {
                warn!("Session is locked, staying in '{}'", session.current_language())
            }
            SwitchOutcome::FellBack => {
                warn!("Could not load '{}', showing default strings", code)
            }
            _ => {}
        }
    }

    let state = session.state();
    println!("language: {} ({})", state.language, state.direction);

    let strings = session.strings();
    let arrays = session.arrays();
    for key in &args.keys {
        let pointer = format!("/{}", key.replace('.', "/"));
        let is_array = session
            .schema()
            .value()
            .pointer(&pointer)
            .is_some_and(Value::is_array);

        match arrays.get(key) {
            Some(items) if is_array => println!("{} = {}", key, Value::Array(items.to_vec())),
            _ => println!("{} = {}", key, strings.text(key, Some(&args.vars))),
        }
    }

    let report = serde_json::to_string_pretty(&session.metrics().report())?;
    info!("Load metrics: {}", report);

    Ok(())
}
