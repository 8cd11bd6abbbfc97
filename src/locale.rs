//! Host locale detection.
//!
//! A [`LocaleSource`] reports the host's ordered language preferences as BCP
//! 47-style tags, or `None` when the host has no such list.

use std::env;

/// Environment variables consulted by [`EnvLocale`], in priority order.
const LOCALE_VARS: [&str; 4] = ["LANGUAGE", "LC_ALL", "LC_MESSAGES", "LANG"];

/// Source of the host's preferred languages.
pub trait LocaleSource: Send + Sync {
    fn preferred_languages(&self) -> Option<Vec<String>>;
}

/// Reads POSIX locale environment variables.
///
/// `LANGUAGE` may hold a colon-separated list (`fr_CA:fr:en`); the others
/// hold one locale each (`fr_FR.UTF-8`).
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvLocale;

impl LocaleSource for EnvLocale {
    fn preferred_languages(&self) -> Option<Vec<String>> {
        let mut tags: Vec<String> = Vec::new();
        for var in LOCALE_VARS {
            let Ok(value) = env::var(var) else {
                continue;
            };
            for tag in value.split(':').filter_map(parse_posix_locale) {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        (!tags.is_empty()).then_some(tags)
    }
}

/// A fixed preference list.
#[derive(Debug, Default, Clone)]
pub struct StaticLocales(pub Vec<String>);

impl StaticLocales {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }
}

impl LocaleSource for StaticLocales {
    fn preferred_languages(&self) -> Option<Vec<String>> {
        Some(self.0.clone())
    }
}

/// A host with no preference list.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocales;

impl LocaleSource for NoLocales {
    fn preferred_languages(&self) -> Option<Vec<String>> {
        None
    }
}

/// Convert a POSIX locale (`fr_FR.UTF-8@euro`) to a language tag (`fr-FR`).
///
/// Returns `None` for empty values and the `C`/`POSIX` locales.
pub fn parse_posix_locale(raw: &str) -> Option<String> {
    let without_modifier = raw.split('@').next().unwrap_or(raw);
    let without_encoding = without_modifier.split('.').next().unwrap_or(without_modifier);
    let trimmed = without_encoding.trim();

    if trimmed.is_empty() || trimmed == "C" || trimmed == "POSIX" {
        return None;
    }
    Some(trimmed.replace('_', "-"))
}
