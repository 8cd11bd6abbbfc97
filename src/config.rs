//! Configuration: environment settings and the language manifest.
//!
//! The manifest is a JSON file describing the default language and every
//! other language's dataset source:
//!
//! ```json
//! {
//!   "default": { "code": "en", "path": "en.json" },
//!   "languages": {
//!     "fr": { "path": "fr.json" },
//!     "ar": { "url": "https://cdn.example.com/ar.json", "direction": "rtl" }
//!   },
//!   "useStoredPreference": true,
//!   "fadeDurationMs": 150
//! }
//! ```
//!
//! Relative paths resolve against the manifest's directory.

use crate::i18n::{
    DefaultStrings, Direction, FallbackMode, HttpLoader, I18nError, JsonFileLoader, LanguageInfo,
    StringsConfig,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub manifest_path: PathBuf,
    pub mode: Option<FallbackMode>,
    /// Lock the session to this language.
    pub locale: Option<String>,
    /// Directory for the file-backed preference store.
    pub preference_dir: Option<PathBuf>,
    pub fade_ms: Option<u64>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            manifest_path: std::env::var("STRINGS_MANIFEST")
                .context("STRINGS_MANIFEST not set")?
                .into(),

            mode: std::env::var("STRINGS_MODE")
                .ok()
                .map(|v| v.parse::<FallbackMode>().map_err(anyhow::Error::msg))
                .transpose()
                .context("Invalid STRINGS_MODE")?,

            locale: std::env::var("STRINGS_LOCALE")
                .ok()
                .filter(|v| !v.trim().is_empty()),

            preference_dir: std::env::var("STRINGS_PREFERENCE_DIR").ok().map(PathBuf::from),

            fade_ms: std::env::var("STRINGS_FADE_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
        })
    }

    /// Apply environment overrides on top of a manifest configuration.
    pub fn apply(&self, mut config: StringsConfig) -> StringsConfig {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(ms) = self.fade_ms {
            config.fade_duration = Duration::from_millis(ms);
        }
        config
    }
}

/// Default language entry of a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestDefault {
    pub code: String,
    pub path: PathBuf,
    #[serde(default)]
    pub direction: Direction,
}

/// Dataset source of a non-default language: a file path or a URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestLanguage {
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    #[serde(default)]
    pub direction: Direction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub default: ManifestDefault,
    #[serde(default)]
    pub languages: BTreeMap<String, ManifestLanguage>,
    #[serde(default)]
    pub use_browser_negotiation: bool,
    #[serde(default)]
    pub use_stored_preference: bool,
    pub fade_color: Option<String>,
    pub fade_duration_ms: Option<u64>,
    pub mode: Option<FallbackMode>,

    #[serde(skip)]
    base_dir: PathBuf,
}

impl Manifest {
    /// Parse a manifest whose relative paths resolve against `base_dir`.
    pub fn parse(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self, I18nError> {
        let mut manifest: Manifest =
            serde_json::from_str(json).map_err(|e| I18nError::Manifest(e.to_string()))?;
        manifest.base_dir = base_dir.into();

        for (code, language) in &manifest.languages {
            match (&language.path, &language.url) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(I18nError::Manifest(format!(
                        "language '{}' needs exactly one of 'path' or 'url'",
                        code
                    )))
                }
            }
        }
        Ok(manifest)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::parse(&contents, base_dir)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Path of the default language's strings.
    pub fn default_path(&self) -> PathBuf {
        self.resolve(&self.default.path)
    }

    /// Read the default strings and build a session configuration.
    ///
    /// Other languages become lazy loaders: [`JsonFileLoader`] for paths and
    /// [`HttpLoader`] (sharing `client`) for URLs.
    pub async fn into_config(self, client: &reqwest::Client) -> Result<StringsConfig> {
        let default_path = self.default_path();
        let contents = tokio::fs::read_to_string(&default_path)
            .await
            .with_context(|| format!("Failed to read default strings {}", default_path.display()))?;
        let data: serde_json::Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse default strings {}", default_path.display()))?;

        let strings = DefaultStrings::new(self.default.code.clone(), data)?
            .with_direction(self.default.direction);

        let mut config = StringsConfig::new(strings)
            .browser_negotiation(self.use_browser_negotiation)
            .stored_preference(self.use_stored_preference);
        if let Some(color) = &self.fade_color {
            config.fade_color = color.clone();
        }
        if let Some(ms) = self.fade_duration_ms {
            config.fade_duration = Duration::from_millis(ms);
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }

        for (code, language) in &self.languages {
            let info = match (&language.path, &language.url) {
                (Some(path), _) => LanguageInfo::loader(JsonFileLoader::new(self.resolve(path))),
                (None, Some(url)) => LanguageInfo::loader(HttpLoader::new(client.clone(), url)),
                (None, None) => continue,
            };
            config = config.language(code.clone(), info.with_direction(language.direction));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 5] = [
        "STRINGS_MANIFEST",
        "STRINGS_MODE",
        "STRINGS_LOCALE",
        "STRINGS_PREFERENCE_DIR",
        "STRINGS_FADE_MS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    // ==================== Settings Tests ====================

    #[test]
    #[serial]
    fn test_settings_requires_manifest() {
        clear_env();
        let err = Settings::from_env().unwrap_err();
        assert!(err.to_string().contains("STRINGS_MANIFEST not set"));
    }

    #[test]
    #[serial]
    fn test_settings_reads_all_variables() {
        clear_env();
        env::set_var("STRINGS_MANIFEST", "/etc/strings/manifest.json");
        env::set_var("STRINGS_MODE", "prod");
        env::set_var("STRINGS_LOCALE", "fr");
        env::set_var("STRINGS_PREFERENCE_DIR", "/tmp/prefs");
        env::set_var("STRINGS_FADE_MS", "50");

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.manifest_path, PathBuf::from("/etc/strings/manifest.json"));
        assert_eq!(settings.mode, Some(FallbackMode::Production));
        assert_eq!(settings.locale.as_deref(), Some("fr"));
        assert_eq!(settings.preference_dir, Some(PathBuf::from("/tmp/prefs")));
        assert_eq!(settings.fade_ms, Some(50));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_settings_rejects_unknown_mode() {
        clear_env();
        env::set_var("STRINGS_MANIFEST", "manifest.json");
        env::set_var("STRINGS_MODE", "staging");

        let err = Settings::from_env().unwrap_err();
        assert!(format!("{:#}", err).contains("unknown fallback mode"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_settings_blank_locale_is_none() {
        clear_env();
        env::set_var("STRINGS_MANIFEST", "manifest.json");
        env::set_var("STRINGS_LOCALE", "  ");

        assert_eq!(Settings::from_env().unwrap().locale, None);

        clear_env();
    }

    // ==================== Manifest Tests ====================

    #[test]
    fn test_manifest_parse_full() {
        let manifest = Manifest::parse(
            r#"{
                "default": {"code": "en", "path": "en.json"},
                "languages": {
                    "fr": {"path": "fr.json"},
                    "ar": {"url": "https://cdn.example.com/ar.json", "direction": "rtl"}
                },
                "useBrowserNegotiation": true,
                "useStoredPreference": true,
                "fadeColor": "white",
                "fadeDurationMs": 150,
                "mode": "production"
            }"#,
            "/srv/strings",
        )
        .unwrap();

        assert_eq!(manifest.default.code, "en");
        assert_eq!(manifest.default_path(), PathBuf::from("/srv/strings/en.json"));
        assert_eq!(manifest.languages["ar"].direction, Direction::Rtl);
        assert!(manifest.use_browser_negotiation);
        assert_eq!(manifest.fade_duration_ms, Some(150));
        assert_eq!(manifest.mode, Some(FallbackMode::Production));
    }

    #[test]
    fn test_manifest_parse_minimal() {
        let manifest =
            Manifest::parse(r#"{"default": {"code": "en", "path": "en.json"}}"#, "").unwrap();
        assert!(manifest.languages.is_empty());
        assert!(!manifest.use_stored_preference);
        assert_eq!(manifest.default.direction, Direction::Ltr);
    }

    #[test]
    fn test_manifest_language_needs_one_source() {
        let err = Manifest::parse(
            r#"{"default": {"code": "en", "path": "en.json"}, "languages": {"fr": {}}}"#,
            "",
        )
        .unwrap_err();
        assert!(matches!(err, I18nError::Manifest(message) if message.contains("'fr'")));
    }

    #[test]
    fn test_manifest_invalid_json() {
        let err = Manifest::parse("{", "").unwrap_err();
        assert!(matches!(err, I18nError::Manifest(_)));
    }

    #[tokio::test]
    async fn test_manifest_into_config() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(temp_dir.path().join("en.json"), r#"{"title": "Title"}"#).unwrap();
        std::fs::write(
            temp_dir.path().join("manifest.json"),
            r#"{
                "default": {"code": "en", "path": "en.json"},
                "languages": {"fr": {"path": "fr.json"}},
                "fadeDurationMs": 10
            }"#,
        )
        .unwrap();

        let manifest = Manifest::from_file(&temp_dir.path().join("manifest.json")).unwrap();
        let config = manifest.into_config(&reqwest::Client::new()).await.unwrap();

        assert_eq!(config.strings.code, "en");
        assert_eq!(config.languages.len(), 1);
        assert_eq!(config.languages[0].0, "fr");
        assert_eq!(config.fade_duration, Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_manifest_into_config_rejects_bad_schema() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(temp_dir.path().join("en.json"), r#"{"count": 3}"#).unwrap();
        let manifest = Manifest::parse(
            r#"{"default": {"code": "en", "path": "en.json"}}"#,
            temp_dir.path(),
        )
        .unwrap();

        let err = manifest.into_config(&reqwest::Client::new()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid schema at 'count'"));
    }

    #[test]
    fn test_settings_apply_overrides() {
        let strings = DefaultStrings::new("en", serde_json::json!({"a": "A"})).unwrap();
        let settings = Settings {
            manifest_path: PathBuf::from("manifest.json"),
            mode: Some(FallbackMode::Production),
            locale: None,
            preference_dir: None,
            fade_ms: Some(0),
        };

        let config = settings.apply(StringsConfig::new(strings));
        assert_eq!(config.mode, FallbackMode::Production);
        assert_eq!(config.fade_duration, Duration::ZERO);
    }
}
