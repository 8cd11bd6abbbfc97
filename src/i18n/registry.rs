//! Language registry: every configured language, normalized to one shape.
//!
//! Configuration can provide the default language inline and any number of
//! other languages as inline data or lazy loaders. [`normalize`] turns that
//! into a [`LanguageRegistry`]; nothing downstream ever looks at the
//! configuration's shape again.

use crate::i18n::accessor::FallbackMode;
use crate::i18n::error::I18nError;
use crate::i18n::language::{negotiate_language, Direction};
use crate::i18n::loader::{unwrap_module_default, DatasetLoader};
use crate::i18n::metrics::LoadMetrics;
use crate::i18n::schema::Schema;
use crate::locale::LocaleSource;
use crate::storage::{PreferenceStore, LANGUAGE_KEY};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Default fade overlay color.
pub const DEFAULT_FADE_COLOR: &str = "black";

/// Default fade duration before a freshly loaded language is marked ready.
pub const DEFAULT_FADE_DURATION: Duration = Duration::from_millis(200);

/// The default language: its code, its strings (the schema) and direction.
#[derive(Debug, Clone)]
pub struct DefaultStrings {
    pub code: String,
    pub schema: Schema,
    pub direction: Direction,
}

impl DefaultStrings {
    /// Validate `data` as the schema for `code`.
    pub fn new(code: impl Into<String>, data: Value) -> Result<Self, I18nError> {
        Ok(Self {
            code: code.into(),
            schema: Schema::new(data)?,
            direction: Direction::Ltr,
        })
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Where a non-default language's dataset comes from.
#[derive(Clone)]
pub enum DatasetSource {
    Inline(Value),
    Loader(Arc<dyn DatasetLoader>),
}

impl fmt::Debug for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Inline(_) => f.write_str("Inline(..)"),
            DatasetSource::Loader(_) => f.write_str("Loader(..)"),
        }
    }
}

/// Configuration for one non-default language.
#[derive(Debug, Clone)]
pub struct LanguageInfo {
    pub source: DatasetSource,
    pub direction: Direction,
}

impl LanguageInfo {
    pub fn inline(data: Value) -> Self {
        Self {
            source: DatasetSource::Inline(data),
            direction: Direction::Ltr,
        }
    }

    pub fn loader(loader: impl DatasetLoader + 'static) -> Self {
        Self {
            source: DatasetSource::Loader(Arc::new(loader)),
            direction: Direction::Ltr,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Everything needed to start a language session.
#[derive(Debug, Clone)]
pub struct StringsConfig {
    pub strings: DefaultStrings,
    /// Other languages, in configuration order.
    pub languages: Vec<(String, LanguageInfo)>,
    pub use_browser_negotiation: bool,
    pub use_stored_preference: bool,
    pub fade_color: String,
    pub fade_duration: Duration,
    pub mode: FallbackMode,
}

impl StringsConfig {
    pub fn new(strings: DefaultStrings) -> Self {
        Self {
            strings,
            languages: Vec::new(),
            use_browser_negotiation: false,
            use_stored_preference: false,
            fade_color: DEFAULT_FADE_COLOR.to_string(),
            fade_duration: DEFAULT_FADE_DURATION,
            mode: FallbackMode::default(),
        }
    }

    pub fn language(mut self, code: impl Into<String>, info: LanguageInfo) -> Self {
        self.languages.push((code.into(), info));
        self
    }

    pub fn browser_negotiation(mut self, enabled: bool) -> Self {
        self.use_browser_negotiation = enabled;
        self
    }

    pub fn stored_preference(mut self, enabled: bool) -> Self {
        self.use_stored_preference = enabled;
        self
    }

    pub fn fade(mut self, color: impl Into<String>, duration: Duration) -> Self {
        self.fade_color = color.into();
        self.fade_duration = duration;
        self
    }

    pub fn mode(mut self, mode: FallbackMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Normalized metadata for one language.
///
/// The dataset cell is written at most once: inline data fills it at
/// construction, a loader fills it on its first successful load.
pub struct LanguageEntry {
    code: String,
    direction: Direction,
    data: OnceCell<Arc<Value>>,
    loader: Option<Arc<dyn DatasetLoader>>,
}

impl fmt::Debug for LanguageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageEntry")
            .field("code", &self.code)
            .field("direction", &self.direction)
            .field("loaded", &self.is_loaded())
            .field("has_loader", &self.has_loader())
            .finish()
    }
}

impl LanguageEntry {
    fn with_data(code: &str, data: Arc<Value>, direction: Direction) -> Self {
        Self {
            code: code.to_string(),
            direction,
            data: OnceCell::new_with(Some(data)),
            loader: None,
        }
    }

    fn with_loader(code: &str, loader: Arc<dyn DatasetLoader>, direction: Direction) -> Self {
        Self {
            code: code.to_string(),
            direction,
            data: OnceCell::new(),
            loader: Some(loader),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The dataset, if it is already available.
    pub fn cached(&self) -> Option<Arc<Value>> {
        self.data.get().cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.data.initialized()
    }

    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    /// Return the dataset, invoking the loader if nothing is cached yet.
    ///
    /// Concurrent callers share one loader invocation. A failed load leaves
    /// the entry unloaded so a later request can try again.
    pub async fn load(&self, metrics: &LoadMetrics) -> Result<Arc<Value>, I18nError> {
        let data = self
            .data
            .get_or_try_init(|| async {
                let Some(loader) = self.loader.as_ref() else {
                    return Err(I18nError::LoadFailure {
                        code: self.code.clone(),
                        message: "no dataset and no loader configured".to_string(),
                    });
                };

                metrics.record_loader_call();
                match loader.load().await {
                    Ok(value) => Ok(Arc::new(unwrap_module_default(value))),
                    Err(e) => {
                        metrics.record_loader_failure();
                        Err(I18nError::LoadFailure {
                            code: self.code.clone(),
                            message: format!("{:#}", e),
                        })
                    }
                }
            })
            .await?;
        Ok(Arc::clone(data))
    }
}

/// All configured languages keyed by code.
#[derive(Debug)]
pub struct LanguageRegistry {
    default_code: String,
    entries: BTreeMap<String, LanguageEntry>,
}

impl LanguageRegistry {
    /// Get a language entry by its code.
    ///
    /// # Returns
    /// * `Some(&LanguageEntry)` if the language exists
    /// * `None` if the language is not found
    pub fn get(&self, code: &str) -> Option<&LanguageEntry> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// All language codes, sorted.
    pub fn codes(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn default_code(&self) -> &str {
        &self.default_code
    }

    /// The default language entry, which always has data.
    pub fn default_entry(&self) -> &LanguageEntry {
        self.entries
            .get(&self.default_code)
            .expect("normalize always registers the default language")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the registry from configuration.
///
/// The default language is registered with the schema as its data. A
/// configured language with the same code as the default is discarded.
pub fn normalize(config: &StringsConfig) -> LanguageRegistry {
    let default = &config.strings;
    let mut entries = BTreeMap::new();
    entries.insert(
        default.code.clone(),
        LanguageEntry::with_data(&default.code, default.schema.dataset(), default.direction),
    );

    for (code, info) in &config.languages {
        if entries.contains_key(code) {
            debug!("Language '{}' is already registered, ignoring duplicate", code);
            continue;
        }
        let entry = match &info.source {
            DatasetSource::Inline(data) => {
                LanguageEntry::with_data(code, Arc::new(data.clone()), info.direction)
            }
            DatasetSource::Loader(loader) => {
                LanguageEntry::with_loader(code, Arc::clone(loader), info.direction)
            }
        };
        entries.insert(code.clone(), entry);
    }

    LanguageRegistry {
        default_code: default.code.clone(),
        entries,
    }
}

/// Choose the language a session starts in.
///
/// Selection order: a locked language, then a valid stored preference, then
/// negotiation against the host's preferences, then `default_code`. Unless
/// locked, the choice is persisted when stored preferences are enabled. Any
/// storage failure is logged and yields `default_code`.
pub async fn resolve_initial_language(
    registry: &LanguageRegistry,
    default_code: &str,
    locked: Option<&str>,
    use_stored_preference: bool,
    use_browser_negotiation: bool,
    store: &dyn PreferenceStore,
    locales: &dyn LocaleSource,
) -> String {
    if let Some(code) = locked {
        return code.to_string();
    }

    let negotiate = || {
        if use_browser_negotiation {
            let preferences = locales.preferred_languages();
            negotiate_language(&registry.codes(), preferences.as_deref(), default_code)
        } else {
            default_code.to_string()
        }
    };

    if !use_stored_preference {
        return negotiate();
    }

    match store.get(LANGUAGE_KEY).await {
        Ok(Some(saved)) if registry.contains(&saved) => saved,
        Ok(_) => {
            let chosen = negotiate();
            match store.set(LANGUAGE_KEY, &chosen).await {
                Ok(()) => chosen,
                Err(e) => {
                    warn!("{}, using default language: {}", e, default_code);
                    default_code.to_string()
                }
            }
        }
        Err(e) => {
            warn!("{}, using default language: {}", e, default_code);
            default_code.to_string()
        }
    }
}
