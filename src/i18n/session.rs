//! Language session: the runtime state machine behind every accessor.
//!
//! A session owns the registry and publishes immutable [`SessionState`]
//! snapshots through a `tokio::sync::watch` channel. Switching languages moves
//! the session from ready to loading and back:
//!
//! ```text
//! Ready(a) --change(b)--> Loading(b) --loaded--> Ready(b)
//!                                   \--failed--> Ready(b, default content)
//! ```
//!
//! Every switch takes a fresh generation number. Only the newest generation
//! may publish, so a slow load for an earlier request can never overwrite the
//! result of a later one.

use crate::i18n::accessor::{
    build_array_accessor, build_string_accessor, ArrayAccessor, FallbackMode, StringAccessor,
};
use crate::i18n::error::I18nError;
use crate::i18n::language::Direction;
use crate::i18n::metrics::LoadMetrics;
use crate::i18n::presentation::{FadeSettings, NoopPresentation, PresentationHook};
use crate::i18n::registry::{
    normalize, resolve_initial_language, LanguageRegistry, StringsConfig,
};
use crate::i18n::schema::Schema;
use crate::locale::{LocaleSource, NoLocales};
use crate::storage::{MemoryStore, PreferenceStore, LANGUAGE_KEY};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

/// One immutable view of the session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// The language this snapshot resolves to.
    pub language: String,
    pub direction: Direction,
    /// False while loading and during the fade after a fresh load.
    pub ready: bool,
    /// A requested language that has not been resolved yet.
    pub pending: Option<String>,
    /// True when `language` failed to load and the content is the default
    /// language's.
    pub fallback: bool,
    pub strings: Arc<StringAccessor>,
    pub arrays: Arc<ArrayAccessor>,
}

impl SessionState {
    /// The language most recently asked for.
    pub fn requested(&self) -> &str {
        self.pending.as_deref().unwrap_or(&self.language)
    }

    /// Ready with nothing pending.
    pub fn is_settled(&self) -> bool {
        self.ready && self.pending.is_none()
    }
}

/// How a language switch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The requested language is now active.
    Applied,
    /// The load failed; default content is shown under the requested code.
    FellBack,
    /// A newer request won; this result was discarded.
    Superseded,
    /// The language was already active or pending.
    Unchanged,
    /// The session is locked to a single language.
    Locked,
}

enum Begin {
    Started(u64),
    Done(SwitchOutcome),
}

struct Shared {
    schema: Schema,
    registry: LanguageRegistry,
    mode: FallbackMode,
    fade: FadeSettings,
    locked: Option<String>,
    use_stored_preference: bool,
    store: Arc<dyn PreferenceStore>,
    presentation: Arc<dyn PresentationHook>,
    generation: AtomicU64,
    /// Generation of the newest request written to the store.
    persisted: Mutex<u64>,
    metrics: LoadMetrics,
    state: watch::Sender<Arc<SessionState>>,
}

impl Shared {
    fn snapshot(
        &self,
        language: &str,
        direction: Direction,
        data: &Value,
        fallback: bool,
        ready: bool,
    ) -> Result<SessionState, I18nError> {
        let schema = self.schema.value();
        Ok(SessionState {
            language: language.to_string(),
            direction,
            ready,
            pending: None,
            fallback,
            strings: Arc::new(build_string_accessor(schema, Some(data), "", self.mode)?),
            arrays: Arc::new(build_array_accessor(schema, Some(data), "", self.mode)?),
        })
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Validate a request and mark the session as loading.
    fn begin_switch(&self, code: &str) -> Result<Begin, I18nError> {
        if let Some(locked) = &self.locked {
            debug!("Language is locked to '{}', ignoring request for '{}'", locked, code);
            return Ok(Begin::Done(SwitchOutcome::Locked));
        }
        if !self.registry.contains(code) {
            error!("Language '{}' is not registered", code);
            return Err(I18nError::MissingLanguage(code.to_string()));
        }

        let mut started = None;
        self.state.send_if_modified(|state| {
            // A settled fallback may be retried under the same code.
            let retry = state.fallback && state.pending.is_none();
            if state.requested() == code && !retry {
                return false;
            }
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            started = Some(generation);
            *state = Arc::new(SessionState {
                ready: false,
                pending: Some(code.to_string()),
                ..SessionState::clone(state)
            });
            true
        });

        let Some(generation) = started else {
            debug!("Language '{}' is already active or pending", code);
            return Ok(Begin::Done(SwitchOutcome::Unchanged));
        };

        Ok(Begin::Started(generation))
    }

    /// Store `code` unless a newer request has already been stored.
    async fn persist(&self, code: &str, generation: u64) {
        if !self.use_stored_preference {
            return;
        }
        let mut persisted = self.persisted.lock().await;
        if *persisted >= generation {
            return;
        }
        match self.store.set(LANGUAGE_KEY, code).await {
            Ok(()) => *persisted = generation,
            Err(e) => warn!("{}, language choice will not persist", e),
        }
    }

    /// Resolve `code` and publish it if `generation` is still the newest.
    async fn finish_switch(&self, code: &str, generation: u64) -> Result<SwitchOutcome, I18nError> {
        let entry = self
            .registry
            .get(code)
            .ok_or_else(|| I18nError::MissingLanguage(code.to_string()))?;

        let (data, direction, fallback, fresh) = match entry.cached() {
            Some(data) => {
                self.metrics.record_cache_hit();
                (data, entry.direction(), false, false)
            }
            None => {
                self.metrics.record_cache_miss();
                match entry.load(&self.metrics).await {
                    Ok(data) => (data, entry.direction(), false, true),
                    Err(e) => {
                        error!("{}, showing default language content", e);
                        let default = self.registry.default_entry();
                        let data = default.cached().unwrap_or_else(|| self.schema.dataset());
                        (data, default.direction(), true, false)
                    }
                }
            }
        };

        let snapshot = Arc::new(self.snapshot(code, direction, &data, fallback, !fresh)?);
        let published = self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            *state = snapshot;
            true
        });

        if !published {
            self.metrics.record_superseded();
            debug!("Discarding superseded load of '{}'", code);
            return Ok(SwitchOutcome::Superseded);
        }

        self.presentation.apply(code, direction);

        if fresh {
            tokio::time::sleep(self.fade.duration).await;
            let settled = self.state.send_if_modified(|state| {
                if !self.is_current(generation) {
                    return false;
                }
                *state = Arc::new(SessionState {
                    ready: true,
                    ..SessionState::clone(state)
                });
                true
            });
            if !settled {
                self.metrics.record_superseded();
                debug!("Language '{}' was superseded during the fade", code);
                return Ok(SwitchOutcome::Superseded);
            }
        }

        if fallback {
            Ok(SwitchOutcome::FellBack)
        } else {
            info!("Switched language to '{}'", code);
            Ok(SwitchOutcome::Applied)
        }
    }
}

/// Configures and starts a [`LanguageSession`].
pub struct SessionBuilder {
    config: StringsConfig,
    locked: Option<String>,
    store: Arc<dyn PreferenceStore>,
    locales: Arc<dyn LocaleSource>,
    presentation: Arc<dyn PresentationHook>,
}

impl SessionBuilder {
    pub fn new(config: StringsConfig) -> Self {
        Self {
            config,
            locked: None,
            store: Arc::new(MemoryStore::new()),
            locales: Arc::new(NoLocales),
            presentation: Arc::new(NoopPresentation),
        }
    }

    /// Lock the session to `code`. Switch requests are then ignored and
    /// nothing is persisted.
    pub fn lock_language(mut self, code: impl Into<String>) -> Self {
        self.locked = Some(code.into());
        self
    }

    pub fn store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.store = store;
        self
    }

    pub fn locales(mut self, locales: Arc<dyn LocaleSource>) -> Self {
        self.locales = locales;
        self
    }

    pub fn presentation(mut self, presentation: Arc<dyn PresentationHook>) -> Self {
        self.presentation = presentation;
        self
    }

    /// Resolve the initial language and start the session.
    ///
    /// If the initial language still needs loading, the session starts in
    /// the loading state with default content and the load runs in the
    /// background. Use [`LanguageSession::settled`] to wait for it.
    ///
    /// # Errors
    /// `MissingLanguage` when the locked language is not registered.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime, since a pending initial load
    /// is spawned onto it.
    pub async fn start(self) -> Result<LanguageSession, I18nError> {
        let config = self.config;
        let registry = normalize(&config);
        let default_code = config.strings.code.clone();

        if let Some(locked) = &self.locked {
            if !registry.contains(locked) {
                error!("Locked language '{}' is not registered", locked);
                return Err(I18nError::MissingLanguage(locked.clone()));
            }
        }

        let initial = resolve_initial_language(
            &registry,
            &default_code,
            self.locked.as_deref(),
            config.use_stored_preference,
            config.use_browser_negotiation,
            self.store.as_ref(),
            self.locales.as_ref(),
        )
        .await;

        let default = registry.default_entry();
        let default_data = default.cached().unwrap_or_else(|| config.strings.schema.dataset());
        let default_direction = default.direction();
        let initial_data = registry.get(&initial).and_then(|entry| entry.cached());
        let initial_direction = registry
            .get(&initial)
            .map(|entry| entry.direction())
            .unwrap_or(default_direction);

        let (placeholder, _) = watch::channel(Arc::new(SessionState {
            language: default_code.clone(),
            direction: default_direction,
            ready: false,
            pending: None,
            fallback: false,
            strings: Arc::default(),
            arrays: Arc::default(),
        }));

        let shared = Arc::new(Shared {
            schema: config.strings.schema.clone(),
            registry,
            mode: config.mode,
            fade: FadeSettings {
                color: config.fade_color.clone(),
                duration: config.fade_duration,
            },
            locked: self.locked,
            use_stored_preference: config.use_stored_preference,
            store: self.store,
            presentation: self.presentation,
            generation: AtomicU64::new(0),
            persisted: Mutex::new(0),
            metrics: LoadMetrics::new(),
            state: placeholder,
        });

        match initial_data {
            Some(data) => {
                let state = shared.snapshot(&initial, initial_direction, &data, false, true)?;
                shared.state.send_replace(Arc::new(state));
                shared.presentation.apply(&initial, initial_direction);
                info!("Language session started in '{}'", initial);
            }
            None => {
                let mut state =
                    shared.snapshot(&default_code, default_direction, &default_data, false, false)?;
                state.pending = Some(initial.clone());
                shared.state.send_replace(Arc::new(state));
                let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

                info!("Language session starting, loading '{}'", initial);
                let background = Arc::clone(&shared);
                tokio::spawn(async move {
                    if let Err(e) = background.finish_switch(&initial, generation).await {
                        error!("Initial language load failed: {}", e);
                    }
                });
            }
        }

        Ok(LanguageSession { shared })
    }
}

/// A running language session. Cloning shares the same state.
#[derive(Clone)]
pub struct LanguageSession {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LanguageSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("LanguageSession")
            .field("language", &state.language)
            .field("ready", &state.ready)
            .field("pending", &state.pending)
            .field("locked", &self.shared.locked)
            .finish()
    }
}

impl LanguageSession {
    /// Switch to `code` and wait until the switch resolves.
    ///
    /// # Errors
    /// `MissingLanguage` when `code` is not registered; the state is left
    /// unchanged.
    pub async fn change_language(&self, code: &str) -> Result<SwitchOutcome, I18nError> {
        match self.shared.begin_switch(code)? {
            Begin::Done(outcome) => Ok(outcome),
            Begin::Started(generation) => {
                self.shared.persist(code, generation).await;
                self.shared.finish_switch(code, generation).await
            }
        }
    }

    /// Start a switch to `code` in the background.
    ///
    /// Unknown codes are logged and ignored.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn request_language_change(&self, code: &str) {
        let Ok(Begin::Started(generation)) = self.shared.begin_switch(code) else {
            return;
        };

        let shared = Arc::clone(&self.shared);
        let code = code.to_string();
        tokio::spawn(async move {
            shared.persist(&code, generation).await;
            if let Err(e) = shared.finish_switch(&code, generation).await {
                error!("Language switch to '{}' failed: {}", code, e);
            }
        });
    }

    /// Wait for the first snapshot that is ready with nothing pending.
    pub async fn settled(&self) -> Arc<SessionState> {
        let mut receiver = self.shared.state.subscribe();
        let state = match receiver.wait_for(|state| state.is_settled()).await {
            Ok(state) => Arc::clone(&state),
            Err(_) => self.state(),
        };
        state
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionState>> {
        self.shared.state.subscribe()
    }

    /// The current snapshot.
    pub fn state(&self) -> Arc<SessionState> {
        Arc::clone(&self.shared.state.borrow())
    }

    /// The resolved language (not a pending one).
    pub fn current_language(&self) -> String {
        self.state().language.clone()
    }

    /// The most recently requested language.
    pub fn requested_language(&self) -> String {
        self.state().requested().to_string()
    }

    pub fn direction(&self) -> Direction {
        self.state().direction
    }

    pub fn is_ready(&self) -> bool {
        self.state().ready
    }

    pub fn strings(&self) -> Arc<StringAccessor> {
        Arc::clone(&self.state().strings)
    }

    pub fn arrays(&self) -> Arc<ArrayAccessor> {
        Arc::clone(&self.state().arrays)
    }

    pub fn fade(&self) -> &FadeSettings {
        &self.shared.fade
    }

    pub fn is_locked(&self) -> bool {
        self.shared.locked.is_some()
    }

    /// The default-language strings every accessor is shaped by.
    pub fn schema(&self) -> &Schema {
        &self.shared.schema
    }

    pub fn default_language(&self) -> &str {
        self.shared.registry.default_code()
    }

    /// Registered language codes, sorted.
    pub fn available_languages(&self) -> Vec<&str> {
        self.shared.registry.codes()
    }

    pub fn metrics(&self) -> &LoadMetrics {
        &self.shared.metrics
    }
}
