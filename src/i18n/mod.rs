//! Runtime localization: templates, accessors, the language registry and
//! the language session.
//!
//! # Architecture
//!
//! - `template` / `markup`: leaf strings with `{{ var }}` interpolation and
//!   `{tag{...}}` inline markup
//! - `schema` / `accessor`: the default-language strings define the shape of
//!   every accessor tree; other datasets are read through that shape
//! - `registry`: every configured language normalized to one entry type, with
//!   write-once dataset caching
//! - `session`: the state machine that switches languages and publishes
//!   immutable snapshots
//! - `validator` / `metrics`: translation checks and load statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use localized_strings::i18n::{DefaultStrings, SessionBuilder, StringsConfig};
//!
//! let strings = DefaultStrings::new("en", serde_json::json!({"greet": "Hi {{name}}"}))?;
//! let session = SessionBuilder::new(StringsConfig::new(strings)).start().await?;
//! let vars = serde_json::json!({"name": "Ana"});
//! assert_eq!(session.strings().text("greet", vars.as_object()), "Hi Ana");
//! ```

mod accessor;
mod error;
mod language;
mod loader;
mod markup;
mod metrics;
mod presentation;
mod registry;
mod schema;
mod session;
mod template;
mod validator;

pub use accessor::{
    build_array_accessor, build_string_accessor, ArrayAccessor, ArrayNode, FallbackMode, Leaf,
    StringAccessor, StringNode,
};
pub use error::I18nError;
pub use language::{base_tag, negotiate_language, Direction};
pub use loader::{unwrap_module_default, DatasetLoader, HttpLoader, JsonFileLoader, LoadFuture};
pub use markup::{parse_tags, Node, Rendered, Tag, MAX_TAG_DEPTH};
pub use metrics::{LoadMetrics, MetricsReport};
pub use presentation::{FadeSettings, NoopPresentation, PresentationHook, RecordingPresentation};
pub use registry::{
    normalize, resolve_initial_language, DatasetSource, DefaultStrings, LanguageEntry,
    LanguageInfo, LanguageRegistry, StringsConfig, DEFAULT_FADE_COLOR, DEFAULT_FADE_DURATION,
};
pub use schema::Schema;
pub use session::{LanguageSession, SessionBuilder, SessionState, SwitchOutcome};
pub use template::{interpolate, placeholders, stringify, Template, Vars};
pub use validator::{TranslationValidator, ValidationReport};
