//! Localized strings with lazy language loading.
//!
//! The [`i18n`] module holds the runtime. [`storage`] and [`locale`] are the
//! host ports a session reads preferences from, and [`config`] builds a
//! session configuration from a JSON manifest.

pub mod config;
pub mod i18n;
pub mod locale;
pub mod retry;
pub mod storage;
